pub mod help;
pub mod session_detail;
pub mod session_list;
pub mod tab_bar;
pub mod usage;
