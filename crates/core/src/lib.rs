pub mod classify;
pub mod filter;
pub mod layout;
pub mod message;
pub mod summary;
pub mod timeline;
pub mod turns;

pub use message::*;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
