//! Typed HTTP client for the loupe session server.

mod client;

pub use client::{ApiClient, ClientError};
