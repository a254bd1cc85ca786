//! Error types for the API client.
//!
//! # Design
//! One enum covers the whole failure surface: transport failures, non-2xx
//! statuses, and JSON conversion in either direction. No variant carries
//! meaning a caller is expected to branch on; the store keeps only the
//! `Display` string, which is also what a view shows.

use std::fmt;

/// Errors returned by `ApiClient` operations.
#[derive(Debug)]
pub enum ApiError {
    /// The request never produced a status: connection, DNS, or IO failure.
    Transport(String),

    /// The server answered with a non-2xx status.
    Http { status: u16, body: String },

    /// The request payload could not be serialized to JSON.
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    Deserialization(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "network error: {msg}"),
            ApiError::Http { status, body } => {
                write!(f, "HTTP {status}: {body}")
            }
            ApiError::Serialization(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::Deserialization(msg) => {
                write!(f, "deserialization failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}
