//! Domain DTOs for the persons API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! The client and store only ever see these shapes; integration tests catch
//! any schema drift between the two crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single person record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Person {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating or replacing a person. Server-owned fields
/// (`id`, `created_at`) are never sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonInput {
    pub first_name: String,
    pub last_name: String,
}

/// Envelope for the greeting and weather endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}
