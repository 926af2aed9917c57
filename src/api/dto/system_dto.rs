//! System DTOs.

use serde::Serialize;
use utoipa::ToSchema;

/// Response body for `GET /health`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always `"healthy"` while the server answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Server time, RFC 3339.
    pub timestamp: String,
    /// Recipients with a live connection.
    pub connected_recipients: usize,
    /// Events dropped because the event queue was full.
    pub dropped_events: u64,
}
