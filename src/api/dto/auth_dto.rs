//! Streamer sign-in DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{RecipientId, Streamer};

/// Request body for `POST /auth/twitch`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AuthRequest {
    /// OAuth authorization code.
    pub code: String,
    /// OAuth state echoed by the platform.
    #[serde(default)]
    pub state: String,
}

/// Response body for `POST /auth/twitch` (202 Accepted).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Recipient ID of the streamer.
    #[schema(value_type = i64)]
    pub streamer_id: RecipientId,
    /// Platform login name.
    pub twitch_name: String,
    /// Secret the streamer's overlay connects with.
    pub secret_code: String,
}

impl From<Streamer> for AuthResponse {
    fn from(streamer: Streamer) -> Self {
        Self {
            streamer_id: streamer.id,
            twitch_name: streamer.twitch_name,
            secret_code: streamer.secret_code,
        }
    }
}
