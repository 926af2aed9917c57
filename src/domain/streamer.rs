//! Streamers: notification recipients identified on the streaming platform.

use rand::Rng;
use serde::Serialize;

use super::RecipientId;

/// Alphabet used for connection secret codes.
const SECRET_CODE_CHARSET: &[u8] = b"abcdedfghijklmnopqrstABCDEFGHIJKLMNOP";

/// Length of a generated connection secret code.
pub const SECRET_CODE_LEN: usize = 16;

/// A registered streamer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Streamer {
    /// Recipient identity used by the hub.
    pub id: RecipientId,
    /// Streaming-platform user ID.
    pub twitch_id: String,
    /// Streaming-platform login name.
    pub twitch_name: String,
    /// Secret presented by the streamer's overlay when it connects.
    #[serde(skip_serializing)]
    pub secret_code: String,
}

/// Insert shape for a new streamer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStreamer {
    /// Streaming-platform user ID.
    pub twitch_id: String,
    /// Streaming-platform login name.
    pub twitch_name: String,
    /// Connection secret code.
    pub secret_code: String,
}

/// Query filter for streamers. Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamerFilter {
    /// Match on platform user ID.
    pub twitch_id: Option<String>,
    /// Match on platform login name.
    pub twitch_name: Option<String>,
    /// Match on connection secret code.
    pub secret_code: Option<String>,
}

impl StreamerFilter {
    /// Filter selecting streamers by platform user ID.
    #[must_use]
    pub fn by_twitch_id(twitch_id: impl Into<String>) -> Self {
        Self {
            twitch_id: Some(twitch_id.into()),
            ..Self::default()
        }
    }

    /// Filter selecting streamers by platform login name.
    #[must_use]
    pub fn by_twitch_name(twitch_name: impl Into<String>) -> Self {
        Self {
            twitch_name: Some(twitch_name.into()),
            ..Self::default()
        }
    }

    /// Filter selecting streamers by connection secret code.
    #[must_use]
    pub fn by_secret_code(secret_code: impl Into<String>) -> Self {
        Self {
            secret_code: Some(secret_code.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if `streamer` satisfies every set field.
    #[must_use]
    pub fn matches(&self, streamer: &Streamer) -> bool {
        self.twitch_id
            .as_deref()
            .is_none_or(|v| v == streamer.twitch_id)
            && self
                .twitch_name
                .as_deref()
                .is_none_or(|v| v == streamer.twitch_name)
            && self
                .secret_code
                .as_deref()
                .is_none_or(|v| v == streamer.secret_code)
    }
}

/// Generates a fresh connection secret code.
#[must_use]
pub fn generate_secret_code() -> String {
    let mut rng = rand::rng();
    (0..SECRET_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SECRET_CODE_CHARSET.len());
            char::from(SECRET_CODE_CHARSET.get(idx).copied().unwrap_or(b'a'))
        })
        .collect()
}
