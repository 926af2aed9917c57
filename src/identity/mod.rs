//! Streaming-platform identity collaborator.
//!
//! Streamers sign in with the platform's OAuth authorization-code flow; the
//! service only needs the resulting user ID and login name.

pub mod twitch;

use std::fmt;

use async_trait::async_trait;

use crate::error::AppError;

pub use twitch::TwitchClient;

/// A user identity confirmed by the streaming platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformIdentity {
    /// Platform user ID.
    pub user_id: String,
    /// Platform login name.
    pub login: String,
}

/// Resolves OAuth authorization codes to platform identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Exchanges `code` for a token and resolves the user behind it.
    ///
    /// Returns `Ok(None)` when the platform rejects the code or the token.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UpstreamError`] if the platform is unreachable.
    async fn resolve(&self, code: &str) -> Result<Option<PlatformIdentity>, AppError>;
}
