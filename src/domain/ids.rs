//! Type-safe identifiers for recipients and live connections.
//!
//! [`RecipientId`] wraps the numeric streamer primary key so it cannot be
//! confused with donation IDs or amounts. [`ConnectionId`] is a UUID v4
//! minted once per accepted WebSocket and used by the hub to tell a stale
//! close apart from the connection currently registered for a recipient.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a notification recipient (a streamer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(i64);

impl RecipientId {
    /// Wraps a raw streamer primary key.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecipientId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<RecipientId> for i64 {
    fn from(id: RecipientId) -> Self {
        id.0
    }
}

/// Unique identifier for a single live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
