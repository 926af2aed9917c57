//! Recipient → connection map owned by the hub's control loop.
//!
//! [`ConnectionRegistry`] is a plain single-owner structure: no locks, no
//! interior mutability. Only [`super::HubLoop`] holds one, so every mutation
//! is serialized by the loop itself.

use std::collections::HashMap;
use std::sync::Arc;

use super::Connection;
use crate::domain::{ConnectionId, RecipientId};

/// Live mapping between recipients and their current connection.
///
/// Keeps a reverse index from connection to recipient so a transport-level
/// close, which only knows its own connection, can be resolved without a
/// scan.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    by_recipient: HashMap<RecipientId, Arc<dyn Connection>>,
    by_connection: HashMap<ConnectionId, RecipientId>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `recipient_id` to `connection`, returning the connection it
    /// displaced, if any.
    ///
    /// If the same connection is registered again for a different recipient,
    /// its old mapping is dropped first; a connection never serves two
    /// recipients.
    pub fn insert(
        &mut self,
        recipient_id: RecipientId,
        connection: Arc<dyn Connection>,
    ) -> Option<Arc<dyn Connection>> {
        let connection_id = connection.id();
        if let Some(previous_owner) = self.by_connection.insert(connection_id, recipient_id)
            && previous_owner != recipient_id
        {
            self.by_recipient.remove(&previous_owner);
        }

        let displaced = self.by_recipient.insert(recipient_id, connection)?;
        let displaced_id = displaced.id();
        if displaced_id == connection_id {
            return None;
        }
        self.by_connection.remove(&displaced_id);
        Some(displaced)
    }

    /// Returns the connection currently registered for `recipient_id`.
    #[must_use]
    pub fn get(&self, recipient_id: RecipientId) -> Option<&Arc<dyn Connection>> {
        self.by_recipient.get(&recipient_id)
    }

    /// Returns the recipient `connection_id` is registered for.
    #[must_use]
    pub fn recipient_of(&self, connection_id: ConnectionId) -> Option<RecipientId> {
        self.by_connection.get(&connection_id).copied()
    }

    /// Removes the registration held by `connection_id`.
    ///
    /// Returns the recipient that was unmapped, or `None` if the connection
    /// was not (or no longer) registered.
    pub fn remove_connection(&mut self, connection_id: ConnectionId) -> Option<RecipientId> {
        let recipient_id = self.by_connection.remove(&connection_id)?;
        self.by_recipient.remove(&recipient_id);
        Some(recipient_id)
    }

    /// Returns the number of registered recipients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_recipient.len()
    }

    /// Returns `true` if no recipient is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_recipient.is_empty()
    }
}
