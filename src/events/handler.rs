//! Consumer side of the event bus.

use std::fmt;

use async_trait::async_trait;

use crate::domain::DomainEvent;
use crate::hub::HubError;

/// Failure while handling a domain event. Logged by the dispatcher, never
/// surfaced to the publisher.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The hub refused the resulting delivery request.
    #[error("hub rejected delivery: {0}")]
    Hub(#[from] HubError),
}

/// Consumes the domain events routed to it by name.
#[async_trait]
pub trait EventHandler: Send + Sync + fmt::Debug {
    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] if the event could not be handled; the
    /// dispatcher logs it and drops the event.
    async fn handle(&self, event: DomainEvent) -> Result<(), HandlerError>;
}
