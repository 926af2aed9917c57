//! The hub's view of a live recipient connection.

use std::fmt;

use crate::domain::{ConnectionId, DonationNotice};

/// Failure writing to a connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone; the connection will never accept another message.
    #[error("connection closed")]
    Closed,

    /// The connection's outbound queue is full.
    #[error("connection outbound queue is full")]
    Backpressure,

    /// The message could not be encoded for the wire.
    #[error("failed to encode outbound message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A caller-owned bidirectional channel to one recipient.
///
/// The hub only ever sends notices and asks displaced connections to close.
/// Both operations must return promptly: they run on the hub's control
/// loop, so an implementation that blocks stalls every recipient.
pub trait Connection: Send + Sync + fmt::Debug {
    /// Returns the identity of this connection.
    fn id(&self) -> ConnectionId;

    /// Queues `notice` for delivery.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the notice cannot be queued.
    fn send(&self, notice: &DonationNotice) -> Result<(), TransportError>;

    /// Asks the transport to close this connection because a newer one
    /// replaced it.
    fn close(&self);
}
