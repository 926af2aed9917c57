//! Frames queued for a single WebSocket writer.

/// Close code sent to a connection displaced by a newer one.
pub const CLOSE_REPLACED: u16 = 4000;

/// Close reason sent to a connection displaced by a newer one.
pub const CLOSE_REPLACED_REASON: &str = "replaced by a newer connection";

/// An item on a connection's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A serialized donation notice, sent as a text frame.
    Notice(String),
    /// Close the socket with the given code and reason.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Human-readable close reason.
        reason: &'static str,
    },
}

impl Outbound {
    /// The close frame sent to a displaced connection.
    #[must_use]
    pub const fn replaced() -> Self {
        Self::Close {
            code: CLOSE_REPLACED,
            reason: CLOSE_REPLACED_REASON,
        }
    }
}
