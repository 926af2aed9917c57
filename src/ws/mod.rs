//! WebSocket layer: the transport behind the connection hub.
//!
//! A streamer's overlay connects to `/ws/{secret_code}` and receives one
//! JSON text frame per confirmed donation. Only one connection per
//! streamer is live at a time; a newer one closes the older with code
//! `4000`.

pub mod connection;
pub mod handler;
pub mod messages;

pub use connection::{WsConnection, run_connection};
pub use messages::Outbound;
