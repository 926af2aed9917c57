//! Connection hub: which connection currently represents which recipient,
//! and the only writer of outbound donation notices.

pub mod connection;
pub mod control_loop;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use connection::{Connection, TransportError};
pub use control_loop::{Hub, HubConfig, HubError, HubLoop};
pub use registry::ConnectionRegistry;
