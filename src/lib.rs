//! # donation-alarm
//!
//! Real-time donation notifications for streamers.
//!
//! A donor starts a payment through the REST API; when the payment
//! processor confirms it through a signed webhook, the donation is marked
//! paid and announced on the streamer's overlay over a WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! Donor (HTTP)      Payment processor (webhook)      Overlay (WebSocket)
//!     │                       │                             │
//!     ├── REST Handlers (api/)┤                             ├── WS Handler (ws/)
//!     │                       │                             │
//!     ├── Stores (persistence/)                             │
//!     │                       │                             │
//!     │                       ├── EventBus (events/) ──┐    │
//!     │                       │                        │    │
//!     │                       │   DonationPayedHandler ┘    │
//!     │                       │          │                  │
//!     │                       │          └── Hub (hub/) ────┘
//!     │
//!     └── Payment processor / streaming platform clients (payments/, identity/)
//! ```
//!
//! The hub loop is the only owner of the recipient → connection map and the
//! only writer of donation notices; everything else talks to it through
//! bounded queues.

pub mod api;
pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod events;
pub mod hub;
pub mod identity;
pub mod payments;
pub mod persistence;
pub mod ws;

#[cfg(test)]
pub(crate) mod testing;
