//! Event system: the name-routed event bus and its handlers.
//!
//! Producers (the payment webhook) publish [`crate::domain::DomainEvent`]s
//! on the [`EventBus`] without knowing who consumes them; the
//! [`EventDispatcher`] routes each one by name to exactly one
//! [`EventHandler`].

pub mod donation_payed;
pub mod event_bus;
pub mod handler;

pub use donation_payed::DonationPayedHandler;
pub use event_bus::{DEFAULT_BUS_CAPACITY, Envelope, EventBus, EventBusError, EventDispatcher};
pub use handler::{EventHandler, HandlerError};
