//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::events::EventBus;
use crate::hub::Hub;
use crate::identity::IdentityProvider;
use crate::payments::PaymentProvider;
use crate::persistence::{DonationStore, StreamerStore};

/// Webhook verification settings.
#[derive(Debug, Clone)]
pub struct WebhookSettings {
    /// Endpoint signing secret.
    pub secret: String,
    /// Maximum age of a signed delivery.
    pub tolerance: Duration,
}

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Donation records.
    pub donations: Arc<dyn DonationStore>,
    /// Streamer records.
    pub streamers: Arc<dyn StreamerStore>,
    /// Payment-intent creation.
    pub payments: Arc<dyn PaymentProvider>,
    /// Streaming-platform sign-in.
    pub identity: Arc<dyn IdentityProvider>,
    /// Connection hub handle.
    pub hub: Hub,
    /// Publishing side of the event bus.
    pub event_bus: EventBus,
    /// Webhook verification settings.
    pub webhook: WebhookSettings,
    /// Currency for new payment intents.
    pub currency: String,
    /// Per-socket outbound queue capacity.
    pub ws_outbound_capacity: usize,
}
