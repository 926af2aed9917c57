//! Bridges confirmed donation payments to recipient notifications.

use async_trait::async_trait;

use super::{EventHandler, HandlerError};
use crate::domain::{DeliveryEvent, DomainEvent, DonationPayed};
use crate::hub::Hub;

/// Minor currency units per display unit.
const MINOR_UNITS_PER_UNIT: i64 = 100;

/// Turns [`DomainEvent::DonationPayed`] into a hub delivery.
///
/// This is the only place minor currency units become display units.
#[derive(Debug, Clone)]
pub struct DonationPayedHandler {
    hub: Hub,
}

impl DonationPayedHandler {
    /// Creates a handler delivering through `hub`.
    #[must_use]
    pub fn new(hub: Hub) -> Self {
        Self { hub }
    }
}

/// Translates a paid donation into a display-ready delivery.
///
/// The amount is truncated toward zero: `12345` minor units become `123`.
#[must_use]
pub fn to_delivery(event: DonationPayed) -> DeliveryEvent {
    DeliveryEvent {
        recipient_id: event.streamer_id,
        amount: event.amount / MINOR_UNITS_PER_UNIT,
        display_name: event.name,
        message: event.message,
    }
}

#[async_trait]
impl EventHandler for DonationPayedHandler {
    async fn handle(&self, event: DomainEvent) -> Result<(), HandlerError> {
        let DomainEvent::DonationPayed(payed) = event;
        let delivery = to_delivery(payed);
        tracing::debug!(
            recipient_id = %delivery.recipient_id,
            amount = delivery.amount,
            "forwarding paid donation to hub"
        );
        self.hub.deliver(delivery).await?;
        Ok(())
    }
}
