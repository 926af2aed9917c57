//! Domain events routed through the [`crate::events::EventBus`].
//!
//! The set of events is closed: each variant carries its own typed payload
//! and a fixed routing name, so handlers branch on the enum instead of
//! casting an opaque payload at run time.

use serde::Serialize;

use super::{DonationStatus, RecipientId};

/// Routing name of [`DomainEvent::DonationPayed`].
pub const DONATION_PAYED: &str = "DonationPayed";

/// Payload of a confirmed donation payment.
///
/// `amount` is in minor currency units, exactly as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DonationPayed {
    /// Payment-processor identifier of the payment intent.
    pub payment_id: String,
    /// Donor message.
    pub message: String,
    /// Donor display name.
    pub name: String,
    /// Donation status after the update (always `PAYED`).
    pub status: DonationStatus,
    /// Donation row ID.
    pub donation_id: i64,
    /// Recipient of the donation.
    pub streamer_id: RecipientId,
    /// Amount in minor currency units.
    pub amount: i64,
}

/// Application-significant occurrence, independent of how it is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type", content = "payload")]
pub enum DomainEvent {
    /// A donation's payment was confirmed.
    DonationPayed(DonationPayed),
}

impl DomainEvent {
    /// Returns the routing name of this event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DonationPayed(_) => DONATION_PAYED,
        }
    }
}

impl From<DonationPayed> for DomainEvent {
    fn from(event: DonationPayed) -> Self {
        Self::DonationPayed(event)
    }
}
