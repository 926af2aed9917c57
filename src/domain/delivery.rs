//! Delivery requests accepted by the hub and the wire message a recipient's
//! overlay receives.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RecipientId;

/// Display-ready notification addressed to one recipient.
///
/// `amount` is already in display units; the hub never converts currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEvent {
    /// Destination recipient.
    pub recipient_id: RecipientId,
    /// Amount in display units.
    pub amount: i64,
    /// Donor display name.
    pub display_name: String,
    /// Donor message.
    pub message: String,
}

/// Outbound JSON message written to a recipient's connection.
///
/// ```json
/// { "name": "Ada", "text": "hi", "amount": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DonationNotice {
    /// Donor display name.
    pub name: String,
    /// Donor message.
    pub text: String,
    /// Amount in display units.
    pub amount: i64,
}

impl From<DeliveryEvent> for DonationNotice {
    fn from(event: DeliveryEvent) -> Self {
        Self {
            name: event.display_name,
            text: event.message,
            amount: event.amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_wire_shape_omits_recipient() {
        let notice = DonationNotice::from(DeliveryEvent {
            recipient_id: RecipientId::new(42),
            amount: 5,
            display_name: "Ada".to_string(),
            message: "hi".to_string(),
        });
        let json = serde_json::to_string(&notice).unwrap_or_default();
        assert_eq!(json, r#"{"name":"Ada","text":"hi","amount":5}"#);
    }
}
