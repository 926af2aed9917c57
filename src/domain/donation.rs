//! Donation records and their payment lifecycle.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::RecipientId;

/// Payment state of a donation.
///
/// Stored as upper-case text (`"CREATED"`, `"PAYED"`, ...) so rows written
/// by older deployments stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationStatus {
    /// Payment intent created, waiting for the donor.
    Created,
    /// Payment is being processed by the payment processor.
    Processing,
    /// Payment confirmed.
    Payed,
    /// Payment failed or was abandoned.
    Failed,
}

impl DonationStatus {
    /// Returns the stored text form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Processing => "PROCESSING",
            Self::Payed => "PAYED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown donation status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for DonationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "PROCESSING" => Ok(Self::Processing),
            "PAYED" => Ok(Self::Payed),
            "FAILED" => Ok(Self::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A stored donation.
///
/// `amount` is always in minor currency units (cents).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Donation {
    /// Row ID.
    pub id: i64,
    /// Payment-processor identifier of the payment intent.
    pub payment_id: String,
    /// Recipient of the donation.
    pub streamer_id: RecipientId,
    /// Amount in minor currency units.
    pub amount: i64,
    /// Donor message shown on stream.
    pub message: String,
    /// Donor display name.
    pub name: String,
    /// Payment state.
    pub status: DonationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a new donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDonation {
    /// Payment-processor identifier of the payment intent.
    pub payment_id: String,
    /// Recipient of the donation.
    pub streamer_id: RecipientId,
    /// Amount in minor currency units.
    pub amount: i64,
    /// Donor message.
    pub message: String,
    /// Donor display name.
    pub name: String,
    /// Initial payment state.
    pub status: DonationStatus,
}

/// Query filter for donations. Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationFilter {
    /// Match on payment-processor ID.
    pub payment_id: Option<String>,
    /// Match on recipient.
    pub streamer_id: Option<RecipientId>,
    /// Match on payment state.
    pub status: Option<DonationStatus>,
}

impl DonationFilter {
    /// Filter selecting donations by payment-processor ID.
    #[must_use]
    pub fn by_payment_id(payment_id: impl Into<String>) -> Self {
        Self {
            payment_id: Some(payment_id.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if `donation` satisfies every set field.
    #[must_use]
    pub fn matches(&self, donation: &Donation) -> bool {
        self.payment_id
            .as_deref()
            .is_none_or(|p| p == donation.payment_id)
            && self.streamer_id.is_none_or(|s| s == donation.streamer_id)
            && self.status.is_none_or(|s| s == donation.status)
    }
}
