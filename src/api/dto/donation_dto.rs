//! Donation DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /api/v1/donations`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDonationRequest {
    /// Login name of the streamer receiving the donation.
    #[serde(default)]
    pub streamer: String,
    /// Amount in minor currency units.
    #[serde(default)]
    pub amount: i64,
    /// Message shown on stream.
    #[serde(default)]
    pub message: String,
    /// Donor display name.
    #[serde(default)]
    pub name: String,
}

impl CreateDonationRequest {
    /// Checks the fields that can be validated without a lookup.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.streamer.trim().is_empty() {
            return Err("streamer must not be empty".to_string());
        }
        if self.amount <= 0 {
            return Err("amount must be positive".to_string());
        }
        Ok(())
    }
}

/// Response body for `POST /api/v1/donations`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateDonationResponse {
    /// Payment-intent secret the donor's browser completes the payment with.
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(streamer: &str, amount: i64) -> CreateDonationRequest {
        CreateDonationRequest {
            streamer: streamer.to_string(),
            amount,
            message: String::new(),
            name: String::new(),
        }
    }

    #[test]
    fn validation_rejects_empty_streamer_and_non_positive_amount() {
        assert!(request("ada", 500).validate().is_ok());
        assert!(request("", 500).validate().is_err());
        assert!(request("  ", 500).validate().is_err());
        assert!(request("ada", 0).validate().is_err());
        assert!(request("ada", -5).validate().is_err());
    }

    #[test]
    fn response_uses_camel_case_secret() {
        let json = serde_json::to_string(&CreateDonationResponse {
            client_secret: "pi_secret".to_string(),
        })
        .unwrap_or_default();
        assert_eq!(json, r#"{"clientSecret":"pi_secret"}"#);
    }
}
