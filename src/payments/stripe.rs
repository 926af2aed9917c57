//! Payment intents over the Stripe REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{PaymentIntent, PaymentProvider};
use crate::error::AppError;

/// Default API base URL.
pub const STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    id: String,
    client_secret: String,
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    http_client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    /// Creates a client authenticating with `secret_key`.
    #[must_use]
    pub fn new(secret_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base: STRIPE_API_BASE.to_string(),
            secret_key: secret_key.into(),
        }
    }

    /// Points the client at a different API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError> {
        let amount = amount.to_string();
        let params = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .http_client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, body = %body, "payment intent creation rejected");
            return Err(AppError::UpstreamError(format!(
                "payment processor returned {status}"
            )));
        }

        let intent: PaymentIntentResponse = response.json().await?;
        tracing::debug!(payment_id = %intent.id, "payment intent created");
        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
        })
    }
}
