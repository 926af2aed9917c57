//! Payment-processor collaborator.
//!
//! [`PaymentProvider`] creates payment intents for new donations;
//! [`StripeClient`] implements it over the processor's REST API. The
//! [`webhook`] module verifies and parses the processor's payment
//! confirmations.

pub mod stripe;
pub mod webhook;

use std::fmt;

use async_trait::async_trait;

use crate::error::AppError;

pub use stripe::StripeClient;

/// A payment intent created with the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Processor ID, stored on the donation as `payment_id`.
    pub id: String,
    /// Secret handed to the donor's browser to complete the payment.
    pub client_secret: String,
}

/// Creates payment intents.
#[async_trait]
pub trait PaymentProvider: Send + Sync + fmt::Debug {
    /// Creates a payment intent for `amount` minor units of `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::UpstreamError`] if the processor call fails.
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, AppError>;
}
