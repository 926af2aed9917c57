//! Payment-processor webhook signatures and event payloads.
//!
//! The processor signs every webhook delivery with the endpoint secret and
//! sends the result in the `Stripe-Signature` header:
//!
//! ```text
//! Stripe-Signature: t=1700000000,v1=5257a869e7ec...,v1=...
//! ```
//!
//! The signed payload is `"{t}.{raw body}"`, the MAC is HMAC-SHA256 encoded
//! as lower-case hex. Any `v1` entry may match; other schemes are ignored.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the signature header.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Default maximum age of a signed delivery.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Event type of a confirmed payment.
pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

/// Signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The header has no parseable `t=` timestamp.
    #[error("signature header has no valid timestamp")]
    MissingTimestamp,

    /// The header carries no `v1=` signature.
    #[error("signature header has no v1 signature")]
    MissingSignature,

    /// The delivery is older than the tolerance.
    #[error("timestamp outside tolerance ({age_secs}s old)")]
    Expired {
        /// Age of the delivery in seconds.
        age_secs: i64,
    },

    /// No `v1` signature matches the payload.
    #[error("no signature matches the payload")]
    Mismatch,

    /// The secret could not be used as an HMAC key.
    #[error("invalid signing secret")]
    InvalidKey,
}

/// Parsed `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            // undecodable entries cannot match anyway
            "v1" => {
                if let Ok(sig) = hex::decode(value) {
                    signatures.push(sig);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    if signatures.is_empty() {
        return Err(SignatureError::MissingSignature);
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn mac_for(payload: &[u8], secret: &str, timestamp: i64) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verifies a webhook delivery.
///
/// `now` is the current Unix time in seconds. Deliveries signed more than
/// `tolerance` ago are rejected.
///
/// # Errors
///
/// Returns a [`SignatureError`] describing why the delivery was rejected.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance: Duration,
) -> Result<(), SignatureError> {
    let parsed = parse_header(header)?;

    let age_secs = now.saturating_sub(parsed.timestamp);
    let tolerance_secs = i64::try_from(tolerance.as_secs()).unwrap_or(i64::MAX);
    if age_secs > tolerance_secs {
        return Err(SignatureError::Expired { age_secs });
    }

    let mac = mac_for(payload, secret, parsed.timestamp)?;
    if parsed
        .signatures
        .iter()
        .any(|sig| mac.clone().verify_slice(sig).is_ok())
    {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Builds a valid signature header for `payload`.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidKey`] if `secret` is unusable.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, SignatureError> {
    let digest = mac_for(payload, secret, timestamp)?.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
}

/// Envelope of a webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Processor event ID.
    pub id: String,
    /// Event type, e.g. `payment_intent.succeeded`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: WebhookData,
}

/// The `data` member of a webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    /// The object the event is about; its shape depends on the event type.
    pub object: serde_json::Value,
}

/// The fields of a payment intent this service reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntentObject {
    /// Payment intent ID.
    pub id: String,
    /// Amount in minor currency units.
    pub amount: i64,
}
