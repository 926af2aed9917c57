//! Payment-processor webhook: confirms donations and announces them.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use chrono::Utc;

use crate::app_state::AppState;
use crate::domain::{DomainEvent, DonationFilter, DonationPayed, DonationStatus};
use crate::error::{AppError, ErrorResponse};
use crate::payments::webhook::{
    PAYMENT_INTENT_SUCCEEDED, PaymentIntentObject, SIGNATURE_HEADER, WebhookEvent,
    verify_signature,
};

/// Largest accepted webhook body.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 64 * 1024;

/// `POST /webhooks/payments`: Payment-processor event delivery.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] for an unreadable payload,
/// [`AppError::InvalidSignature`] for a missing or wrong signature, and
/// [`AppError::Internal`] if a payment ID matches more than one donation.
#[utoipa::path(
    post,
    path = "/webhooks/payments",
    tag = "Webhooks",
    summary = "Payment-processor webhook",
    description = "Receives signed payment events. A succeeded payment intent marks its donation as PAYED and announces it to the streamer's overlay. Redeliveries for a donation already PAYED are acknowledged without a second announcement.",
    request_body(content = String, description = "Raw signed event payload", content_type = "application/json"),
    params(
        ("Stripe-Signature" = String, Header, description = "Delivery signature, `t=<unix>,v1=<hex>`"),
    ),
    responses(
        (status = 200, description = "Event accepted"),
        (status = 400, description = "Unreadable payload or bad signature", body = ErrorResponse),
        (status = 500, description = "Ambiguous donation record", body = ErrorResponse),
    )
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidRequest(format!("unreadable webhook payload: {e}")))?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::InvalidSignature("missing signature header".to_string()))?;
    verify_signature(
        &body,
        signature,
        &state.webhook.secret,
        Utc::now().timestamp(),
        state.webhook.tolerance,
    )
    .map_err(|e| {
        tracing::warn!(event_id = %event.id, error = %e, "webhook signature verification failed");
        AppError::InvalidSignature(e.to_string())
    })?;

    match event.event_type.as_str() {
        PAYMENT_INTENT_SUCCEEDED => {
            let intent: PaymentIntentObject = serde_json::from_value(event.data.object)
                .map_err(|e| AppError::InvalidRequest(format!("unreadable payment intent: {e}")))?;
            confirm_donation(&state, intent).await
        }
        other => {
            tracing::info!(event_id = %event.id, event_type = other, "unhandled webhook event type");
            Ok(StatusCode::OK)
        }
    }
}

async fn confirm_donation(
    state: &AppState,
    intent: PaymentIntentObject,
) -> Result<StatusCode, AppError> {
    tracing::info!(payment_id = %intent.id, amount = intent.amount, "payment succeeded");

    let donations = match state
        .donations
        .find_donations(&DonationFilter::by_payment_id(intent.id.as_str()))
        .await
    {
        Ok(donations) => donations,
        Err(e) => {
            tracing::error!(payment_id = %intent.id, error = %e, "donation lookup failed");
            return Ok(StatusCode::OK);
        }
    };

    let mut donation = match donations.as_slice() {
        [] => {
            tracing::warn!(payment_id = %intent.id, "no donation for payment");
            return Ok(StatusCode::OK);
        }
        [donation] => donation.clone(),
        _ => {
            tracing::error!(
                payment_id = %intent.id,
                matches = donations.len(),
                "more than one donation for payment"
            );
            return Err(AppError::Internal(format!(
                "more than one donation for payment {}",
                intent.id
            )));
        }
    };

    if donation.status == DonationStatus::Payed {
        tracing::info!(
            payment_id = %intent.id,
            donation_id = donation.id,
            "donation already payed; redelivery ignored"
        );
        return Ok(StatusCode::OK);
    }

    if intent.amount != donation.amount {
        tracing::warn!(
            payment_id = %intent.id,
            expected = donation.amount,
            received = intent.amount,
            "payment amount does not match donation"
        );
    }

    donation.status = DonationStatus::Payed;
    state.donations.update_donation(&donation).await.map_err(|e| {
        tracing::error!(donation_id = donation.id, error = %e, "failed to mark donation payed");
        AppError::InvalidRequest(format!("donation {} could not be updated", donation.id))
    })?;

    state.event_bus.emit(DomainEvent::DonationPayed(DonationPayed {
        payment_id: donation.payment_id,
        message: donation.message,
        name: donation.name,
        status: donation.status,
        donation_id: donation.id,
        streamer_id: donation.streamer_id,
        amount: donation.amount,
    }));

    Ok(StatusCode::OK)
}

/// Webhook routes, mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/webhooks/payments", post(payment_webhook))
        .layer(DefaultBodyLimit::max(MAX_WEBHOOK_BODY_BYTES))
}
