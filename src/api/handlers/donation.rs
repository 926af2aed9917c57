//! Donation handlers: start a donation payment.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{CreateDonationRequest, CreateDonationResponse};
use crate::app_state::AppState;
use crate::domain::{DonationStatus, NewDonation, StreamerFilter};
use crate::error::{AppError, ErrorResponse};

/// `POST /donations`: Start a donation to a streamer.
///
/// Creates a payment intent with the processor and stores the donation as
/// `CREATED`. The donation becomes `PAYED` when the processor confirms the
/// payment through the webhook.
///
/// # Errors
///
/// Returns [`AppError::InvalidRequest`] for an empty streamer, a
/// non-positive amount or an unknown streamer.
#[utoipa::path(
    post,
    path = "/api/v1/donations",
    tag = "Donations",
    summary = "Start a donation",
    description = "Creates a payment intent for the donation and returns its client secret. The donation is announced to the streamer once the payment is confirmed.",
    request_body = CreateDonationRequest,
    responses(
        (status = 200, description = "Payment intent created", body = CreateDonationResponse),
        (status = 400, description = "Invalid request or unknown streamer", body = ErrorResponse),
        (status = 502, description = "Payment processor failure", body = ErrorResponse),
    )
)]
pub async fn create_donation(
    State(state): State<AppState>,
    Json(req): Json<CreateDonationRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate().map_err(AppError::InvalidRequest)?;

    let streamers = state
        .streamers
        .find_streamers(&StreamerFilter::by_twitch_name(req.streamer.as_str()))
        .await?;
    let Some(streamer) = streamers.into_iter().next() else {
        return Err(AppError::InvalidRequest(format!(
            "unknown streamer: {}",
            req.streamer
        )));
    };

    let intent = state
        .payments
        .create_payment_intent(req.amount, &state.currency)
        .await?;

    let donation = state
        .donations
        .create_donation(NewDonation {
            payment_id: intent.id,
            streamer_id: streamer.id,
            amount: req.amount,
            message: req.message,
            name: req.name,
            status: DonationStatus::Created,
        })
        .await?;
    tracing::info!(
        donation_id = donation.id,
        streamer = %streamer.id,
        payment_id = %donation.payment_id,
        amount = donation.amount,
        "donation created"
    );

    Ok((
        StatusCode::OK,
        Json(CreateDonationResponse {
            client_secret: intent.client_secret,
        }),
    ))
}

/// Donation routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/donations", post(create_donation))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use reqwest::StatusCode;

    use crate::domain::{DonationFilter, NewStreamer};
    use crate::persistence::{DonationStore, StreamerStore};
    use crate::testing::{TestApp, spawn_app};

    async fn app_with_streamer() -> TestApp {
        let Some(app) = spawn_app().await else {
            panic!("app failed to start");
        };
        let created = app
            .store
            .create_streamer(NewStreamer {
                twitch_id: "1234".to_string(),
                twitch_name: "ada".to_string(),
                secret_code: "code".to_string(),
            })
            .await;
        assert!(created.is_ok());
        app
    }

    async fn post(app: &TestApp, body: serde_json::Value) -> reqwest::Response {
        let Ok(response) = reqwest::Client::new()
            .post(format!("{}/api/v1/donations", app.base))
            .json(&body)
            .send()
            .await
        else {
            panic!("request failed");
        };
        response
    }

    #[tokio::test]
    async fn creates_donation_and_returns_client_secret() {
        let app = app_with_streamer().await;
        let response = post(
            &app,
            serde_json::json!({"streamer": "ada", "amount": 500, "message": "hi", "name": "Bob"}),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let Ok(body) = response.json::<serde_json::Value>().await else {
            panic!("response is not JSON");
        };
        assert_eq!(body, serde_json::json!({"clientSecret": "pi_1_secret"}));

        let Ok(stored) = app
            .store
            .find_donations(&DonationFilter::by_payment_id("pi_1"))
            .await
        else {
            panic!("lookup failed");
        };
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.first().map(|d| d.amount), Some(500));
        assert_eq!(
            stored.first().map(|d| d.status),
            Some(crate::domain::DonationStatus::Created)
        );
    }

    #[tokio::test]
    async fn rejects_invalid_requests() {
        let app = app_with_streamer().await;
        for body in [
            serde_json::json!({"streamer": "", "amount": 500}),
            serde_json::json!({"streamer": "ada", "amount": 0}),
            serde_json::json!({"streamer": "nobody", "amount": 500}),
        ] {
            assert_eq!(post(&app, body).await.status(), StatusCode::BAD_REQUEST);
        }

        let Ok(stored) = app.store.find_donations(&DonationFilter::default()).await else {
            panic!("lookup failed");
        };
        assert!(stored.is_empty());
    }
}
