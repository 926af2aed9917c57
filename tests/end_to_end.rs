//! End-to-end: a confirmed payment reaches the streamer's overlay.
//!
//! Serves the full router on an ephemeral port with in-memory stores and
//! stub payment/identity providers, connects an overlay over WebSocket and
//! drives the payment webhook over HTTP.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::{self, Message};

use donation_alarm::api::build_app;
use donation_alarm::app_state::{AppState, WebhookSettings};
use donation_alarm::dispatch::spawn_dispatch_core;
use donation_alarm::domain::{DonationStatus, NewDonation, NewStreamer};
use donation_alarm::error::AppError;
use donation_alarm::hub::{Hub, HubConfig};
use donation_alarm::identity::{IdentityProvider, PlatformIdentity};
use donation_alarm::payments::webhook::{SIGNATURE_HEADER, sign_payload};
use donation_alarm::payments::{PaymentIntent, PaymentProvider};
use donation_alarm::persistence::{DonationStore, MemoryStore, StreamerStore};

const WEBHOOK_SECRET: &str = "whsec_e2e";
const OVERLAY_CODE: &str = "overlaysecret";

#[derive(Debug)]
struct NoPayments;

#[async_trait]
impl PaymentProvider for NoPayments {
    async fn create_payment_intent(&self, _: i64, _: &str) -> Result<PaymentIntent, AppError> {
        Err(AppError::UpstreamError("not used".to_string()))
    }
}

#[derive(Debug)]
struct NoIdentity;

#[async_trait]
impl IdentityProvider for NoIdentity {
    async fn resolve(&self, _: &str) -> Result<Option<PlatformIdentity>, AppError> {
        Ok(None)
    }
}

struct Server {
    addr: String,
    hub: Hub,
}

async fn start() -> Server {
    let store = Arc::new(MemoryStore::new());
    let Ok(streamer) = store
        .create_streamer(NewStreamer {
            twitch_id: "1234".to_string(),
            twitch_name: "ada".to_string(),
            secret_code: OVERLAY_CODE.to_string(),
        })
        .await
    else {
        panic!("streamer not created");
    };
    let created = store
        .create_donation(NewDonation {
            payment_id: "pi_1".to_string(),
            streamer_id: streamer.id,
            amount: 500,
            message: "hi".to_string(),
            name: "Ada".to_string(),
            status: DonationStatus::Created,
        })
        .await;
    assert!(created.is_ok());

    let Ok((hub, event_bus)) = spawn_dispatch_core(HubConfig::default(), 16) else {
        panic!("dispatch core failed to start");
    };
    let state = AppState {
        donations: Arc::clone(&store) as _,
        streamers: store as _,
        payments: Arc::new(NoPayments),
        identity: Arc::new(NoIdentity),
        hub: hub.clone(),
        event_bus,
        webhook: WebhookSettings {
            secret: WEBHOOK_SECRET.to_string(),
            tolerance: Duration::from_secs(300),
        },
        currency: "usd".to_string(),
        ws_outbound_capacity: 8,
    };

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, build_app(state)).await;
    });

    Server {
        addr: addr.to_string(),
        hub,
    }
}

async fn wait_for_registrations(hub: &Hub, expected: usize) {
    for _ in 0..200 {
        if hub.registered_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {expected} registrations, have {}", hub.registered_count());
}

async fn post_payment(server: &Server, payment_id: &str, amount: i64) -> reqwest::StatusCode {
    let body = serde_json::json!({
        "id": "evt_e2e",
        "type": "payment_intent.succeeded",
        "data": {"object": {"id": payment_id, "amount": amount}},
    })
    .to_string();
    let Ok(signature) = sign_payload(body.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp())
    else {
        panic!("signing failed");
    };
    let Ok(response) = reqwest::Client::new()
        .post(format!("http://{}/webhooks/payments", server.addr))
        .header(SIGNATURE_HEADER, signature)
        .body(body)
        .send()
        .await
    else {
        panic!("webhook request failed");
    };
    response.status()
}

#[tokio::test]
async fn confirmed_payment_is_announced_on_overlay() {
    let server = start().await;
    let Ok((mut overlay, _)) =
        tokio_tungstenite::connect_async(format!("ws://{}/ws/{OVERLAY_CODE}", server.addr)).await
    else {
        panic!("overlay failed to connect");
    };
    wait_for_registrations(&server.hub, 1).await;

    assert_eq!(post_payment(&server, "pi_1", 500).await, reqwest::StatusCode::OK);

    let Ok(Some(Ok(frame))) = tokio::time::timeout(Duration::from_secs(5), overlay.next()).await
    else {
        panic!("no frame received");
    };
    let Message::Text(text) = frame else {
        panic!("expected a text frame");
    };
    assert_eq!(text.as_str(), r#"{"name":"Ada","text":"hi","amount":5}"#);
}

#[tokio::test]
async fn newer_overlay_replaces_older_one() {
    let server = start().await;
    let url = format!("ws://{}/ws/{OVERLAY_CODE}", server.addr);

    let Ok((mut first, _)) = tokio_tungstenite::connect_async(url.as_str()).await else {
        panic!("first overlay failed to connect");
    };
    wait_for_registrations(&server.hub, 1).await;
    let Ok((mut second, _)) = tokio_tungstenite::connect_async(url.as_str()).await else {
        panic!("second overlay failed to connect");
    };

    let Ok(Some(Ok(Message::Close(Some(frame))))) =
        tokio::time::timeout(Duration::from_secs(5), first.next()).await
    else {
        panic!("displaced overlay was not closed");
    };
    assert_eq!(u16::from(frame.code), 4000);
    assert_eq!(server.hub.registered_count(), 1);

    assert_eq!(post_payment(&server, "pi_1", 500).await, reqwest::StatusCode::OK);
    let Ok(Some(Ok(Message::Text(text)))) =
        tokio::time::timeout(Duration::from_secs(5), second.next()).await
    else {
        panic!("newer overlay received nothing");
    };
    assert_eq!(text.as_str(), r#"{"name":"Ada","text":"hi","amount":5}"#);
}

#[tokio::test]
async fn overlay_close_deregisters_connection() {
    let server = start().await;
    let Ok((mut overlay, _)) =
        tokio_tungstenite::connect_async(format!("ws://{}/ws/{OVERLAY_CODE}", server.addr)).await
    else {
        panic!("overlay failed to connect");
    };
    wait_for_registrations(&server.hub, 1).await;

    let closed = overlay.close(None).await;
    assert!(closed.is_ok());
    wait_for_registrations(&server.hub, 0).await;

    // Nobody is listening any more; the payment is still acknowledged.
    assert_eq!(post_payment(&server, "pi_1", 500).await, reqwest::StatusCode::OK);
}

#[tokio::test]
async fn unknown_overlay_code_is_refused_before_upgrade() {
    let server = start().await;
    let result =
        tokio_tungstenite::connect_async(format!("ws://{}/ws/not-a-code", server.addr)).await;
    let Err(tungstenite::Error::Http(response)) = result else {
        panic!("expected an HTTP error response");
    };
    assert_eq!(response.status(), 404);
    assert_eq!(server.hub.registered_count(), 0);
}
