//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Public donation endpoints are mounted under `/api/v1`; the webhook,
//! sign-in, health and WebSocket endpoints live at the root.

pub mod dto;
pub mod handlers;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Upper bound on the time to produce a response.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenAPI document for the HTTP surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "donation-alarm", description = "Real-time donation notifications for streamers"),
    paths(
        handlers::donation::create_donation,
        handlers::webhooks::payment_webhook,
        handlers::auth::twitch_auth,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
        crate::domain::DonationNotice,
        dto::CreateDonationRequest,
        dto::CreateDonationResponse,
        dto::AuthRequest,
        dto::AuthResponse,
        dto::HealthResponse,
    )),
    tags(
        (name = "Donations", description = "Donation payments"),
        (name = "Webhooks", description = "Payment-processor callbacks"),
        (name = "Auth", description = "Streamer sign-in"),
        (name = "System", description = "Health check"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::webhooks::routes())
        .merge(handlers::auth::routes())
        .merge(handlers::system::routes())
}

/// Builds the whole application: REST, WebSocket, API docs and middleware.
pub fn build_app(state: AppState) -> Router {
    let router = build_router().route("/ws/{secret_code}", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT)),
        )
        .with_state(state)
}
