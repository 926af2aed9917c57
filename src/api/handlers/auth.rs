//! Streamer sign-in through the streaming platform.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{AuthRequest, AuthResponse};
use crate::app_state::AppState;
use crate::domain::{NewStreamer, StreamerFilter, generate_secret_code};
use crate::error::{AppError, ErrorResponse};

/// `POST /auth/twitch`: Sign a streamer in.
///
/// Resolves the OAuth code with the platform. A streamer seen for the first
/// time is created with a fresh connection secret code.
///
/// # Errors
///
/// Returns [`AppError::Unauthorized`] if the platform rejects the code and
/// [`AppError::Internal`] if the platform user maps to several streamers.
#[utoipa::path(
    post,
    path = "/auth/twitch",
    tag = "Auth",
    summary = "Streamer sign-in",
    description = "Exchanges an OAuth authorization code for the streamer's platform identity and returns the streamer record with its overlay secret code.",
    request_body = AuthRequest,
    responses(
        (status = 202, description = "Streamer signed in", body = AuthResponse),
        (status = 401, description = "Platform rejected the code", body = ErrorResponse),
        (status = 500, description = "Duplicate streamer records", body = ErrorResponse),
    )
)]
pub async fn twitch_auth(
    State(state): State<AppState>,
    Json(req): Json<AuthRequest>,
) -> Result<impl IntoResponse, AppError> {
    let Some(identity) = state.identity.resolve(&req.code).await? else {
        return Err(AppError::Unauthorized(
            "platform rejected the authorization code".to_string(),
        ));
    };

    let mut existing = state
        .streamers
        .find_streamers(&StreamerFilter::by_twitch_id(identity.user_id.as_str()))
        .await?;
    if existing.len() > 1 {
        tracing::error!(twitch_id = %identity.user_id, "more than one streamer with the same platform id");
        return Err(AppError::Internal(
            "more than one streamer with the same platform id".to_string(),
        ));
    }

    let streamer = match existing.pop() {
        Some(streamer) => streamer,
        None => {
            let streamer = state
                .streamers
                .create_streamer(NewStreamer {
                    twitch_id: identity.user_id,
                    twitch_name: identity.login,
                    secret_code: generate_secret_code(),
                })
                .await?;
            tracing::info!(streamer = %streamer.id, twitch_name = %streamer.twitch_name, "streamer created");
            streamer
        }
    };

    Ok((StatusCode::ACCEPTED, Json(AuthResponse::from(streamer))))
}

/// Auth routes, mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/twitch", post(twitch_auth))
}
