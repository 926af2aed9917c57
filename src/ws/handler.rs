//! Axum WebSocket upgrade handler.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::StreamerFilter;
use crate::error::AppError;

/// `GET /ws/{secret_code}`: Upgrade to a donation notice stream.
///
/// The secret code is resolved before the upgrade, so an unknown code is a
/// plain `404` and never opens a socket.
///
/// # Errors
///
/// Returns [`AppError::StreamerNotFound`] for an unknown code and
/// [`AppError::PersistenceError`] if the lookup fails.
pub async fn ws_handler(
    Path(secret_code): Path<String>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let streamers = state
        .streamers
        .find_streamers(&StreamerFilter::by_secret_code(secret_code))
        .await?;
    let Some(streamer) = streamers.into_iter().next() else {
        return Err(AppError::StreamerNotFound);
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };

    let hub = state.hub.clone();
    let capacity = state.ws_outbound_capacity;
    Ok(ws
        .on_upgrade(move |socket| run_connection(socket, hub, streamer.id, capacity))
        .into_response())
}
