//! Room listing endpoints.
//!
//! Rooms are created and joined over the WebSocket; HTTP only exposes the
//! lobby so clients can browse before connecting.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use truco::room::{RoomError, RoomSummary};

use super::{AppState, request_id};

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Lobby listing, newest room first.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/api/v1/rooms
/// # [{"code":"K7Q2ZD","game":"truco","humans":1,"bots":2,"capacity":4,"started":false,...}]
/// ```
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.room_manager.list_rooms().await)
}

/// One room's summary. Codes are matched case-insensitively.
///
/// # Response
///
/// `404 Not Found` when no open room has that code.
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomSummary>, (StatusCode, Json<ErrorResponse>)> {
    request_id::record_room(&code);
    match state.room_manager.room_summary(&code).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => {
            tracing::debug!("room lookup failed: {e}");
            let status = match e {
                RoomError::RoomNotFound(_) | RoomError::RoomClosed => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(ErrorResponse { error: e.to_string() })))
        }
    }
}
