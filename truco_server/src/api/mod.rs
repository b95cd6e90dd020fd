//! HTTP/WebSocket API for the Truco server.
//!
//! Play happens over the WebSocket at `/ws`; the HTTP routes exist for
//! monitoring and for browsing open rooms.
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                 - Server health status
//! GET  /api/v1/rooms           - List open rooms
//! GET  /api/v1/rooms/{code}    - One room's summary
//! GET  /ws                     - WebSocket game connection
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use truco::room::{RoomConfig, RoomManager};
//! use truco_server::api::{AppState, create_router};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(RoomManager::new(RoomConfig::default(), 100));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively; browsers connect from anywhere.

pub mod rate_limiter;
pub mod request_id;
pub mod rooms;
pub mod websocket;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use truco::room::RoomManager;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub room_manager: RoomManager,
    /// Open WebSocket connections
    connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(room_manager: RoomManager) -> Self {
        Self {
            room_manager,
            connections: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn open_connections(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    fn connection_opened(&self) -> u64 {
        self.connections.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn connection_closed(&self) -> u64 {
        self.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1)
    }
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/{code}", get(rooms::get_room));

    let routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .nest("/api/v1", v1_routes);

    request_id::with_request_ids(routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `503 Service Unavailable` once the room limit is reached, since
/// new games can no longer be created.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"1.0.0","rooms":{"active_count":3,"limit":1000},...}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active = state.room_manager.active_room_count().await;
    let limit = state.room_manager.max_rooms();
    let healthy = active < limit;

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "full" },
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": {
            "active_count": active,
            "limit": limit,
        },
        "connections": state.open_connections(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
