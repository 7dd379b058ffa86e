//! HTTP and WebSocket gateways.
//!
//! The command gateway is stateless: the JWT middleware resolves the caller
//! to a player id, the handler finds the owning table actor through the
//! manager, sends one command, and maps the reply (or error) onto HTTP.
//! The subscription gateway upgrades to WebSocket and attaches the caller
//! to the table's broadcaster.

pub mod auth;
pub mod games;
pub mod middleware;
pub mod players;
pub mod tables;
pub mod websocket;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use cardroom::auth::AuthManager;
use cardroom::clock::Clock;
use cardroom::db::store::GameStore;
use cardroom::game::chips::Chips;
use cardroom::game::errors::GameError;
use cardroom::table::manager::TableManager;
use serde_json::json;
use tower_http::cors::CorsLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthManager>,
    pub manager: Arc<TableManager>,
    pub store: Arc<dyn GameStore>,
    pub clock: Arc<dyn Clock>,
    /// Bankroll granted to newly registered players.
    pub starting_bankroll: Chips,
}

/// `GameError` carried through axum handlers.
#[derive(Debug)]
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GameError::Unauthenticated => StatusCode::UNAUTHORIZED,
            GameError::Forbidden(_) => StatusCode::FORBIDDEN,
            GameError::NotFound(_) => StatusCode::NOT_FOUND,
            GameError::Busy => StatusCode::CONFLICT,
            GameError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            err if err.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        crate::metrics::command_rejected(self.0.kind());
        let body = json!({ "error": self.0.kind(), "detail": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Assemble the full router.
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/tables", get(tables::list_tables));

    let protected = Router::new()
        .route("/api/players/me", get(players::me))
        .route("/api/players/me/deposit", post(players::deposit))
        .route("/api/players/me/withdraw", post(players::withdraw))
        .route("/api/tables", post(tables::create_table))
        .route("/api/tables/{id}/join", post(tables::join_table))
        .route("/api/games/{id}", get(games::get_game))
        .route("/api/games/{id}/start", post(games::start))
        .route("/api/games/{id}/action", post(games::action))
        .route("/api/games/{id}/ready", post(games::ready))
        .route("/api/games/{id}/cash_out", post(games::cash_out))
        .route("/api/games/{id}/buy_back_in", post(games::buy_back_in))
        .route("/api/games/{id}/leave", post(games::leave))
        .route("/api/games/{id}/hand-history", get(games::hand_history))
        .route("/api/games/{id}/summary", get(games::summary))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let ws = Router::new().route("/ws/games/{id}", get(websocket::websocket_handler));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(ws)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
