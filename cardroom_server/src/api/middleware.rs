//! JWT middleware for protected endpoints.
//!
//! Extracts `Authorization: Bearer <token>`, verifies it, and injects the
//! caller's player id into request extensions for the handlers downstream.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use cardroom::game::entities::PlayerId;
use cardroom::game::errors::GameError;

use super::{ApiError, AppState};

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(GameError::Unauthenticated)?;

    let claims = state.auth.verify_token(token)?;
    let player_id: PlayerId = claims.sub;
    request.extensions_mut().insert(player_id);
    Ok(next.run(request).await)
}
