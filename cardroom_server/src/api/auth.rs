//! Registration and login.

use axum::{extract::State, Json};
use cardroom::game::chips::Chips;
use cardroom::game::entities::PlayerId;
use cardroom::game::errors::GameError;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub player_id: PlayerId,
    pub username: String,
    pub bankroll: Chips,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub player_id: PlayerId,
    pub display_name: String,
    pub bankroll: Chips,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<RegisterResponse> {
    let username = body.username.trim();
    if username.is_empty() || username.len() > 32 {
        return Err(GameError::InvalidAction("username must be 1-32 characters".into()).into());
    }
    if body.password.len() < 8 {
        return Err(GameError::InvalidAction("password must be at least 8 characters".into()).into());
    }
    let display_name = body
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(username);
    let hash = state.auth.hash_password(&body.password)?;
    let player = state
        .store
        .create_player(username, &hash, display_name, state.starting_bankroll)
        .await?;
    info!("registered player {} ({})", player.id, player.username);
    Ok(Json(RegisterResponse {
        player_id: player.id,
        username: player.username,
        bankroll: player.bankroll,
    }))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<LoginResponse> {
    let (player, hash) = state
        .store
        .player_with_hash(body.username.trim())
        .await?
        .ok_or(GameError::Unauthenticated)?;
    state.auth.verify_password(&body.password, &hash)?;
    let token = state
        .auth
        .issue_token(player.id, &player.username, state.clock.now())?;
    Ok(Json(LoginResponse {
        token,
        player_id: player.id,
        display_name: player.display_name,
        bankroll: player.bankroll,
    }))
}
