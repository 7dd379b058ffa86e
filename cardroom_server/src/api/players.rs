//! Bankroll endpoints for the authenticated player.

use axum::{extract::State, Extension, Json};
use cardroom::game::chips::{self, Chips};
use cardroom::game::entities::PlayerId;
use cardroom::game::errors::GameError;
use serde::{Deserialize, Serialize};

use super::{ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub player_id: PlayerId,
    pub username: String,
    pub display_name: String,
    pub bankroll: Chips,
}

#[derive(Debug, Deserialize)]
pub struct AmountBody {
    pub amount: Chips,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub bankroll: Chips,
}

pub async fn me(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<PlayerProfile> {
    let player = state
        .store
        .player_by_id(player_id)
        .await?
        .ok_or_else(|| GameError::NotFound("player".into()))?;
    Ok(Json(PlayerProfile {
        player_id: player.id,
        username: player.username,
        display_name: player.display_name,
        bankroll: player.bankroll,
    }))
}

pub async fn deposit(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Json(body): Json<AmountBody>,
) -> ApiResult<BalanceResponse> {
    let amount = chips::validate_amount(body.amount)?;
    let bankroll = state.store.credit_bankroll(player_id, amount).await?;
    Ok(Json(BalanceResponse { bankroll }))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Json(body): Json<AmountBody>,
) -> ApiResult<BalanceResponse> {
    let amount = chips::validate_amount(body.amount)?;
    let bankroll = state.store.debit_bankroll(player_id, amount).await?;
    Ok(Json(BalanceResponse { bankroll }))
}
