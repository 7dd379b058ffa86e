//! Game commands and reads, routed through the owning table actor.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use cardroom::game::chips::Chips;
use cardroom::game::entities::{ActionKind, GameSummary, HandRecord, PlayerId, TableId};
use cardroom::game::errors::GameError;
use cardroom::game::snapshot::GameSnapshot;
use cardroom::table::actor::TableHandle;
use cardroom::table::messages::{BuyBackReceipt, CashOutReceipt, LeaveReceipt, ReadyReceipt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{ApiResult, AppState};

async fn table(state: &AppState, table_id: TableId) -> Result<TableHandle, GameError> {
    state
        .manager
        .get(table_id)
        .await
        .ok_or_else(|| GameError::NotFound("table".into()))
}

/// Caller must hold a seat at the table to read game state; a snapshot for
/// an arbitrary viewer would leak their hole cards.
async fn membership_snapshot(
    handle: &TableHandle,
    player_id: PlayerId,
) -> Result<GameSnapshot, GameError> {
    let snapshot = handle.snapshot(Some(player_id)).await?;
    if snapshot.player(player_id).is_none() {
        return Err(GameError::Forbidden("not a participant in this game".into()));
    }
    Ok(snapshot)
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<GameSnapshot> {
    let handle = table(&state, table_id).await?;
    Ok(Json(membership_snapshot(&handle, player_id).await?))
}

pub async fn start(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<GameSnapshot> {
    let handle = table(&state, table_id).await?;
    let snapshot = handle.start(player_id).await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct ActionBody {
    pub kind: ActionKind,
    pub amount: Option<Chips>,
}

pub async fn action(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
    Json(body): Json<ActionBody>,
) -> ApiResult<GameSnapshot> {
    let handle = table(&state, table_id).await?;
    let snapshot = handle.action(player_id, body.kind, body.amount).await?;
    crate::metrics::action_applied(&body.kind.to_string());
    if snapshot.winner_info.is_some() {
        crate::metrics::hand_completed();
    }
    Ok(Json(snapshot))
}

pub async fn ready(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<ReadyReceipt> {
    let handle = table(&state, table_id).await?;
    Ok(Json(handle.ready(player_id).await?))
}

pub async fn cash_out(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<CashOutReceipt> {
    let handle = table(&state, table_id).await?;
    let receipt = handle.cash_out(player_id).await?;
    if receipt.game_summary_generated {
        // The game is over and archived; the table itself goes away.
        info!("game {table_id} complete, removing table");
        if let Err(err) = state.manager.remove_table(table_id).await {
            warn!("failed to remove completed table {table_id}: {err}");
        }
    }
    Ok(Json(receipt))
}

#[derive(Debug, Deserialize)]
pub struct BuyBackBody {
    pub amount: Chips,
}

pub async fn buy_back_in(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
    Json(body): Json<BuyBackBody>,
) -> ApiResult<BuyBackReceipt> {
    let handle = table(&state, table_id).await?;
    Ok(Json(handle.buy_back_in(player_id, body.amount).await?))
}

pub async fn leave(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<LeaveReceipt> {
    let handle = table(&state, table_id).await?;
    Ok(Json(handle.leave(player_id).await?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandHistoryResponse {
    pub game_id: TableId,
    pub hand_history: Vec<HandRecord>,
}

pub async fn hand_history(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<HandHistoryResponse> {
    verify_participation(&state, table_id, player_id).await?;
    let hand_history = state.store.hand_records(table_id).await?;
    Ok(Json(HandHistoryResponse {
        game_id: table_id,
        hand_history,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub game_summary: GameSummary,
    pub game_status: String,
}

pub async fn summary(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
) -> ApiResult<SummaryResponse> {
    verify_participation(&state, table_id, player_id).await?;
    // A live table may already hold the summary; once the table is gone the
    // persistent row is the only source.
    if let Some(handle) = state.manager.get(table_id).await {
        let snapshot = handle.snapshot(Some(player_id)).await?;
        if let Some(game_summary) = snapshot.game_summary {
            return Ok(Json(SummaryResponse {
                game_summary,
                game_status: snapshot.status.to_string(),
            }));
        }
    }
    let game_summary = state
        .store
        .game_summary(table_id)
        .await?
        .ok_or_else(|| GameError::NotFound("game summary not available".into()))?;
    Ok(Json(SummaryResponse {
        game_summary,
        game_status: "FINISHED".to_string(),
    }))
}

/// Participation check that still works after the table actor is gone:
/// fall back to the persisted summary, then to the hand records.
async fn verify_participation(
    state: &AppState,
    table_id: TableId,
    player_id: PlayerId,
) -> Result<(), GameError> {
    if let Some(handle) = state.manager.get(table_id).await {
        membership_snapshot(&handle, player_id).await?;
        return Ok(());
    }
    if let Some(summary) = state.store.game_summary(table_id).await? {
        if summary.players.iter().any(|p| p.player_id == player_id) {
            return Ok(());
        }
        return Err(GameError::Forbidden("not a participant in this game".into()));
    }
    let records = state.store.hand_records(table_id).await?;
    if records.is_empty() {
        return Err(GameError::NotFound("game".into()));
    }
    let participated = records.iter().any(|record| {
        record
            .winner_info
            .money_changes
            .iter()
            .any(|change| change.player_id == player_id)
    });
    if participated {
        Ok(())
    } else {
        Err(GameError::Forbidden("not a participant in this game".into()))
    }
}
