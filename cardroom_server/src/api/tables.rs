//! Table discovery, creation, and joining.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use cardroom::game::chips::Chips;
use cardroom::game::entities::{PlayerId, TableId};
use cardroom::game::errors::GameError;
use cardroom::game::snapshot::GameSnapshot;
use cardroom::table::config::TableConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableListing {
    pub table_id: TableId,
    pub name: String,
    pub max_seats: usize,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
}

pub async fn list_tables(State(state): State<AppState>) -> ApiResult<Vec<TableListing>> {
    let rows = state.manager.list().await?;
    crate::metrics::tables_active(rows.len());
    Ok(Json(
        rows.into_iter()
            .map(|row| TableListing {
                table_id: row.id,
                name: row.config.name,
                max_seats: row.config.max_seats,
                small_blind: row.config.small_blind,
                big_blind: row.config.big_blind,
                min_buy_in: row.config.min_buy_in,
                max_buy_in: row.config.max_buy_in,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableBody {
    pub name: String,
    pub max_seats: Option<usize>,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub min_buy_in: Chips,
    pub max_buy_in: Chips,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableResponse {
    pub table_id: TableId,
}

pub async fn create_table(
    State(state): State<AppState>,
    Extension(player_id): Extension<PlayerId>,
    Json(body): Json<CreateTableBody>,
) -> ApiResult<CreateTableResponse> {
    let config = TableConfig {
        name: body.name,
        max_seats: body.max_seats.unwrap_or(9),
        small_blind: body.small_blind,
        big_blind: body.big_blind,
        min_buy_in: body.min_buy_in,
        max_buy_in: body.max_buy_in,
    };
    let table_id = state.manager.create_table(config).await?;
    info!("player {player_id} created table {table_id}");
    Ok(Json(CreateTableResponse { table_id }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinBody {
    pub buy_in: Chips,
}

pub async fn join_table(
    State(state): State<AppState>,
    Path(table_id): Path<TableId>,
    Extension(player_id): Extension<PlayerId>,
    Json(body): Json<JoinBody>,
) -> ApiResult<GameSnapshot> {
    let handle = state
        .manager
        .get(table_id)
        .await
        .ok_or_else(|| GameError::NotFound("table".into()))?;
    let snapshot = handle.join(player_id, body.buy_in).await?;
    Ok(Json(snapshot))
}
