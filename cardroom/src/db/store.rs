//! The persistence contract and its PostgreSQL implementation.
//!
//! Four durable tables back the engine: `players` (bankrolls), `tables`
//! (configuration), `hand_records` (append-only, one row per completed
//! hand), and `game_summaries` (one row per completed game). Bankroll
//! movement is a single conditional UPDATE so a debit can never overdraw.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::game::chips::Chips;
use crate::game::entities::{GameSummary, HandRecord, PlayerId, TableId};
use crate::game::errors::GameError;
use crate::table::config::TableConfig;

/// A player row as the gateways need it.
#[derive(Clone, Debug)]
pub struct PlayerRow {
    pub id: PlayerId,
    pub username: String,
    pub display_name: String,
    pub bankroll: Chips,
}

/// A table row for discovery listings.
#[derive(Clone, Debug)]
pub struct TableRow {
    pub id: TableId,
    pub config: TableConfig,
}

/// Everything the table layer persists. The in-memory implementation in
/// [`crate::db::memory`] backs the tests; [`PgStore`] backs production.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn create_player(
        &self,
        username: &str,
        password_hash: &str,
        display_name: &str,
        starting_bankroll: Chips,
    ) -> Result<PlayerRow, GameError>;

    /// Player plus stored password hash, for login.
    async fn player_with_hash(
        &self,
        username: &str,
    ) -> Result<Option<(PlayerRow, String)>, GameError>;

    async fn player_by_id(&self, player_id: PlayerId) -> Result<Option<PlayerRow>, GameError>;

    /// Take chips out of a bankroll; fails with `InsufficientFunds` rather
    /// than overdrawing. Returns the new balance.
    async fn debit_bankroll(&self, player_id: PlayerId, amount: Chips)
        -> Result<Chips, GameError>;

    /// Put chips back into a bankroll. Returns the new balance.
    async fn credit_bankroll(
        &self,
        player_id: PlayerId,
        amount: Chips,
    ) -> Result<Chips, GameError>;

    async fn insert_table(&self, config: &TableConfig) -> Result<TableId, GameError>;

    async fn delete_table(&self, table_id: TableId) -> Result<(), GameError>;

    async fn list_tables(&self) -> Result<Vec<TableRow>, GameError>;

    async fn insert_hand_record(
        &self,
        table_id: TableId,
        record: &HandRecord,
    ) -> Result<(), GameError>;

    /// Records for one table, most recent hand first.
    async fn hand_records(&self, table_id: TableId) -> Result<Vec<HandRecord>, GameError>;

    /// Record the end of a game: write the summary and return every settled
    /// stack to its owner's bankroll, in one transaction. Idempotent per
    /// table; a second completion writes nothing and pays nothing.
    async fn complete_game(
        &self,
        table_id: TableId,
        summary: &GameSummary,
        payouts: &[(PlayerId, Chips)],
    ) -> Result<(), GameError>;

    async fn game_summary(&self, table_id: TableId) -> Result<Option<GameSummary>, GameError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_player(row: &sqlx::postgres::PgRow) -> PlayerRow {
        PlayerRow {
            id: row.get("id"),
            username: row.get("username"),
            display_name: row.get("display_name"),
            bankroll: row.get("bankroll"),
        }
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn create_player(
        &self,
        username: &str,
        password_hash: &str,
        display_name: &str,
        starting_bankroll: Chips,
    ) -> Result<PlayerRow, GameError> {
        let existing = sqlx::query("SELECT id FROM players WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(GameError::InvalidAction("username is taken".into()));
        }
        let row = sqlx::query(
            r#"
            INSERT INTO players (username, password_hash, display_name, bankroll)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, display_name, bankroll
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(display_name)
        .bind(starting_bankroll)
        .fetch_one(&self.pool)
        .await?;
        Ok(Self::row_to_player(&row))
    }

    async fn player_with_hash(
        &self,
        username: &str,
    ) -> Result<Option<(PlayerRow, String)>, GameError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, bankroll, password_hash FROM players WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| {
            let hash: String = row.get("password_hash");
            (Self::row_to_player(&row), hash)
        }))
    }

    async fn player_by_id(&self, player_id: PlayerId) -> Result<Option<PlayerRow>, GameError> {
        let row = sqlx::query(
            "SELECT id, username, display_name, bankroll FROM players WHERE id = $1",
        )
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|row| Self::row_to_player(&row)))
    }

    async fn debit_bankroll(
        &self,
        player_id: PlayerId,
        amount: Chips,
    ) -> Result<Chips, GameError> {
        let row = sqlx::query(
            r#"
            UPDATE players SET bankroll = bankroll - $2
            WHERE id = $1 AND bankroll >= $2
            RETURNING bankroll
            "#,
        )
        .bind(player_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(row.get("bankroll")),
            None => {
                if self.player_by_id(player_id).await?.is_none() {
                    Err(GameError::NotFound("player".into()))
                } else {
                    Err(GameError::InsufficientFunds)
                }
            }
        }
    }

    async fn credit_bankroll(
        &self,
        player_id: PlayerId,
        amount: Chips,
    ) -> Result<Chips, GameError> {
        let row = sqlx::query(
            "UPDATE players SET bankroll = bankroll + $2 WHERE id = $1 RETURNING bankroll",
        )
        .bind(player_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|row| row.get("bankroll"))
            .ok_or_else(|| GameError::NotFound("player".into()))
    }

    async fn insert_table(&self, config: &TableConfig) -> Result<TableId, GameError> {
        let row = sqlx::query(
            r#"
            INSERT INTO tables (name, max_seats, small_blind, big_blind, min_buy_in, max_buy_in)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&config.name)
        .bind(config.max_seats as i32)
        .bind(config.small_blind)
        .bind(config.big_blind)
        .bind(config.min_buy_in)
        .bind(config.max_buy_in)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn delete_table(&self, table_id: TableId) -> Result<(), GameError> {
        sqlx::query("DELETE FROM tables WHERE id = $1")
            .bind(table_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<TableRow>, GameError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, max_seats, small_blind, big_blind, min_buy_in, max_buy_in
            FROM tables
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| TableRow {
                id: row.get("id"),
                config: TableConfig {
                    name: row.get("name"),
                    max_seats: row.get::<i32, _>("max_seats") as usize,
                    small_blind: row.get("small_blind"),
                    big_blind: row.get("big_blind"),
                    min_buy_in: row.get("min_buy_in"),
                    max_buy_in: row.get("max_buy_in"),
                },
            })
            .collect())
    }

    async fn insert_hand_record(
        &self,
        table_id: TableId,
        record: &HandRecord,
    ) -> Result<(), GameError> {
        let payload = serde_json::to_string(record)
            .map_err(|e| GameError::Internal(format!("hand record serialization: {e}")))?;
        sqlx::query(
            r#"
            INSERT INTO hand_records (table_id, hand_number, pot, final_phase, record)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (table_id, hand_number) DO NOTHING
            "#,
        )
        .bind(table_id)
        .bind(record.hand_number as i64)
        .bind(record.pot)
        .bind(record.final_phase.to_string())
        .bind(payload)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn hand_records(&self, table_id: TableId) -> Result<Vec<HandRecord>, GameError> {
        let rows = sqlx::query(
            "SELECT record FROM hand_records WHERE table_id = $1 ORDER BY hand_number DESC",
        )
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                let payload: String = row.get("record");
                serde_json::from_str(&payload)
                    .map_err(|e| GameError::Internal(format!("hand record deserialization: {e}")))
            })
            .collect()
    }

    async fn complete_game(
        &self,
        table_id: TableId,
        summary: &GameSummary,
        payouts: &[(PlayerId, Chips)],
    ) -> Result<(), GameError> {
        let payload = serde_json::to_string(summary)
            .map_err(|e| GameError::Internal(format!("summary serialization: {e}")))?;
        let mut tx = self.pool.begin().await?;
        let inserted = sqlx::query(
            r#"
            INSERT INTO game_summaries (table_id, table_name, summary)
            VALUES ($1, $2, $3)
            ON CONFLICT (table_id) DO NOTHING
            "#,
        )
        .bind(table_id)
        .bind(&summary.table_name)
        .bind(payload)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if inserted == 1 {
            for (player_id, amount) in payouts {
                sqlx::query("UPDATE players SET bankroll = bankroll + $2 WHERE id = $1")
                    .bind(player_id)
                    .bind(amount)
                    .execute(&mut *tx)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn game_summary(&self, table_id: TableId) -> Result<Option<GameSummary>, GameError> {
        let row = sqlx::query("SELECT summary FROM game_summaries WHERE table_id = $1")
            .bind(table_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| {
            let payload: String = row.get("summary");
            serde_json::from_str(&payload)
                .map_err(|e| GameError::Internal(format!("summary deserialization: {e}")))
        })
        .transpose()
    }
}
