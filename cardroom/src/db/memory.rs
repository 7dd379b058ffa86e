//! In-memory `GameStore` for tests and local experiments.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::game::chips::Chips;
use crate::game::entities::{GameSummary, HandRecord, PlayerId, TableId};
use crate::game::errors::GameError;
use crate::table::config::TableConfig;

use super::store::{GameStore, PlayerRow, TableRow};

#[derive(Default)]
struct Inner {
    players: HashMap<PlayerId, (PlayerRow, String)>,
    tables: HashMap<TableId, TableConfig>,
    hand_records: HashMap<TableId, Vec<HandRecord>>,
    summaries: HashMap<TableId, GameSummary>,
    next_player_id: PlayerId,
    next_table_id: TableId,
}

/// Mutex-guarded maps standing in for the SQL tables.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_player_id: 1,
                next_table_id: 1,
                ..Inner::default()
            }),
        }
    }

    /// Insert a player with a fixed id, bypassing registration. Test helper.
    pub async fn seed_player(
        &self,
        id: PlayerId,
        name: &str,
        bankroll: Chips,
    ) -> Result<(), GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.players.insert(
            id,
            (
                PlayerRow {
                    id,
                    username: name.to_string(),
                    display_name: name.to_string(),
                    bankroll,
                },
                String::new(),
            ),
        );
        inner.next_player_id = inner.next_player_id.max(id + 1);
        Ok(())
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn create_player(
        &self,
        username: &str,
        password_hash: &str,
        display_name: &str,
        starting_bankroll: Chips,
    ) -> Result<PlayerRow, GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        if inner
            .players
            .values()
            .any(|(p, _)| p.username == username)
        {
            return Err(GameError::InvalidAction("username is taken".into()));
        }
        let id = inner.next_player_id;
        inner.next_player_id += 1;
        let row = PlayerRow {
            id,
            username: username.to_string(),
            display_name: display_name.to_string(),
            bankroll: starting_bankroll,
        };
        inner
            .players
            .insert(id, (row.clone(), password_hash.to_string()));
        Ok(row)
    }

    async fn player_with_hash(
        &self,
        username: &str,
    ) -> Result<Option<(PlayerRow, String)>, GameError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner
            .players
            .values()
            .find(|(p, _)| p.username == username)
            .cloned())
    }

    async fn player_by_id(&self, player_id: PlayerId) -> Result<Option<PlayerRow>, GameError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner.players.get(&player_id).map(|(p, _)| p.clone()))
    }

    async fn debit_bankroll(
        &self,
        player_id: PlayerId,
        amount: Chips,
    ) -> Result<Chips, GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        let (player, _) = inner
            .players
            .get_mut(&player_id)
            .ok_or_else(|| GameError::NotFound("player".into()))?;
        if player.bankroll < amount {
            return Err(GameError::InsufficientFunds);
        }
        player.bankroll -= amount;
        Ok(player.bankroll)
    }

    async fn credit_bankroll(
        &self,
        player_id: PlayerId,
        amount: Chips,
    ) -> Result<Chips, GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        let (player, _) = inner
            .players
            .get_mut(&player_id)
            .ok_or_else(|| GameError::NotFound("player".into()))?;
        player.bankroll += amount;
        Ok(player.bankroll)
    }

    async fn insert_table(&self, config: &TableConfig) -> Result<TableId, GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        let id = inner.next_table_id;
        inner.next_table_id += 1;
        inner.tables.insert(id, config.clone());
        Ok(id)
    }

    async fn delete_table(&self, table_id: TableId) -> Result<(), GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        inner.tables.remove(&table_id);
        Ok(())
    }

    async fn list_tables(&self) -> Result<Vec<TableRow>, GameError> {
        let inner = self.inner.lock().expect("store lock");
        let mut rows: Vec<TableRow> = inner
            .tables
            .iter()
            .map(|(id, config)| TableRow {
                id: *id,
                config: config.clone(),
            })
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn insert_hand_record(
        &self,
        table_id: TableId,
        record: &HandRecord,
    ) -> Result<(), GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        let records = inner.hand_records.entry(table_id).or_default();
        if records
            .iter()
            .any(|r| r.hand_number == record.hand_number)
        {
            return Ok(());
        }
        records.push(record.clone());
        Ok(())
    }

    async fn hand_records(&self, table_id: TableId) -> Result<Vec<HandRecord>, GameError> {
        let inner = self.inner.lock().expect("store lock");
        let mut records = inner
            .hand_records
            .get(&table_id)
            .cloned()
            .unwrap_or_default();
        records.sort_by(|a, b| b.hand_number.cmp(&a.hand_number));
        Ok(records)
    }

    async fn complete_game(
        &self,
        table_id: TableId,
        summary: &GameSummary,
        payouts: &[(PlayerId, Chips)],
    ) -> Result<(), GameError> {
        let mut inner = self.inner.lock().expect("store lock");
        if inner.summaries.contains_key(&table_id) {
            return Ok(());
        }
        inner.summaries.insert(table_id, summary.clone());
        for (player_id, amount) in payouts {
            if let Some((player, _)) = inner.players.get_mut(player_id) {
                player.bankroll += *amount;
            }
        }
        Ok(())
    }

    async fn game_summary(&self, table_id: TableId) -> Result<Option<GameSummary>, GameError> {
        let inner = self.inner.lock().expect("store lock");
        Ok(inner.summaries.get(&table_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn bankroll_debits_cannot_overdraw() {
        let store = MemoryStore::new();
        let player = store
            .create_player("alice", "hash", "Alice", dec!(100))
            .await
            .unwrap();
        assert_eq!(
            store.debit_bankroll(player.id, dec!(60)).await.unwrap(),
            dec!(40)
        );
        assert_eq!(
            store.debit_bankroll(player.id, dec!(60)).await.unwrap_err(),
            GameError::InsufficientFunds
        );
        assert_eq!(
            store.credit_bankroll(player.id, dec!(10)).await.unwrap(),
            dec!(50)
        );
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryStore::new();
        store
            .create_player("alice", "h1", "Alice", dec!(100))
            .await
            .unwrap();
        assert!(store
            .create_player("alice", "h2", "Alice2", dec!(100))
            .await
            .is_err());
    }
}
