//! Spawns table actors and routes callers to them.

use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::db::store::{GameStore, TableRow};
use crate::game::engine::HandEngine;
use crate::game::entities::TableId;
use crate::game::errors::GameError;

use super::actor::{TableActor, TableHandle};
use super::config::TableConfig;

pub struct TableManager {
    store: Arc<dyn GameStore>,
    clock: Arc<dyn Clock>,
    tables: RwLock<HashMap<TableId, TableHandle>>,
}

impl TableManager {
    pub fn new(store: Arc<dyn GameStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            tables: RwLock::new(HashMap::new()),
        }
    }

    /// Create the table row, spawn its actor, and return the new id.
    pub async fn create_table(&self, config: TableConfig) -> Result<TableId, GameError> {
        config.validate().map_err(GameError::InvalidAction)?;
        let table_id = self.store.insert_table(&config).await?;
        let engine = HandEngine::new(
            table_id,
            config.max_seats,
            config.small_blind,
            config.big_blind,
        );
        self.spawn(table_id, config, engine).await;
        Ok(table_id)
    }

    /// Spawn an actor for an existing table with a prepared engine. Lets
    /// tests pass a deterministic generator.
    pub async fn spawn(
        &self,
        table_id: TableId,
        config: TableConfig,
        engine: HandEngine,
    ) -> TableHandle {
        let (actor, handle) = TableActor::new(
            table_id,
            config,
            engine,
            self.store.clone(),
            self.clock.clone(),
        );
        tokio::spawn(actor.run());
        let mut tables = self.tables.write().await;
        tables.insert(table_id, handle.clone());
        info!("spawned table {table_id}");
        handle
    }

    pub async fn get(&self, table_id: TableId) -> Option<TableHandle> {
        let tables = self.tables.read().await;
        tables.get(&table_id).cloned()
    }

    pub async fn list(&self) -> Result<Vec<TableRow>, GameError> {
        self.store.list_tables().await
    }

    pub async fn active_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.len()
    }

    /// Stop the actor and delete the table. Called when the game summary has
    /// been produced, or by an operator tearing a table down.
    pub async fn remove_table(&self, table_id: TableId) -> Result<(), GameError> {
        let handle = {
            let mut tables = self.tables.write().await;
            tables.remove(&table_id)
        };
        if let Some(handle) = handle {
            handle.close().await;
        }
        self.store.delete_table(table_id).await?;
        info!("removed table {table_id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::db::memory::MemoryStore;

    fn manager() -> TableManager {
        TableManager::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
    }

    #[tokio::test]
    async fn create_then_get_then_remove() {
        let manager = manager();
        let id = manager.create_table(TableConfig::default()).await.unwrap();
        assert!(manager.get(id).await.is_some());
        assert_eq!(manager.active_count().await, 1);
        assert_eq!(manager.list().await.unwrap().len(), 1);

        manager.remove_table(id).await.unwrap();
        assert!(manager.get(id).await.is_none());
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let manager = manager();
        let config = TableConfig {
            max_seats: 1,
            ..TableConfig::default()
        };
        let err = manager.create_table(config).await.unwrap_err();
        assert_eq!(err.kind(), "InvalidAction");
        assert_eq!(manager.active_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_table_is_absent() {
        let manager = manager();
        assert!(manager.get(404).await.is_none());
    }
}
