//! In-process [`Store`] used by `serve --in-memory` and by the test suite.
//!
//! Data lives only as long as the process. Semantics match the PostgreSQL store:
//! snapshots keep insertion order, ledger entries come back newest first.

use super::Store;
use crate::error::Result;
use crate::models::{Player, PlayerId, Transaction};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct MemoryState {
    values: BTreeMap<String, String>,
    snapshots: BTreeMap<String, Vec<Value>>,
    transactions: HashMap<String, VecDeque<Transaction>>,
    players: BTreeMap<PlayerId, Player>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        debug!("Creating in-memory store");
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        self.state
            .write()
            .await
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().await.values.get(key).cloned())
    }

    async fn all_values(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.state.read().await.values.clone())
    }

    async fn delete_value(&self, key: &str) -> Result<bool> {
        Ok(self.state.write().await.values.remove(key).is_some())
    }

    async fn push_snapshot(&self, player_id: &PlayerId, snapshot: &Value) -> Result<()> {
        self.state
            .write()
            .await
            .snapshots
            .entry(player_id.to_string())
            .or_default()
            .push(snapshot.clone());
        Ok(())
    }

    async fn all_snapshots(&self) -> Result<BTreeMap<String, Vec<Value>>> {
        Ok(self.state.read().await.snapshots.clone())
    }

    async fn push_transaction(
        &self,
        player_id: &PlayerId,
        transaction: &Transaction,
    ) -> Result<()> {
        self.state
            .write()
            .await
            .transactions
            .entry(player_id.to_string())
            .or_default()
            .push_front(transaction.clone());
        Ok(())
    }

    async fn transactions(&self, player_id: &PlayerId) -> Result<Vec<Transaction>> {
        Ok(self
            .state
            .read()
            .await
            .transactions
            .get(player_id.as_str())
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_player_if_absent(&self, player: &Player) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.players.contains_key(&player.id) {
            return Ok(false);
        }
        state.players.insert(player.id.clone(), player.clone());
        Ok(true)
    }

    async fn player_by_id(&self, id: &PlayerId) -> Result<Option<Player>> {
        Ok(self.state.read().await.players.get(id).cloned())
    }

    async fn player_by_username(&self, username: &str) -> Result<Option<Player>> {
        Ok(self
            .state
            .read()
            .await
            .players
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        self.state
            .write()
            .await
            .players
            .insert(player.id.clone(), player.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.state.write().await = MemoryState::default();
        Ok(())
    }
}
