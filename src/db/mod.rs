//! Persistence layer.
//!
//! Everything the services need from persistence is expressed by the [`Store`] trait.
//! Two implementations exist:
//! - `postgres`: the production store backed by PostgreSQL via `sqlx`.
//! - `memory`: an in-process store used for demos (`serve --in-memory`) and tests.

mod memory;
mod postgres;

pub use memory::*;
pub use postgres::*;

use crate::error::Result;
use crate::models::{Player, PlayerId, Transaction};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage operations required by the player services.
#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts or overwrites a value in the generic key/value area.
    async fn put_value(&self, key: &str, value: &str) -> Result<()>;

    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    /// Every key/value pair, ordered by key.
    async fn all_values(&self) -> Result<BTreeMap<String, String>>;

    /// Returns `true` if a value was removed.
    async fn delete_value(&self, key: &str) -> Result<bool>;

    /// Appends a snapshot to the end of the player's snapshot list.
    async fn push_snapshot(&self, player_id: &PlayerId, snapshot: &Value) -> Result<()>;

    /// All snapshots of all players, each list in insertion order.
    async fn all_snapshots(&self) -> Result<BTreeMap<String, Vec<Value>>>;

    /// Records a ledger entry. Entries are returned newest first.
    async fn push_transaction(&self, player_id: &PlayerId, transaction: &Transaction)
        -> Result<()>;

    async fn transactions(&self, player_id: &PlayerId) -> Result<Vec<Transaction>>;

    /// Inserts the player unless the id is taken. Returns `false` if it was.
    async fn insert_player_if_absent(&self, player: &Player) -> Result<bool>;

    async fn player_by_id(&self, id: &PlayerId) -> Result<Option<Player>>;

    async fn player_by_username(&self, username: &str) -> Result<Option<Player>>;

    /// Writes the full record, replacing any existing player with the same id.
    async fn upsert_player(&self, player: &Player) -> Result<()>;

    /// Removes all data from every area of the store.
    async fn clear(&self) -> Result<()>;
}

/// Shared handle to whichever store the process is running with.
pub type DynStore = Arc<dyn Store>;
