//! Player progress snapshots and the best-score leaderboard derived from them.
//!
//! Game clients post free-form JSON snapshots of a player's state. Each snapshot must
//! name its `player_id`; the server stamps it with the time of receipt and appends it
//! to that player's history. The leaderboard is the highest `coins` value ever seen
//! per player.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{BestScores, PlayerId};
use chrono::Local;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Label under which a player's snapshot history is known to clients.
pub const SNAPSHOT_KEY_PREFIX: &str = "PlayerData:";

/// Field holding the score in a snapshot.
pub const SCORE_FIELD: &str = "coins";

/// A snapshot as it was accepted and stored.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedSnapshot {
    pub player_id: PlayerId,
    pub key: String,
    pub data: Value,
}

pub fn snapshot_key(player_id: &PlayerId) -> String {
    format!("{}{}", SNAPSHOT_KEY_PREFIX, player_id)
}

/// Reads the `player_id` field of a snapshot.
pub fn extract_player_id(data: &Value) -> Result<PlayerId> {
    data.get("player_id")
        .and_then(PlayerId::from_json)
        .ok_or_else(|| {
            AppError::Validation(
                "Missing 'player_id' in JSON data. Cannot store player data.".to_string(),
            )
        })
}

/// Validates, timestamps and appends a snapshot.
pub async fn record_snapshot(store: &dyn Store, mut data: Value) -> Result<RecordedSnapshot> {
    let player_id = extract_player_id(&data)?;
    let Some(fields) = data.as_object_mut() else {
        return Err(AppError::Validation(
            "Snapshot must be a JSON object".to_string(),
        ));
    };
    fields.insert(
        "timestamp".to_string(),
        Value::String(Local::now().to_rfc3339()),
    );

    store.push_snapshot(&player_id, &data).await?;
    let key = snapshot_key(&player_id);
    info!("Data for {} stored under '{}'", player_id, key);

    Ok(RecordedSnapshot {
        player_id,
        key,
        data,
    })
}

/// Highest numeric `coins` value across one player's snapshots.
///
/// Snapshots without a numeric `coins` field are ignored. Returns `None` when no
/// score above -1 exists.
fn best_coins(player_id: &str, snapshots: &[Value]) -> Option<Number> {
    let mut best: Option<(f64, &Number)> = None;
    for snapshot in snapshots {
        if !snapshot.is_object() {
            warn!("Skipping non-object snapshot for player {}", player_id);
            continue;
        }
        let Some(Value::Number(coins)) = snapshot.get(SCORE_FIELD) else {
            continue;
        };
        let Some(as_float) = coins.as_f64() else {
            continue;
        };
        if best.map_or(true, |(current, _)| as_float > current) {
            best = Some((as_float, coins));
        }
    }

    best.filter(|(value, _)| *value > -1.0)
        .map(|(_, number)| number.clone())
}

/// Computes the leaderboard. Players are processed in parallel.
pub fn best_scores(snapshots: &BTreeMap<String, Vec<Value>>) -> BestScores {
    snapshots
        .par_iter()
        .filter_map(|(player_id, history)| {
            if history.is_empty() {
                debug!("No snapshots for player {}", player_id);
                return None;
            }
            best_coins(player_id, history).map(|coins| (player_id.clone(), coins))
        })
        .collect()
}

/// Outcome of a leaderboard query.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaderboard {
    /// No snapshot has ever been recorded.
    Empty,
    Scores(BestScores),
}

pub async fn leaderboard(store: &dyn Store) -> Result<Leaderboard> {
    let snapshots = store.all_snapshots().await?;
    if snapshots.is_empty() {
        return Ok(Leaderboard::Empty);
    }
    debug!("Computing best scores for {} players", snapshots.len());
    Ok(Leaderboard::Scores(best_scores(&snapshots)))
}
