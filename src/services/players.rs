//! Player profiles: create once, look up by id or username, patch in place.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{Player, PlayerId, PlayerPatch};
use tracing::{info, warn};

fn validate(player: &Player) -> Result<()> {
    if player.username.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".to_string()));
    }
    if !player.email.contains('@') {
        return Err(AppError::Validation(format!(
            "Invalid email address: '{}'",
            player.email
        )));
    }
    Ok(())
}

/// Stores a new player. Never overwrites an existing one.
pub async fn create(store: &dyn Store, player: Player) -> Result<Player> {
    validate(&player)?;
    if !store.insert_player_if_absent(&player).await? {
        warn!("Player '{}' already exists", player.id);
        return Err(AppError::Conflict(format!(
            "Player with id '{}' already exists.",
            player.id
        )));
    }
    info!(
        "Player '{}' created with trophies gold={} silver={} bronze={}",
        player.id, player.trophies.gold, player.trophies.silver, player.trophies.bronze
    );
    Ok(player)
}

pub async fn get_by_id(store: &dyn Store, id: &PlayerId) -> Result<Player> {
    store
        .player_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Player with id '{}' not found.", id)))
}

pub async fn get_by_username(store: &dyn Store, username: &str) -> Result<Player> {
    store.player_by_username(username).await?.ok_or_else(|| {
        warn!("Player '{}' not found", username);
        AppError::NotFound(format!("Player with username '{}' not found.", username))
    })
}

/// Merges `patch` into the stored player and writes the full record back.
pub async fn update(store: &dyn Store, id: &PlayerId, patch: &PlayerPatch) -> Result<Player> {
    if patch.is_empty() {
        return Err(AppError::Validation(
            "Request must contain at least one field to update".to_string(),
        ));
    }
    let current = store.player_by_id(id).await?.ok_or_else(|| {
        warn!("Attempted to update non-existent player '{}'", id);
        AppError::NotFound(format!("Player with id '{}' not found for update.", id))
    })?;

    let updated = patch.apply(current);
    validate(&updated)?;
    store.upsert_player(&updated).await?;
    info!("Player '{}' updated", id);
    Ok(updated)
}
