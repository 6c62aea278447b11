//! Coin ledger: every earn and spend is an immutable transaction; the balance is their sum.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{PlayerId, Transaction};
use chrono::Local;
use tracing::info;

/// `dd/mm/YYYY - HH:MM:SS`, local time.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y - %H:%M:%S";

/// Label of a player's ledger, used in logs and CLI output.
pub fn ledger_key(player_id: &PlayerId) -> String {
    format!("player:{}:transactions", player_id)
}

fn record(amount: i64) -> Transaction {
    Transaction {
        timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        transaction_amount: amount,
    }
}

fn require_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(AppError::Validation(format!(
            "Amount must be a positive integer, got {}",
            amount
        )));
    }
    Ok(())
}

/// Sum of the amounts, or an error if it leaves the `i64` range.
fn total(player_id: &PlayerId, transactions: &[Transaction]) -> Result<i64> {
    transactions
        .iter()
        .try_fold(0i64, |sum, t| sum.checked_add(t.transaction_amount))
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "Balance of player {} is out of the supported range",
                player_id
            ))
        })
}

/// Appends a transaction of `delta` coins unless the resulting balance would
/// leave the `i64` range.
async fn append(store: &dyn Store, player_id: &PlayerId, delta: i64) -> Result<Transaction> {
    let current = total(player_id, &store.transactions(player_id).await?)?;
    if current.checked_add(delta).is_none() {
        return Err(AppError::Validation(format!(
            "Transaction of {} coins would put the balance of player {} out of range",
            delta, player_id
        )));
    }
    let transaction = record(delta);
    store.push_transaction(player_id, &transaction).await?;
    Ok(transaction)
}

/// Credits `amount` coins to the player.
pub async fn earn(store: &dyn Store, player_id: &PlayerId, amount: i64) -> Result<Transaction> {
    require_positive(amount)?;
    let transaction = append(store, player_id, amount).await?;
    info!("{} earned {} coins", ledger_key(player_id), amount);
    Ok(transaction)
}

/// Debits `amount` coins from the player. The balance is allowed to go negative.
pub async fn spend(store: &dyn Store, player_id: &PlayerId, amount: i64) -> Result<Transaction> {
    require_positive(amount)?;
    let transaction = append(store, player_id, -amount).await?;
    info!("{} spent {} coins", ledger_key(player_id), amount);
    Ok(transaction)
}

/// Every transaction of the player, newest first.
pub async fn history(store: &dyn Store, player_id: &PlayerId) -> Result<Vec<Transaction>> {
    store.transactions(player_id).await
}

pub async fn balance(store: &dyn Store, player_id: &PlayerId) -> Result<i64> {
    total(player_id, &store.transactions(player_id).await?)
}
