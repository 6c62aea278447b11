//! PostgreSQL-backed [`Store`] on four tables: `kv_entries`, `player_snapshots`,
//! `player_transactions` and `players`.
//!
//! The tests at the bottom need a live server and the `integration-tests` feature.

use super::Store;
use crate::error::{AppError, Result};
use crate::models::{Player, PlayerId, Transaction, Trophies};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, Pool, Postgres, Row};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Connection pool plus schema management.
pub struct Database {
    pool: Pool<Postgres>,
}

/// Row layout of the `players` table.
#[derive(Debug, FromRow)]
struct PlayerRow {
    id: String,
    username: String,
    email: String,
    age: i64,
    gold_trophies: i64,
    silver_trophies: i64,
    bronze_trophies: i64,
}

impl TryFrom<PlayerRow> for Player {
    type Error = AppError;

    fn try_from(row: PlayerRow) -> Result<Self> {
        let id = PlayerId::parse(&row.id).ok_or_else(|| {
            AppError::from(sqlx::Error::ColumnDecode {
                index: "id".to_string(),
                source: "blank player id".into(),
            })
        })?;
        Ok(Player {
            id,
            username: row.username,
            email: row.email,
            age: to_u32(row.age)?,
            trophies: Trophies {
                gold: to_u32(row.gold_trophies)?,
                silver: to_u32(row.silver_trophies)?,
                bronze: to_u32(row.bronze_trophies)?,
            },
        })
    }
}

fn to_u32(value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|e| AppError::from(sqlx::Error::Decode(Box::new(e))))
}

const PLAYER_COLUMNS: &str =
    "id, username, email, age, gold_trophies, silver_trophies, bronze_trophies";

impl Database {
    /// Opens a pool of at most `max_connections` connections to `database_url`.
    ///
    /// # Errors
    ///
    /// `AppError::Db` when the server cannot be reached or rejects the credentials.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                AppError::Db(e.into())
            })?;

        info!("Database pool ready ({} max connections)", max_connections);
        Ok(Self { pool })
    }

    /// Wraps an already configured pool.
    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Initializes the database schema: the four tables and their lookup indexes.
    ///
    /// Uses `CREATE TABLE IF NOT EXISTS` and `CREATE INDEX IF NOT EXISTS`, so it can be
    /// run on every start.
    /// All statements run in one transaction.
    pub async fn init_schema(&self) -> Result<()> {
        info!("Applying player store schema");

        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS player_snapshots (
                id BIGSERIAL PRIMARY KEY,
                player_id TEXT NOT NULL,
                payload JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"CREATE INDEX IF NOT EXISTS idx_player_snapshots_player ON player_snapshots(player_id)"#,
            r#"
            CREATE TABLE IF NOT EXISTS player_transactions (
                id BIGSERIAL PRIMARY KEY,
                player_id TEXT NOT NULL,
                amount BIGINT NOT NULL,
                timestamp TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"CREATE INDEX IF NOT EXISTS idx_player_transactions_player ON player_transactions(player_id)"#,
            r#"
            CREATE TABLE IF NOT EXISTS players (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                age BIGINT NOT NULL CHECK (age >= 0),
                gold_trophies BIGINT NOT NULL DEFAULT 0,
                silver_trophies BIGINT NOT NULL DEFAULT 0,
                bronze_trophies BIGINT NOT NULL DEFAULT 0
            )
            "#,
            r#"CREATE INDEX IF NOT EXISTS idx_players_username ON players(username)"#,
        ];

        let mut tx = self.pool.begin().await?;
        for statement in statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Failed to apply schema statement: {}", e);
                    AppError::Db(e.into())
                })?;
        }
        tx.commit().await?;

        info!("Schema ready");
        Ok(())
    }

    /// Checks whether the `players` table exists, i.e. `init_schema` has run at least once.
    pub async fn is_schema_initialized(&self) -> Result<bool> {
        debug!("Looking for the players table");
        let query = "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_schema = 'public' AND table_name = 'players')";
        let row = sqlx::query(query).fetch_one(&self.pool).await.map_err(|e| {
            error!("Failed to check schema existence: {}", e);
            AppError::Db(e.into())
        })?;
        let initialized = row.try_get::<bool, _>(0)?;
        debug!("Players table present: {}", initialized);
        Ok(initialized)
    }
}

#[async_trait]
impl Store for Database {
    async fn put_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        debug!("Stored value for key '{}'", key);
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn all_values(&self) -> Result<BTreeMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>("SELECT key, value FROM kv_entries")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn delete_value(&self, key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn push_snapshot(&self, player_id: &PlayerId, snapshot: &Value) -> Result<()> {
        sqlx::query("INSERT INTO player_snapshots (player_id, payload) VALUES ($1, $2)")
            .bind(player_id.as_str())
            .bind(Json(snapshot))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to store snapshot for player {}: {}", player_id, e);
                AppError::Db(e.into())
            })?;
        Ok(())
    }

    async fn all_snapshots(&self) -> Result<BTreeMap<String, Vec<Value>>> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            "SELECT player_id, payload FROM player_snapshots ORDER BY player_id, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for (player_id, Json(payload)) in rows {
            grouped.entry(player_id).or_default().push(payload);
        }
        debug!("Loaded snapshots for {} players", grouped.len());
        Ok(grouped)
    }

    async fn push_transaction(
        &self,
        player_id: &PlayerId,
        transaction: &Transaction,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO player_transactions (player_id, amount, timestamp) VALUES ($1, $2, $3)",
        )
        .bind(player_id.as_str())
        .bind(transaction.transaction_amount)
        .bind(&transaction.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn transactions(&self, player_id: &PlayerId) -> Result<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT timestamp, amount FROM player_transactions WHERE player_id = $1 ORDER BY id DESC",
        )
        .bind(player_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(timestamp, transaction_amount)| Transaction {
                timestamp,
                transaction_amount,
            })
            .collect())
    }

    async fn insert_player_if_absent(&self, player: &Player) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO players (id, username, email, age, gold_trophies, silver_trophies, bronze_trophies)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(player.id.as_str())
        .bind(&player.username)
        .bind(&player.email)
        .bind(i64::from(player.age))
        .bind(i64::from(player.trophies.gold))
        .bind(i64::from(player.trophies.silver))
        .bind(i64::from(player.trophies.bronze))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn player_by_id(&self, id: &PlayerId) -> Result<Option<Player>> {
        let query = format!("SELECT {} FROM players WHERE id = $1", PLAYER_COLUMNS);
        sqlx::query_as::<_, PlayerRow>(&query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(Player::try_from)
            .transpose()
    }

    async fn player_by_username(&self, username: &str) -> Result<Option<Player>> {
        let query = format!(
            "SELECT {} FROM players WHERE username = $1 ORDER BY id LIMIT 1",
            PLAYER_COLUMNS
        );
        sqlx::query_as::<_, PlayerRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .map(Player::try_from)
            .transpose()
    }

    async fn upsert_player(&self, player: &Player) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO players (id, username, email, age, gold_trophies, silver_trophies, bronze_trophies)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                age = EXCLUDED.age,
                gold_trophies = EXCLUDED.gold_trophies,
                silver_trophies = EXCLUDED.silver_trophies,
                bronze_trophies = EXCLUDED.bronze_trophies
            "#,
        )
        .bind(player.id.as_str())
        .bind(&player.username)
        .bind(&player.email)
        .bind(i64::from(player.age))
        .bind(i64::from(player.trophies.gold))
        .bind(i64::from(player.trophies.silver))
        .bind(i64::from(player.trophies.bronze))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        info!("Clearing all player data");
        sqlx::query("TRUNCATE kv_entries, player_snapshots, player_transactions, players")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
