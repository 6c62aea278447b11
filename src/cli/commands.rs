use crate::api;
use crate::config::Settings;
use crate::db::{Database, DynStore, MemoryStore, Store};
use crate::error::{AppError, Result};
use crate::models::{BestScores, PlayerId, Transaction};
use crate::services::{ledger, scores};
use clap::{Args, Parser, Subcommand};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Player used by the ledger walkthrough.
pub const DEMO_PLAYER: &str = "1001";

/// CLI for the player data service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Without a command, an interactive menu is shown
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Initialize the database schema
    InitDb,

    /// Credit coins to a player
    Earn(LedgerArgs),

    /// Debit coins from a player
    Spend(LedgerArgs),

    /// Show a player's coin balance
    Balance(PlayerArgs),

    /// Show a player's transactions, newest first
    History(PlayerArgs),

    /// Show every player's best coin score
    BestScores,

    /// Fill the store with random snapshots for demo players
    Seed(SeedArgs),

    /// Reset the store and replay the earn/earn/spend walkthrough for player 1001
    LedgerDemo,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    /// Address to bind (overrides PLAYER_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides PLAYER_STORE_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Keep all data in memory instead of PostgreSQL
    #[arg(long)]
    pub in_memory: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct LedgerArgs {
    /// Player id
    #[arg(short, long)]
    pub player: String,

    /// Number of coins (positive)
    #[arg(short, long)]
    pub amount: i64,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PlayerArgs {
    /// Player id
    #[arg(short, long)]
    pub player: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct SeedArgs {
    /// Number of demo players (default: 5)
    #[arg(long, default_value = "5")]
    pub players: u32,

    /// Snapshots per player (default: 10)
    #[arg(long, default_value = "10")]
    pub snapshots: u32,
}

/// CLI application
pub struct App {
    settings: Settings,
    store: DynStore,
    database: Option<Arc<Database>>,
}

impl App {
    /// Connects to PostgreSQL using `settings`.
    pub async fn connect(settings: Settings) -> Result<Self> {
        let database = Arc::new(Database::new(&settings.database_url, settings.max_connections).await?);
        let store: DynStore = database.clone();
        Ok(Self {
            settings,
            store,
            database: Some(database),
        })
    }

    /// Runs against a fresh in-memory store.
    pub fn in_memory(settings: Settings) -> Self {
        Self::with_store(settings, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(settings: Settings, store: DynStore) -> Self {
        Self {
            settings,
            store,
            database: None,
        }
    }

    /// Picks the backing store the command needs: memory for `serve --in-memory`,
    /// PostgreSQL for everything else.
    pub async fn for_command(settings: Settings, command: Option<&Commands>) -> Result<Self> {
        match command {
            Some(Commands::Serve(args)) if args.in_memory => {
                info!("Using in-memory store; data will not survive a restart");
                Ok(Self::in_memory(settings))
            },
            _ => Self::connect(settings).await,
        }
    }

    async fn ensure_schema(&self) -> Result<()> {
        if let Some(db) = &self.database {
            if !db.is_schema_initialized().await? {
                db.init_schema().await?;
            }
        }
        Ok(())
    }

    /// Run one CLI command
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Serve(args) => self.serve(args).await?,
            Commands::InitDb => {
                let db = self.database.as_ref().ok_or_else(|| {
                    AppError::Cli("init-db requires a PostgreSQL connection".to_string())
                })?;
                db.init_schema().await?;
                println!("{}", "Database schema initialized.".green());
            },
            Commands::Earn(args) => {
                let tx = self.earn(&args.player, args.amount).await?;
                print_transaction(&args.player, &tx);
            },
            Commands::Spend(args) => {
                let tx = self.spend(&args.player, args.amount).await?;
                print_transaction(&args.player, &tx);
            },
            Commands::Balance(args) => {
                let balance = self.balance(&args.player).await?;
                println!("Balance for {}: {}", args.player.bold(), balance);
            },
            Commands::History(args) => {
                let history = self.history(&args.player).await?;
                if history.is_empty() {
                    println!("No transactions for {}", args.player);
                } else {
                    println!("{}", history_table(&history));
                }
            },
            Commands::BestScores => {
                self.ensure_schema().await?;
                match scores::leaderboard(self.store.as_ref()).await? {
                    scores::Leaderboard::Empty => {
                        println!("{}", "No player snapshots recorded yet.".yellow())
                    },
                    scores::Leaderboard::Scores(best) => println!("{}", scores_table(&best)),
                }
            },
            Commands::Seed(args) => self.seed(&args).await?,
            Commands::LedgerDemo => self.ledger_demo().await?,
        }

        Ok(())
    }

    async fn serve(&self, args: ServeArgs) -> Result<()> {
        self.ensure_schema().await?;
        let settings = self.settings.clone().with_overrides(args.host, args.port);
        let addr = settings.bind_addr()?;
        api::serve(addr, self.store.clone()).await
    }

    pub async fn balance(&self, player: &str) -> Result<i64> {
        self.ensure_schema().await?;
        ledger::balance(self.store.as_ref(), &parse_player(player)?).await
    }

    pub async fn history(&self, player: &str) -> Result<Vec<Transaction>> {
        self.ensure_schema().await?;
        ledger::history(self.store.as_ref(), &parse_player(player)?).await
    }

    pub async fn earn(&self, player: &str, amount: i64) -> Result<Transaction> {
        self.ensure_schema().await?;
        ledger::earn(self.store.as_ref(), &parse_player(player)?, amount).await
    }

    pub async fn spend(&self, player: &str, amount: i64) -> Result<Transaction> {
        self.ensure_schema().await?;
        ledger::spend(self.store.as_ref(), &parse_player(player)?, amount).await
    }

    /// Generates `players x snapshots` random snapshots.
    async fn seed(&self, args: &SeedArgs) -> Result<()> {
        if args.players == 0 || args.snapshots == 0 {
            return Err(AppError::Cli(
                "Both --players and --snapshots must be at least 1".to_string(),
            ));
        }
        self.ensure_schema().await?;

        let total = u64::from(args.players) * u64::from(args.snapshots);
        let progress = ProgressBar::new(total);
        progress.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} snapshots")?
                .progress_chars("=> "),
        );

        for n in 1..=args.players {
            let player_id = format!("demo-{:03}", n);
            for _ in 0..args.snapshots {
                let snapshot = random_snapshot(&player_id, &mut rand::thread_rng());
                scores::record_snapshot(self.store.as_ref(), snapshot).await?;
                progress.inc(1);
            }
        }
        progress.finish_and_clear();

        info!("Seeded {} snapshots for {} players", total, args.players);
        println!(
            "{}",
            format!("Seeded {} snapshots for {} players.", total, args.players).green()
        );
        Ok(())
    }

    /// Clears the store, then earns 100, earns 200 and spends 50 for the demo player.
    pub async fn ledger_demo(&self) -> Result<()> {
        self.ensure_schema().await?;
        self.store.clear().await?;

        self.earn(DEMO_PLAYER, 100).await?;
        self.earn(DEMO_PLAYER, 200).await?;
        self.spend(DEMO_PLAYER, 50).await?;

        println!("Balance for {}: {}", DEMO_PLAYER, self.balance(DEMO_PLAYER).await?);
        println!("{}", history_table(&self.history(DEMO_PLAYER).await?));
        Ok(())
    }
}

fn parse_player(raw: &str) -> Result<PlayerId> {
    PlayerId::parse(raw).ok_or_else(|| AppError::Cli("Player id must not be empty".to_string()))
}

fn random_snapshot(player_id: &str, rng: &mut impl Rng) -> serde_json::Value {
    json!({
        "player_id": player_id,
        "coins": rng.gen_range(0..=5_000),
        "level": rng.gen_range(1..=60),
        "health": rng.gen_range(0..=100),
    })
}

fn print_transaction(player: &str, tx: &Transaction) {
    let amount = if tx.transaction_amount >= 0 {
        format!("+{}", tx.transaction_amount).green()
    } else {
        tx.transaction_amount.to_string().red()
    };
    println!("[{}] {} {}", tx.timestamp, player.bold(), amount);
}

pub fn history_table(history: &[Transaction]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Timestamp", "Amount"]);
    for tx in history {
        table.add_row(vec![
            Cell::new(&tx.timestamp),
            Cell::new(tx.transaction_amount),
        ]);
    }
    table
}

pub fn scores_table(best: &BestScores) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Player", "Best coins"]);
    for (player, coins) in best {
        table.add_row(vec![Cell::new(player), Cell::new(coins)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn app() -> App {
        App::in_memory(Settings::default())
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["player-store", "earn", "--player", "7", "--amount", "30"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Earn(LedgerArgs {
                player: "7".to_string(),
                amount: 30,
            }))
        );

        let cli = Cli::try_parse_from(["player-store", "serve", "--in-memory", "-p", "8080"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert!(args.in_memory);
                assert_eq!(args.port, Some(8080));
                assert!(args.host.is_none());
            },
            other => panic!("Expected serve, got {:?}", other),
        }

        let cli = Cli::try_parse_from(["player-store"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[tokio::test]
    async fn test_ledger_demo_leaves_expected_balance() {
        let app = app();
        app.earn("someone-else", 5).await.unwrap();

        app.run_command(Commands::LedgerDemo).await.unwrap();

        assert_eq!(app.balance(DEMO_PLAYER).await.unwrap(), 250);
        assert_eq!(app.history(DEMO_PLAYER).await.unwrap().len(), 3);
        // The store was cleared first
        assert_eq!(app.balance("someone-else").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_earn_and_spend_commands() {
        let app = app();
        app.run_command(Commands::Earn(LedgerArgs {
            player: "p1".to_string(),
            amount: 40,
        }))
        .await
        .unwrap();
        app.run_command(Commands::Spend(LedgerArgs {
            player: "p1".to_string(),
            amount: 15,
        }))
        .await
        .unwrap();
        assert_eq!(app.balance("p1").await.unwrap(), 25);

        let result = app
            .run_command(Commands::Balance(PlayerArgs {
                player: "  ".to_string(),
            }))
            .await;
        match result {
            Err(AppError::Cli(msg)) => assert!(msg.contains("must not be empty")),
            other => panic!("Expected CliError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_init_db_needs_postgres() {
        let result = app().run_command(Commands::InitDb).await;
        assert!(matches!(result, Err(AppError::Cli(_))));
    }

    #[tokio::test]
    async fn test_seed_populates_leaderboard() {
        let app = app();
        app.run_command(Commands::Seed(SeedArgs {
            players: 3,
            snapshots: 4,
        }))
        .await
        .unwrap();

        match scores::leaderboard(app.store.as_ref()).await.unwrap() {
            scores::Leaderboard::Scores(best) => {
                assert_eq!(best.len(), 3);
                assert!(best.contains_key("demo-001"));
            },
            scores::Leaderboard::Empty => panic!("Seed should have recorded snapshots"),
        }

        let result = app
            .run_command(Commands::Seed(SeedArgs {
                players: 0,
                snapshots: 1,
            }))
            .await;
        assert!(matches!(result, Err(AppError::Cli(_))));
    }

    #[test]
    fn test_random_snapshot_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let snapshot = random_snapshot("demo-001", &mut rng);
        assert_eq!(snapshot["player_id"], "demo-001");
        let coins = snapshot["coins"].as_i64().unwrap();
        assert!((0..=5_000).contains(&coins));
    }

    #[test]
    fn test_tables_render_rows() {
        let history = vec![
            Transaction {
                timestamp: "02/01/2025 - 10:00:00".to_string(),
                transaction_amount: -50,
            },
            Transaction {
                timestamp: "01/01/2025 - 09:00:00".to_string(),
                transaction_amount: 100,
            },
        ];
        let rendered = history_table(&history).to_string();
        assert!(rendered.contains("-50"));
        assert!(rendered.contains("01/01/2025 - 09:00:00"));

        let mut best = BestScores::new();
        best.insert("1001".to_string(), serde_json::Number::from(120));
        let rendered = scores_table(&best).to_string();
        assert!(rendered.contains("1001"));
        assert!(rendered.contains("120"));
    }

    #[tokio::test]
    async fn test_with_store_shares_data() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let app = App::with_store(Settings::default(), store.clone());
        app.earn("9", 10).await.unwrap();
        let id = PlayerId::parse("9").unwrap();
        assert_eq!(store.transactions(&id).await.unwrap().len(), 1);
    }

    #[cfg(feature = "integration-tests")]
    #[sqlx::test]
    async fn test_reads_on_fresh_database_create_schema(pool: sqlx::PgPool) -> Result<()> {
        let database = Arc::new(Database::from_pool(pool));
        assert!(!database.is_schema_initialized().await?);

        let app = App {
            settings: Settings::default(),
            store: database.clone(),
            database: Some(database.clone()),
        };
        assert_eq!(app.balance("1").await?, 0);
        assert!(app.history("1").await?.is_empty());
        assert!(database.is_schema_initialized().await?);
        Ok(())
    }
}
