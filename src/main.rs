use anyhow::Context;
use clap::Parser;
use colored::*;
use player_store::cli::{self, App, Cli};
use player_store::logging::{self, LogOptions};
use player_store::Settings;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("Invalid configuration")?;

    // Guard must outlive every log call
    let _log_guard = logging::init(&LogOptions {
        json: cli.json_logs,
        log_dir: settings.log_dir.clone(),
    });

    info!("Starting player store v{}", env!("CARGO_PKG_VERSION"));

    let app = match App::for_command(settings, cli.command.as_ref()).await {
        Ok(app) => {
            info!("Application initialized successfully.");
            app
        },
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            println!(
                "{}",
                "Error: Failed to initialize application. Check logs.".red()
            );
            return Err(e).context("Could not initialize the store");
        },
    };

    match cli.command {
        Some(command) => app.run_command(command).await?,
        None => cli::run_interactive(&app).await?,
    }

    Ok(())
}
