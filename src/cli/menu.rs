//! Interactive menu shown when the binary is started without a subcommand.

use super::commands::{App, Commands, LedgerArgs, PlayerArgs, SeedArgs};
use crate::error::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuChoice {
    InitDb,
    Earn,
    Spend,
    Balance,
    History,
    BestScores,
    Seed,
    LedgerDemo,
    Exit,
}

impl MenuChoice {
    const ALL: [MenuChoice; 9] = [
        MenuChoice::InitDb,
        MenuChoice::Earn,
        MenuChoice::Spend,
        MenuChoice::Balance,
        MenuChoice::History,
        MenuChoice::BestScores,
        MenuChoice::Seed,
        MenuChoice::LedgerDemo,
        MenuChoice::Exit,
    ];

    fn label(self) -> &'static str {
        match self {
            MenuChoice::InitDb => "Initialize Database Schema",
            MenuChoice::Earn => "Earn Coins",
            MenuChoice::Spend => "Spend Coins",
            MenuChoice::Balance => "Show Balance",
            MenuChoice::History => "Show Transaction History",
            MenuChoice::BestScores => "Show Best Scores",
            MenuChoice::Seed => "Seed Demo Snapshots",
            MenuChoice::LedgerDemo => "Run Ledger Walkthrough",
            MenuChoice::Exit => "Exit",
        }
    }

    /// Turns a menu choice into a command, prompting for whatever it needs.
    /// `None` means exit.
    fn into_command(self) -> Result<Option<Commands>> {
        let command = match self {
            MenuChoice::InitDb => Commands::InitDb,
            MenuChoice::Earn => Commands::Earn(LedgerArgs {
                player: prompt_player()?,
                amount: prompt_amount()?,
            }),
            MenuChoice::Spend => Commands::Spend(LedgerArgs {
                player: prompt_player()?,
                amount: prompt_amount()?,
            }),
            MenuChoice::Balance => Commands::Balance(PlayerArgs {
                player: prompt_player()?,
            }),
            MenuChoice::History => Commands::History(PlayerArgs {
                player: prompt_player()?,
            }),
            MenuChoice::BestScores => Commands::BestScores,
            MenuChoice::Seed => Commands::Seed(SeedArgs {
                players: 5,
                snapshots: 10,
            }),
            MenuChoice::LedgerDemo => Commands::LedgerDemo,
            MenuChoice::Exit => return Ok(None),
        };
        Ok(Some(command))
    }
}

pub fn prompt_player() -> Result<String> {
    let player: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Player id")
        .validate_with(|input: &String| -> std::result::Result<(), &str> {
            if input.trim().is_empty() {
                Err("Player id must not be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;
    Ok(player.trim().to_string())
}

pub fn prompt_amount() -> Result<i64> {
    let amount: i64 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Amount of coins")
        .validate_with(|input: &i64| -> std::result::Result<(), &str> {
            if *input > 0 {
                Ok(())
            } else {
                Err("Amount must be positive")
            }
        })
        .interact_text()?;
    Ok(amount)
}

/// Main interactive loop
pub async fn run_interactive(app: &App) -> Result<()> {
    println!("{}", "Welcome to the Player Store CLI!".cyan().bold());

    let labels: Vec<&str> = MenuChoice::ALL.iter().map(|c| c.label()).collect();
    loop {
        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact_opt()? // None on Esc / Ctrl+C
            .unwrap_or(labels.len() - 1);

        println!("\n---\n");

        let command = match MenuChoice::ALL[selection].into_command() {
            Ok(Some(command)) => command,
            Ok(None) => {
                println!("{}", "Exiting application. Goodbye!".green());
                break;
            },
            Err(e) => {
                println!("{} {}", "Failed to get input:".red(), e);
                continue;
            },
        };

        if let Err(e) = app.run_command(command).await {
            error!("Command execution failed: {:?}", e);
            println!(
                "{} {}",
                "Error executing command:".red(),
                e.to_string().red()
            );
        }

        println!("\n---\n");
    }

    Ok(())
}
