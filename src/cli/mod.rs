//! Command line front end: clap subcommands, the interactive menu used when no
//! subcommand is given, and the `App` both of them drive.

mod commands;
mod menu;

pub use commands::*;
pub use menu::{prompt_amount, prompt_player, run_interactive};
