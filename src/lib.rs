//! Player data service: a key/value store, player progress snapshots with best
//! scores, player profiles and per-player coin ledgers, served over HTTP and
//! driven from a CLI.

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use config::Settings;
pub use db::{Database, DynStore, MemoryStore, Store};
pub use error::{AppError, Result};
