//! Defines the data structures and models used throughout the application.
//!
//! This includes player profiles, ledger transactions, key/value entries and the
//! request bodies accepted by the HTTP API.

mod player;

pub use player::*;
