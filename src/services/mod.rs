//! Business rules shared by the HTTP API and the CLI. Every function works against
//! any [`Store`](crate::db::Store).

pub mod kv;
pub mod ledger;
pub mod players;
pub mod scores;
