//! Data structures shared by the HTTP API, the CLI and the stores.
//!
//! Field names on the wire follow the game client's conventions (`player_id`,
//! `transaction_amount`, `Gold_trophies`, ...), so several structs carry explicit
//! serde renames.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a player.
///
/// Clients send ids either as strings or as integers; both end up as the same
/// textual id. Empty strings, `0`, `false` and `null` count as "no id".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    /// Builds an id from user input, trimming whitespace. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Extracts an id from an arbitrary JSON value.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<Value> for PlayerId {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(&value).ok_or_else(|| format!("invalid player id: {}", value))
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

/// A single key/value pair from the generic data store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    pub key: String,
    pub value: String,
}

/// Body of `POST /data` and `PUT /data/:key`. Keys and values may be any JSON
/// scalar; both are stored as text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataRequest {
    #[serde(default)]
    pub key: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Highest recorded `coins` per player.
pub type BestScores = BTreeMap<String, Number>;

/// One entry in a player's coin ledger. Positive amounts are earnings, negative are spendings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Local time formatted as `dd/mm/YYYY - HH:MM:SS`.
    pub timestamp: String,
    pub transaction_amount: i64,
}

/// Body of the earn/spend endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AmountRequest {
    pub amount: i64,
}

/// Trophy counts. Serialized flat next to the player's other fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trophies {
    #[serde(rename = "Gold_trophies")]
    pub gold: u32,
    #[serde(rename = "Silver_trophies")]
    pub silver: u32,
    #[serde(rename = "Bronze_trophies")]
    pub bronze: u32,
}

impl Trophies {
    pub fn total(&self) -> u64 {
        u64::from(self.gold) + u64::from(self.silver) + u64::from(self.bronze)
    }
}

/// A player profile. Also the body of `POST /players`, where every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub email: String,
    pub age: u32,
    #[serde(flatten)]
    pub trophies: Trophies,
}

/// Partial update for a player. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlayerPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub age: Option<u32>,
    #[serde(rename = "Gold_trophies")]
    pub gold: Option<u32>,
    #[serde(rename = "Silver_trophies")]
    pub silver: Option<u32>,
    #[serde(rename = "Bronze_trophies")]
    pub bronze: Option<u32>,
}

impl PlayerPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `player` with every field present in the patch overwritten.
    pub fn apply(&self, mut player: Player) -> Player {
        if let Some(username) = &self.username {
            player.username = username.clone();
        }
        if let Some(email) = &self.email {
            player.email = email.clone();
        }
        if let Some(age) = self.age {
            player.age = age;
        }
        if let Some(gold) = self.gold {
            player.trophies.gold = gold;
        }
        if let Some(silver) = self.silver {
            player.trophies.silver = silver;
        }
        if let Some(bronze) = self.bronze {
            player.trophies.bronze = bronze;
        }
        player
    }
}
