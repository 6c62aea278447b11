//! Generic key/value data: store, fetch, list, update and delete.

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{DataRequest, KvEntry};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Whether a JSON value counts as "provided". Empty strings, zero, `false`,
/// `null` and empty containers do not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Text stored for a JSON value: strings verbatim, anything else as compact JSON.
fn value_text(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    Some(match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

pub async fn store_value(store: &dyn Store, request: &DataRequest) -> Result<KvEntry> {
    let key = request.key.as_ref().and_then(value_text);
    let value = request.value.as_ref().and_then(value_text);
    let (Some(key), Some(value)) = (key, value) else {
        return Err(AppError::Validation("Key and value are required".to_string()));
    };

    store.put_value(&key, &value).await?;
    info!("Stored data for key '{}'", key);
    Ok(KvEntry { key, value })
}

pub async fn fetch_value(store: &dyn Store, key: &str) -> Result<KvEntry> {
    match store.get_value(key).await? {
        Some(value) => Ok(KvEntry {
            key: key.to_string(),
            value,
        }),
        None => {
            debug!("No data for key '{}'", key);
            Err(AppError::NotFound("Data not found".to_string()))
        },
    }
}

pub async fn list_values(store: &dyn Store) -> Result<BTreeMap<String, String>> {
    store.all_values().await
}

/// Overwrites the value under `key`. Creates the key if it does not exist yet.
pub async fn update_value(store: &dyn Store, key: &str, request: &DataRequest) -> Result<KvEntry> {
    let value = request
        .value
        .as_ref()
        .and_then(value_text)
        .ok_or_else(|| AppError::Validation("Value is required".to_string()))?;

    store.put_value(key, &value).await?;
    info!("Updated data for key '{}'", key);
    Ok(KvEntry {
        key: key.to_string(),
        value,
    })
}

pub async fn delete_value(store: &dyn Store, key: &str) -> Result<()> {
    if store.delete_value(key).await? {
        info!("Deleted data for key '{}'", key);
        Ok(())
    } else {
        Err(AppError::NotFound("Data not found".to_string()))
    }
}
