//! `/data` routes: the generic key/value store.

use super::{extract::ApiJson, AppState};
use crate::error::Result;
use crate::models::DataRequest;
use crate::services::kv;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    pub key: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<DataRequest>,
) -> Result<Response> {
    kv::store_value(state.store.as_ref(), &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Data stored successfully"})),
    )
        .into_response())
}

/// With `?key=` returns that entry, otherwise every pair.
pub async fn read(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<Response> {
    match query.key.filter(|k| !k.is_empty()) {
        Some(key) => {
            let entry = kv::fetch_value(state.store.as_ref(), &key).await?;
            Ok(Json(entry).into_response())
        },
        None => {
            let all = kv::list_values(state.store.as_ref()).await?;
            Ok(Json(all).into_response())
        },
    }
}

pub async fn update(
    State(state): State<AppState>,
    Path(key): Path<String>,
    ApiJson(request): ApiJson<DataRequest>,
) -> Result<Response> {
    kv::update_value(state.store.as_ref(), &key, &request).await?;
    Ok(Json(json!({"message": "Data updated successfully"})).into_response())
}

pub async fn delete(State(state): State<AppState>, Path(key): Path<String>) -> Result<Response> {
    kv::delete_value(state.store.as_ref(), &key).await?;
    Ok(Json(json!({"message": "Data deleted successfully"})).into_response())
}
