//! `/snapshots` routes: progress snapshots from game clients and the best-score board.

use super::AppState;
use crate::error::{AppError, Result};
use crate::services::scores::{self, Leaderboard};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// `application/json` or any `application/*+json` media type.
fn is_json(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

fn is_form(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .starts_with("application/x-www-form-urlencoded")
}

/// JSON bodies are stored as snapshots. Form and raw bodies are acknowledged and
/// echoed back without being stored.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if is_json(content_type) {
        let data: Value = serde_json::from_slice(&body)?;
        let recorded = scores::record_snapshot(state.store.as_ref(), data).await?;
        return Ok(Json(json!({
            "status": "success",
            "message": format!(
                "Data for player {} received and stored successfully!",
                recorded.player_id
            ),
            "received_data": recorded.data,
            "key": recorded.key,
        }))
        .into_response());
    }

    if is_form(content_type) {
        let fields: BTreeMap<String, String> =
            url::form_urlencoded::parse(&body).into_owned().collect();
        if !fields.is_empty() {
            info!("Received form data with {} fields", fields.len());
            return Ok(Json(json!({
                "status": "success",
                "message": "Form data received successfully!",
                "received_data": fields,
            }))
            .into_response());
        }
    } else if !body.is_empty() {
        let raw = String::from_utf8_lossy(&body).into_owned();
        debug!("Received {} bytes of raw data", raw.len());
        return Ok(Json(json!({
            "status": "success",
            "message": "Raw data received successfully!",
            "received_data": raw,
        }))
        .into_response());
    }

    Err(AppError::Validation(
        "Request must be JSON, form-encoded, or contain raw data.".to_string(),
    ))
}

pub async fn best(State(state): State<AppState>) -> Result<Response> {
    match scores::leaderboard(state.store.as_ref()).await? {
        Leaderboard::Empty => Ok(Json(json!({
            "status": "info",
            "message": "No player data snapshots found.",
            "best_scores": {},
        }))
        .into_response()),
        Leaderboard::Scores(best) => Ok(Json(best).into_response()),
    }
}
