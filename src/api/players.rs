//! `/players` routes: profiles plus each player's coin ledger.

use super::{extract::ApiJson, AppState};
use crate::error::{AppError, Result};
use crate::models::{AmountRequest, Player, PlayerId, PlayerPatch};
use crate::services::{ledger, players};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

fn player_id(raw: &str) -> Result<PlayerId> {
    PlayerId::parse(raw).ok_or_else(|| AppError::Validation("Player id must not be empty".to_string()))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(player): ApiJson<Player>,
) -> Result<Response> {
    let player = players::create(state.store.as_ref(), player).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"message": "Player created successfully", "player": player})),
    )
        .into_response())
}

pub async fn find_by_username(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<Player>> {
    let username = query
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Query parameter 'username' is required".to_string()))?;
    Ok(Json(
        players::get_by_username(state.store.as_ref(), &username).await?,
    ))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Player>> {
    let id = player_id(&id)?;
    Ok(Json(players::get_by_id(state.store.as_ref(), &id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<PlayerPatch>,
) -> Result<Response> {
    let id = player_id(&id)?;
    let player = players::update(state.store.as_ref(), &id, &patch).await?;
    Ok(Json(json!({"message": "Player updated successfully", "player": player})).into_response())
}

pub async fn earn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AmountRequest>,
) -> Result<Response> {
    let id = player_id(&id)?;
    let transaction = ledger::earn(state.store.as_ref(), &id, request.amount).await?;
    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

pub async fn spend(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AmountRequest>,
) -> Result<Response> {
    let id = player_id(&id)?;
    let transaction = ledger::spend(state.store.as_ref(), &id, request.amount).await?;
    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

pub async fn transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = player_id(&id)?;
    let history = ledger::history(state.store.as_ref(), &id).await?;
    Ok(Json(history).into_response())
}

pub async fn balance(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let id = player_id(&id)?;
    let balance = ledger::balance(state.store.as_ref(), &id).await?;
    Ok(Json(json!({"player_id": id, "balance": balance})).into_response())
}
