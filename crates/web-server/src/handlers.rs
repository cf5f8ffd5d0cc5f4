use crate::{error::AppError, AppState};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use registry::{Registry, RegistryError};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenParams {
    fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }
}

/// Runs a registry call on the blocking pool; storage is synchronous file I/O.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, AppError>
where
    F: FnOnce(&Registry) -> Result<T, RegistryError> + Send + 'static,
    T: Send + 'static,
{
    let registry = state.registry.clone();
    let outcome = tokio::task::spawn_blocking(move || call(&registry))
        .await
        .map_err(|e| RegistryError::Server(format!("registry task failed: {e}")))?;
    Ok(outcome?)
}

/// # GET /api/resolve?token=
/// Exchanges a participant token for the participant record.
pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> Result<Json<Value>, AppError> {
    let user = blocking(&state, move |registry| registry.resolve(params.token())).await?;
    Ok(Json(json!({ "ok": true, "user": user })))
}

/// # POST /api/stats/sync
/// Body: `{ "token": "..." }`. An unreadable body is treated as a missing token.
pub async fn sync_stats(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TokenParams>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let params = body.map(|Json(params)| params).unwrap_or(TokenParams { token: None });

    // On this route an unknown participant is a 404, not an authentication failure.
    let stats = state
        .registry
        .sync_stats(params.token())
        .await
        .map_err(|err| match err {
            RegistryError::Auth(message) => AppError::NotFound(message),
            other => AppError::Registry(other),
        })?;
    Ok(Json(json!({ "ok": true, "stats": stats })))
}

/// # GET /api/leaderboard
pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let participants = blocking(&state, |registry| Ok(registry.leaderboard())).await?;
    Ok(Json(json!({ "ok": true, "participants": participants })))
}

/// # GET /api/participant?token=
/// The participant plus its most recent snapshots, newest first.
pub async fn participant(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TokenParams>,
) -> Result<Json<Value>, AppError> {
    let details =
        blocking(&state, move |registry| registry.participant_details(params.token())).await?;
    Ok(Json(json!({
        "ok": true,
        "participant": details.participant,
        "snapshots": details.snapshots,
    })))
}
