use crate::error::{require_token, RegistryError};
use api_client::StatsSource;
use chrono::{DateTime, Duration, Utc};
use core_types::Stats;
use database::ParticipantRepository;
use std::sync::Arc;

/// Refreshes a participant's inline stats from the external feed.
///
/// This is the only code path that advances `stats.updatedAt`. It never touches the
/// snapshot history.
#[derive(Clone)]
pub struct StatsSync {
    repo: ParticipantRepository,
    source: Arc<dyn StatsSource>,
}

impl StatsSync {
    pub fn new(repo: ParticipantRepository, source: Arc<dyn StatsSource>) -> Self {
        Self { repo, source }
    }

    /// Fetches once (no retry), replaces `participant.stats` wholesale, and persists.
    pub async fn sync(&self, token: &str) -> Result<Stats, RegistryError> {
        let token = require_token(token)?;
        let repo = self.repo.clone();
        let key = token.to_string();
        let mut participant = off_runtime(move || repo.find_by_token(&key))
            .await?
            .ok_or_else(|| RegistryError::Auth("unknown token".to_string()))?;

        let username = participant
            .fx_username()
            .ok_or_else(|| RegistryError::Conflict("no external binding linked".to_string()))?
            .to_string();

        let response = self.source.fetch_stats(&username).await.map_err(|e| {
            tracing::warn!(token, username = %username, error = %e, "Stats fetch failed.");
            RegistryError::from(e)
        })?;

        let stamp = next_update_stamp(participant.stats.updated_at, Utc::now());
        participant.stats = response.into_stats(stamp);
        let stats = participant.stats.clone();
        let repo = self.repo.clone();
        off_runtime(move || repo.upsert(participant)).await??;

        tracing::info!(token, username = %username, "Stats synced.");
        Ok(stats)
    }
}

/// Runs synchronous store I/O on the blocking pool.
async fn off_runtime<T, F>(task: F) -> Result<T, RegistryError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| RegistryError::Server(format!("store task failed: {e}")))
}

/// `now`, unless the clock has not moved past the previous stamp, in which case one
/// millisecond after it. Keeps `updatedAt` strictly increasing across syncs.
fn next_update_stamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(previous) if now <= previous => previous + Duration::milliseconds(1),
        _ => now,
    }
}
