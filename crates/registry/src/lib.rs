//! The participant registry: token resolution, stats sync, the public leaderboard, and
//! the participant detail view, all over a shared [`ParticipantRepository`].

use api_client::StatsSource;
use configuration::Config;
use core_types::{Participant, Snapshot, Stats};
use database::{ParticipantRepository, SnapshotLog};
use std::sync::Arc;

pub mod details;
pub mod error;
pub mod gateway;
pub mod leaderboard;
pub mod sync;

pub use details::{DetailsView, ParticipantDetails};
pub use error::RegistryError;
pub use gateway::{Authenticator, ResolutionGateway, TokenAuthenticator};
pub use leaderboard::{LeaderboardEntry, LeaderboardRanker};
pub use sync::StatsSync;

/// Bundles every registry operation behind one cloneable handle.
#[derive(Clone)]
pub struct Registry {
    repo: ParticipantRepository,
    history: Arc<dyn SnapshotLog>,
    gateway: ResolutionGateway,
    sync: StatsSync,
    ranker: LeaderboardRanker,
    details: DetailsView,
}

impl Registry {
    pub fn new(
        repo: ParticipantRepository,
        history: Arc<dyn SnapshotLog>,
        source: Arc<dyn StatsSource>,
        config: &Config,
    ) -> Self {
        let gateway = ResolutionGateway::new(Arc::new(TokenAuthenticator::new(repo.clone())));
        Self {
            gateway,
            sync: StatsSync::new(repo.clone(), source),
            ranker: LeaderboardRanker::new(config.leaderboard.limit),
            details: DetailsView::new(repo.clone(), history.clone(), config.history.limit),
            repo,
            history,
        }
    }

    pub fn repository(&self) -> &ParticipantRepository {
        &self.repo
    }

    pub fn resolve(&self, token: &str) -> Result<Participant, RegistryError> {
        self.gateway.resolve(token)
    }

    pub async fn sync_stats(&self, token: &str) -> Result<Stats, RegistryError> {
        self.sync.sync(token).await
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.ranker.build(&self.repo)
    }

    pub fn participant_details(&self, token: &str) -> Result<ParticipantDetails, RegistryError> {
        self.details.get(token)
    }

    /// The snapshot ingestion path. The participant must exist.
    pub fn record_snapshot(&self, token: &str, snapshot: Snapshot) -> Result<(), RegistryError> {
        let token = error::require_token(token)?;
        if self.repo.find_by_token(token).is_none() {
            return Err(RegistryError::NotFound("participant not found".to_string()));
        }
        self.history.append(token, snapshot)?;
        tracing::info!(token, "Snapshot recorded.");
        Ok(())
    }
}
