use crate::error::{require_token, RegistryError};
use core_types::{Participant, Snapshot};
use database::{ParticipantRepository, SnapshotLog};
use serde::Serialize;
use std::sync::Arc;

/// Default number of history entries surfaced with a participant.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// A participant together with its most recent measurements, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantDetails {
    pub participant: Participant,
    pub snapshots: Vec<Snapshot>,
}

/// Materializes the participant detail view from the store and the snapshot log.
/// It never writes to either.
#[derive(Clone)]
pub struct DetailsView {
    repo: ParticipantRepository,
    history: Arc<dyn SnapshotLog>,
    limit: usize,
}

impl DetailsView {
    pub fn new(repo: ParticipantRepository, history: Arc<dyn SnapshotLog>, limit: usize) -> Self {
        Self { repo, history, limit }
    }

    pub fn get(&self, token: &str) -> Result<ParticipantDetails, RegistryError> {
        let token = require_token(token)?;
        let participant = self
            .repo
            .find_by_token(token)
            .ok_or_else(|| RegistryError::NotFound("participant not found".to_string()))?;
        let snapshots = self.history.recent(token, self.limit);
        Ok(ParticipantDetails { participant, snapshots })
    }
}
