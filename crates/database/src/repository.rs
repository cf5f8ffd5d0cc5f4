use crate::error::StoreError;
use crate::storage::{MemoryStorage, Storage};
use core_types::{Participant, ParticipantMeta, ParticipantStatus};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// The `ParticipantRepository` is the application's participant store. It owns the
/// business rules that sit on top of raw storage: status monotonicity, activation, and
/// registration.
///
/// Mutations take an in-process write lock so a read-modify-write cycle cannot lose a
/// concurrent update from the same process.
#[derive(Clone)]
pub struct ParticipantRepository {
    storage: Arc<dyn Storage>,
    write_lock: Arc<Mutex<()>>,
}

impl ParticipantRepository {
    /// Creates a new `ParticipantRepository` over any storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// A repository backed by process memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Inserts the participant, or fully replaces the record with the same token.
    ///
    /// The one field that is not blindly replaced is `status`: an `ACTIVE` record stays
    /// active even if the incoming copy says `PENDING`.
    pub fn upsert(&self, participant: Participant) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.put_monotonic(participant)
    }

    /// Exact-match lookup. An unknown token is `None`, not an error.
    pub fn find_by_token(&self, token: &str) -> Option<Participant> {
        self.storage.get(token)
    }

    /// Marks the participant active and, when given, links the external username.
    ///
    /// Returns `Ok(false)` without touching storage when the token is unknown.
    pub fn activate(&self, token: &str, username: Option<&str>) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let Some(mut participant) = self.storage.get(token) else {
            tracing::debug!(token, "Activation requested for unknown token, ignoring.");
            return Ok(false);
        };

        participant.status = participant.status.advance(ParticipantStatus::Active);
        if let Some(username) = username {
            participant.bind_username(username);
        }
        self.storage.put(participant)?;
        tracing::info!(token, "Participant activated.");
        Ok(true)
    }

    /// Every stored participant, in insertion order.
    pub fn list(&self) -> Vec<Participant> {
        self.storage.list()
    }

    /// Creates a pending participant under a freshly generated token.
    pub fn register(
        &self,
        display_name: &str,
        email: &str,
        meta: Option<ParticipantMeta>,
    ) -> Result<Participant, StoreError> {
        let mut participant = Participant::new(Uuid::new_v4().simple().to_string(), display_name, email);
        participant.meta = meta;
        self.upsert(participant.clone())?;
        tracing::info!(token = %participant.token, "Participant registered.");
        Ok(participant)
    }

    fn put_monotonic(&self, mut participant: Participant) -> Result<(), StoreError> {
        if let Some(existing) = self.storage.get(&participant.token) {
            let status = existing.status.advance(participant.status);
            if status != participant.status {
                tracing::warn!(
                    token = %participant.token,
                    "Ignoring attempt to move an active participant back to pending."
                );
                participant.status = status;
            }
        }
        self.storage.put(participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonDocumentStorage;
    use crate::fallback::FallbackStorage;
    use core_types::Metric;

    fn participant(token: &str) -> Participant {
        let mut participant = Participant::new(token, "Trader", "trader@example.com");
        participant.stats.roi_pct = Some(Metric::from("4.2"));
        participant.stats.equity = Some(Metric::Number(10_250.0));
        participant
    }

    #[test]
    fn upsert_then_find_round_trips() {
        let repo = ParticipantRepository::in_memory();
        let p = participant("tok");
        repo.upsert(p.clone()).unwrap();
        assert_eq!(repo.find_by_token("tok"), Some(p));
        assert_eq!(repo.find_by_token("other"), None);
    }

    #[test]
    fn upsert_round_trips_through_a_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ParticipantRepository::new(Arc::new(JsonDocumentStorage::new(dir.path().join("p.json"))));
        let p = participant("tok");
        repo.upsert(p.clone()).unwrap();
        assert_eq!(repo.find_by_token("tok"), Some(p));
    }

    #[test]
    fn upsert_is_a_full_replace() {
        let repo = ParticipantRepository::in_memory();
        repo.upsert(participant("tok")).unwrap();

        let mut replacement = Participant::new("tok", "Renamed", "new@example.com");
        replacement.created_at = repo.find_by_token("tok").unwrap().created_at;
        repo.upsert(replacement.clone()).unwrap();

        let stored = repo.find_by_token("tok").unwrap();
        assert_eq!(stored, replacement);
        assert_eq!(stored.stats.roi_pct, None);
        assert_eq!(repo.list().len(), 1);
    }

    #[test]
    fn upsert_never_demotes_an_active_participant() {
        let repo = ParticipantRepository::in_memory();
        repo.upsert(participant("tok")).unwrap();
        repo.activate("tok", None).unwrap();

        repo.upsert(participant("tok")).unwrap();
        assert_eq!(repo.find_by_token("tok").unwrap().status, ParticipantStatus::Active);
    }

    #[test]
    fn activate_sets_status_and_binding() {
        let repo = ParticipantRepository::in_memory();
        repo.upsert(participant("tok")).unwrap();

        assert!(repo.activate("tok", Some("fx_user")).unwrap());

        let stored = repo.find_by_token("tok").unwrap();
        assert_eq!(stored.status, ParticipantStatus::Active);
        assert_eq!(stored.fx_username(), Some("fx_user"));
    }

    #[test]
    fn activate_without_username_keeps_existing_binding() {
        let repo = ParticipantRepository::in_memory();
        let mut p = participant("tok");
        p.bind_username("kept");
        repo.upsert(p).unwrap();

        repo.activate("tok", None).unwrap();
        assert_eq!(repo.find_by_token("tok").unwrap().fx_username(), Some("kept"));
    }

    #[test]
    fn activate_unknown_token_is_a_silent_no_op() {
        let repo = ParticipantRepository::in_memory();
        assert!(!repo.activate("missing", Some("x")).unwrap());
        assert!(repo.list().is_empty());
    }

    #[test]
    fn register_creates_a_pending_participant_with_a_fresh_token() {
        let repo = ParticipantRepository::in_memory();
        let a = repo.register("Ada", "ada@example.com", None).unwrap();
        let b = repo.register("Bob", "bob@example.com", None).unwrap();

        assert_ne!(a.token, b.token);
        assert_eq!(a.status, ParticipantStatus::Pending);
        assert_eq!(repo.find_by_token(&a.token), Some(a));
    }

    #[test]
    fn writes_land_in_fallback_when_primary_is_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("readonly");
        std::fs::write(&blocker, "").unwrap();
        let primary = blocker.join("participants.json");
        let fallback = dir.path().join("tmp").join("participants.json");

        let open = || {
            ParticipantRepository::new(Arc::new(FallbackStorage::new(
                Arc::new(JsonDocumentStorage::new(&primary)),
                Arc::new(JsonDocumentStorage::new(&fallback)),
            )))
        };

        let repo = open();
        let p = participant("tok");
        repo.upsert(p.clone()).unwrap();
        assert_eq!(repo.find_by_token("tok"), Some(p.clone()));

        assert_eq!(open().find_by_token("tok"), Some(p));
    }
}
