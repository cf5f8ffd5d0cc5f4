use crate::error::StoreError;
use crate::storage::Storage;
use core_types::Participant;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Wraps a primary storage with a secondary one that takes over when the primary
/// refuses writes (typically a read-only deployment filesystem).
///
/// - Reads come from the secondary whenever it holds a collection, otherwise from the
///   primary, so redirected writes stay visible.
/// - The first failed primary write seeds the secondary with the primary's current
///   contents (or an empty collection) and redirects every later read and write there
///   for the life of this value.
/// - A write only fails when both locations reject it.
pub struct FallbackStorage {
    primary: Arc<dyn Storage>,
    secondary: Arc<dyn Storage>,
    engaged: AtomicBool,
}

impl FallbackStorage {
    pub fn new(primary: Arc<dyn Storage>, secondary: Arc<dyn Storage>) -> Self {
        Self {
            primary,
            secondary,
            engaged: AtomicBool::new(false),
        }
    }

    /// Whether reads and writes are currently served by the secondary.
    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::Acquire) || self.secondary.is_present()
    }

    fn active(&self) -> &dyn Storage {
        if self.is_engaged() {
            self.secondary.as_ref()
        } else {
            self.primary.as_ref()
        }
    }

    fn engage(&self) -> Result<(), StoreError> {
        if !self.secondary.is_present() {
            let seed = self.primary.export();
            tracing::info!(
                fallback = %self.secondary.describe(),
                records = seed.len(),
                "Seeding fallback storage from primary."
            );
            self.secondary.seed(seed)?;
        }
        self.engaged.store(true, Ordering::Release);
        Ok(())
    }
}

impl Storage for FallbackStorage {
    fn get(&self, token: &str) -> Option<Participant> {
        self.active().get(token)
    }

    fn put(&self, participant: Participant) -> Result<(), StoreError> {
        if self.is_engaged() {
            return self.secondary.put(participant);
        }

        let primary_err = match self.primary.put(participant.clone()) {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };
        tracing::warn!(
            primary = %self.primary.describe(),
            fallback = %self.secondary.describe(),
            error = %primary_err,
            "Primary storage is not writable, switching to fallback."
        );

        self.engage()
            .and_then(|()| self.secondary.put(participant))
            .map_err(|fallback_err| StoreError::Persistence {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            })
    }

    fn list(&self) -> Vec<Participant> {
        self.active().list()
    }

    fn is_present(&self) -> bool {
        self.primary.is_present() || self.secondary.is_present()
    }

    fn export(&self) -> Vec<Value> {
        self.active().export()
    }

    fn seed(&self, records: Vec<Value>) -> Result<(), StoreError> {
        self.active().seed(records)
    }

    fn describe(&self) -> String {
        format!("{} (fallback: {})", self.primary.describe(), self.secondary.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::JsonDocumentStorage;
    use crate::storage::MemoryStorage;

    fn participant(token: &str) -> Participant {
        Participant::new(token, token.to_uppercase(), format!("{token}@example.com"))
    }

    #[test]
    fn writable_primary_is_used_directly() {
        let primary = Arc::new(MemoryStorage::new());
        let secondary = Arc::new(MemoryStorage::new());
        let storage = FallbackStorage::new(primary.clone(), secondary.clone());

        storage.put(participant("a")).unwrap();

        assert!(primary.get("a").is_some());
        assert!(!secondary.is_present());
        assert!(!storage.is_engaged());
    }

    #[test]
    fn read_only_primary_seeds_fallback_with_existing_records() {
        let primary = Arc::new(MemoryStorage::read_only(vec![participant("old")]));
        let secondary = Arc::new(MemoryStorage::new());
        let storage = FallbackStorage::new(primary.clone(), secondary.clone());

        storage.put(participant("new")).unwrap();

        assert!(storage.is_engaged());
        let tokens: Vec<_> = secondary.list().into_iter().map(|p| p.token).collect();
        assert_eq!(tokens, vec!["old", "new"]);
        assert!(storage.get("new").is_some());
        assert!(storage.get("old").is_some());
        assert!(primary.get("new").is_none());
    }

    #[test]
    fn fallback_seed_carries_records_that_do_not_decode() {
        let legacy = serde_json::json!({ "token": "b", "displayName": "B", "createdAt": 1704067200000u64 });
        let primary = Arc::new(
            MemoryStorage::with_records(vec![
                serde_json::to_value(participant("a")).unwrap(),
                legacy.clone(),
            ])
            .into_read_only(),
        );
        let secondary = Arc::new(MemoryStorage::new());
        let storage = FallbackStorage::new(primary, secondary.clone());

        storage.put(participant("c")).unwrap();

        let tokens: Vec<_> = storage.list().into_iter().map(|p| p.token).collect();
        assert_eq!(tokens, vec!["a", "c"]);
        let exported = secondary.export();
        assert_eq!(exported.len(), 3);
        assert_eq!(exported[1], legacy);
    }

    #[test]
    fn fallback_is_sticky_once_engaged() {
        let primary = Arc::new(MemoryStorage::read_only(Vec::new()));
        let secondary = Arc::new(MemoryStorage::new());
        let storage = FallbackStorage::new(primary, secondary.clone());

        storage.put(participant("a")).unwrap();
        storage.put(participant("b")).unwrap();

        assert_eq!(secondary.list().len(), 2);
    }

    #[test]
    fn both_locations_failing_is_a_persistence_error() {
        let storage = FallbackStorage::new(
            Arc::new(MemoryStorage::read_only(Vec::new())),
            Arc::new(MemoryStorage::read_only(Vec::new())),
        );
        let err = storage.put(participant("a")).unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
    }

    #[test]
    fn fallback_file_is_preferred_by_a_fresh_process() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("readonly");
        std::fs::write(&blocker, "").unwrap();
        let primary_path = blocker.join("participants.json");
        let fallback_path = dir.path().join("fallback").join("participants.json");

        let open = || {
            FallbackStorage::new(
                Arc::new(JsonDocumentStorage::new(&primary_path)),
                Arc::new(JsonDocumentStorage::new(&fallback_path)),
            )
        };

        open().put(participant("a")).unwrap();

        let fresh = open();
        assert!(fresh.is_engaged());
        assert_eq!(fresh.get("a").unwrap().display_name, "A");
    }
}
