use crate::error::StoreError;
use core_types::Participant;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

/// A keyed collection of participants, addressed by token.
///
/// Reads never fail: an absent or unreadable backing location reads as empty. Only
/// writes report errors.
pub trait Storage: Send + Sync {
    fn get(&self, token: &str) -> Option<Participant> {
        self.list().into_iter().find(|p| p.token == token)
    }

    /// Inserts the record, or fully replaces the one with the same token.
    fn put(&self, participant: Participant) -> Result<(), StoreError>;

    /// All records, in insertion order.
    fn list(&self) -> Vec<Participant>;

    /// Whether this location currently holds a collection (possibly an empty one).
    fn is_present(&self) -> bool;

    /// The stored records as written, including any that no longer decode.
    fn export(&self) -> Vec<Value>;

    /// Replaces the whole collection with previously exported records.
    fn seed(&self, records: Vec<Value>) -> Result<(), StoreError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// The persisted document shape: `{ "participants": [...] }`.
///
/// Records are kept as raw JSON and decoded on read, so a record this build cannot
/// decode is skipped by readers but survives every rewrite. Unknown top-level keys are
/// kept as well.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipantDocument {
    #[serde(default)]
    pub participants: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ParticipantDocument {
    pub fn from_records(participants: Vec<Value>) -> Self {
        Self {
            participants,
            extra: Map::new(),
        }
    }

    /// Replaces the record in place, keeping its position, or appends it.
    pub fn upsert(&mut self, participant: Participant) -> Result<(), StoreError> {
        let record = serde_json::to_value(&participant)?;
        let existing = self
            .participants
            .iter_mut()
            .find(|r| r.get("token").and_then(Value::as_str) == Some(participant.token.as_str()));
        match existing {
            Some(slot) => *slot = record,
            None => self.participants.push(record),
        }
        Ok(())
    }

    /// The records that decode, in document order.
    pub fn decoded(&self) -> Vec<Participant> {
        self.participants
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match Participant::deserialize(record) {
                Ok(participant) => Some(participant),
                Err(e) => {
                    tracing::warn!(
                        index,
                        token = record.get("token").and_then(serde_json::Value::as_str).unwrap_or("?"),
                        error = %e,
                        "Skipping participant record that does not decode."
                    );
                    None
                }
            })
            .collect()
    }
}

/// Process-local storage, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: RwLock<ParticipantDocument>,
    present: AtomicBool,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_participants(participants: Vec<Participant>) -> Self {
        Self::with_records(
            participants
                .iter()
                .filter_map(|p| serde_json::to_value(p).ok())
                .collect(),
        )
    }

    /// Storage holding raw records, as a location written by another build would.
    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            document: RwLock::new(ParticipantDocument::from_records(records)),
            present: AtomicBool::new(true),
            read_only: false,
        }
    }

    /// A storage that rejects every write, standing in for a read-only deployment.
    pub fn read_only(participants: Vec<Participant>) -> Self {
        Self::with_participants(participants).into_read_only()
    }

    pub fn into_read_only(self) -> Self {
        Self {
            read_only: true,
            ..self
        }
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly(self.describe()));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn put(&self, participant: Participant) -> Result<(), StoreError> {
        self.check_writable()?;
        self.document
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .upsert(participant)?;
        self.present.store(true, Ordering::Release);
        Ok(())
    }

    fn list(&self) -> Vec<Participant> {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .decoded()
    }

    fn is_present(&self) -> bool {
        self.present.load(Ordering::Acquire)
    }

    fn export(&self) -> Vec<Value> {
        self.document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .participants
            .clone()
    }

    fn seed(&self, records: Vec<Value>) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.document.write().unwrap_or_else(PoisonError::into_inner) =
            ParticipantDocument::from_records(records);
        self.present.store(true, Ordering::Release);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
