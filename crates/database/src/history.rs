use crate::error::StoreError;
use crate::file::{load_json, read_json_or_default, write_json_atomic};
use core_types::Snapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError, RwLock};

/// An append-only log of performance snapshots, partitioned by participant token.
pub trait SnapshotLog: Send + Sync {
    /// Records a new measurement. Existing entries are never modified.
    fn append(&self, token: &str, snapshot: Snapshot) -> Result<(), StoreError>;

    /// Up to `limit` snapshots for `token`, newest first.
    fn recent(&self, token: &str, limit: usize) -> Vec<Snapshot>;
}

fn newest_first(mut snapshots: Vec<Snapshot>, limit: usize) -> Vec<Snapshot> {
    // Stable, so snapshots sharing a timestamp keep their append order.
    snapshots.sort_by(|a, b| b.at.cmp(&a.at));
    snapshots.truncate(limit);
    snapshots
}

#[derive(Debug, Default)]
pub struct MemorySnapshotLog {
    entries: RwLock<HashMap<String, Vec<Snapshot>>>,
}

impl MemorySnapshotLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotLog for MemorySnapshotLog {
    fn append(&self, token: &str, snapshot: Snapshot) -> Result<(), StoreError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(token.to_string())
            .or_default()
            .push(snapshot);
        Ok(())
    }

    fn recent(&self, token: &str, limit: usize) -> Vec<Snapshot> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        newest_first(entries.get(token).cloned().unwrap_or_default(), limit)
    }
}

/// The persisted log shape: `{ "snapshots": { "<token>": [...] } }`. Entries stay raw so
/// one that does not decode never takes the rest of the log with it.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    snapshots: BTreeMap<String, Vec<Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

fn decode_entries(token: &str, entries: Vec<Value>) -> Vec<Snapshot> {
    entries
        .into_iter()
        .filter_map(|entry| {
            Snapshot::deserialize(&entry)
                .map_err(|e| tracing::warn!(token, error = %e, "Skipping snapshot that does not decode."))
                .ok()
        })
        .collect()
}

/// A snapshot log kept in one JSON document. The full history is retained; only reads
/// are capped.
#[derive(Debug)]
pub struct JsonSnapshotLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSnapshotLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl SnapshotLog for JsonSnapshotLog {
    fn append(&self, token: &str, snapshot: Snapshot) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut document: SnapshotDocument = load_json(&self.path)?.unwrap_or_default();
        document
            .snapshots
            .entry(token.to_string())
            .or_default()
            .push(serde_json::to_value(&snapshot)?);
        write_json_atomic(&self.path, &document)
    }

    fn recent(&self, token: &str, limit: usize) -> Vec<Snapshot> {
        let mut document: SnapshotDocument = read_json_or_default(&self.path);
        let entries = document.snapshots.remove(token).unwrap_or_default();
        newest_first(decode_entries(token, entries), limit)
    }
}
