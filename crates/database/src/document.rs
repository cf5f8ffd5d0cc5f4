use crate::error::StoreError;
use crate::file::{load_json, read_json_or_default, write_json_atomic};
use crate::storage::{ParticipantDocument, Storage};
use core_types::Participant;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Participants persisted as a single JSON document on disk.
///
/// Every operation re-reads the whole file; every write rewrites it. A write never
/// replaces a file it could not parse.
#[derive(Debug, Clone)]
pub struct JsonDocumentStorage {
    path: PathBuf,
}

impl JsonDocumentStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> ParticipantDocument {
        read_json_or_default(&self.path)
    }
}

impl Storage for JsonDocumentStorage {
    fn put(&self, participant: Participant) -> Result<(), StoreError> {
        let mut document: ParticipantDocument = load_json(&self.path)?.unwrap_or_default();
        document.upsert(participant)?;
        write_json_atomic(&self.path, &document)
    }

    fn list(&self) -> Vec<Participant> {
        self.read().decoded()
    }

    fn is_present(&self) -> bool {
        self.path.is_file()
    }

    fn export(&self) -> Vec<Value> {
        self.read().participants
    }

    fn seed(&self, records: Vec<Value>) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &ParticipantDocument::from_records(records))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
