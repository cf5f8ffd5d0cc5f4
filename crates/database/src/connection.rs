use crate::document::JsonDocumentStorage;
use crate::fallback::FallbackStorage;
use crate::history::JsonSnapshotLog;
use crate::repository::ParticipantRepository;
use configuration::StorageSettings;
use std::sync::Arc;

/// Opens the participant store described by the settings: a JSON document at the
/// primary path, falling back to the secondary path when the primary is read-only.
pub fn open_repository(settings: &StorageSettings) -> ParticipantRepository {
    let primary = Arc::new(JsonDocumentStorage::new(&settings.primary_path));
    let fallback = Arc::new(JsonDocumentStorage::new(&settings.fallback_path));
    tracing::info!(
        primary = %settings.primary_path.display(),
        fallback = %settings.fallback_path.display(),
        "Opening participant store."
    );
    ParticipantRepository::new(Arc::new(FallbackStorage::new(primary, fallback)))
}

/// Opens the snapshot log at its configured location.
pub fn open_snapshot_log(settings: &StorageSettings) -> JsonSnapshotLog {
    JsonSnapshotLog::new(&settings.snapshots_path)
}
