//! # Participant Store
//!
//! Durable storage for the participant registry and the snapshot history.
//!
//! ## Architectural Principles
//!
//! - **Injectable storage:** Business rules in [`ParticipantRepository`] sit on top of the
//!   [`Storage`] trait. Tests use [`MemoryStorage`]; production uses
//!   [`JsonDocumentStorage`] wrapped in [`FallbackStorage`].
//! - **Reads never fail:** a missing or corrupt document reads as an empty collection.
//!   Only writes surface errors, and only when every location rejects them.
//! - **No caching:** every read goes back to the backing document.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod document;
pub mod error;
pub mod fallback;
mod file;
pub mod history;
pub mod repository;
pub mod storage;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{open_repository, open_snapshot_log};
pub use document::JsonDocumentStorage;
pub use error::StoreError;
pub use fallback::FallbackStorage;
pub use history::{JsonSnapshotLog, MemorySnapshotLog, SnapshotLog};
pub use repository::ParticipantRepository;
pub use storage::{MemoryStorage, ParticipantDocument, Storage};
