//! Shared domain types for the participant registry: participants, their inline stats,
//! history snapshots, and the loosely-typed [`Metric`] used for every numeric field.

pub mod enums;
pub mod error;
pub mod metric;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::ParticipantStatus;
pub use error::CoreError;
pub use metric::{coerce, Metric};
pub use structs::{FxBinding, Participant, ParticipantMeta, Snapshot, Stats};
