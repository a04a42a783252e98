//! Sync domain: entity descriptors, record mapping, reference resolution and the
//! per-kind syncer.

pub mod entity;
pub mod mapper;
pub mod payload;
pub mod report;
pub mod resolver;
pub mod source;
pub mod syncer;

pub use entity::EntityKind;
pub use payload::ExportPayload;
pub use report::{BatchSyncReport, SourceOutcome, SourceSyncReport, SyncResult};
pub use source::{NewSource, SourceStatus, SyncSource};
pub use syncer::{EntitySyncer, ReferencePolicy};
