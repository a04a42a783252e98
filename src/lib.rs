pub mod app;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{SyncCoordinator, SyncError, SyncRegistry};
pub use domain::{EntityKind, ReferencePolicy, SourceStatus, SyncResult, SyncSource};
pub use infra::fetch::ExportClient;
pub use storage::{MemoryStore, PostgresStore, StorageError, SyncStore};
