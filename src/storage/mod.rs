//! Storage port for the sync engine and its implementations.
//!
//! The coordinator and syncers only see [`SyncStore`]; `PostgresStore` is the production
//! backend and `MemoryStore` an in-process double with the same upsert semantics.

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::entity::{EntityDescriptor, EntityKind};
use crate::domain::mapper::{scalar_text, JsonMap};
use crate::domain::source::{NewSource, SourceStatus, SyncSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("missing conflict key '{column}' for {table}")]
    MissingConflictKey {
        table: &'static str,
        column: &'static str,
    },

    #[error("null value in column \"{column}\" of relation \"{table}\" violates not-null constraint")]
    NotNull {
        table: &'static str,
        column: &'static str,
    },

    #[error("column '{column}' is not writable on {table}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("invalid value for column '{column}': {message}")]
    InvalidValue { column: String, message: String },

    #[error("sync source {0} not found")]
    SourceNotFound(Uuid),
}

/// Canonical column map handed to [`SyncStore::upsert`].
pub type CanonicalRecord = JsonMap;

/// One row of a reference lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    pub id: String,
    pub slug: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Primary identifier of the written row; unchanged when an existing row was updated.
    pub id: String,
    pub inserted: bool,
}

#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Cheap connectivity check for health probes.
    async fn ping(&self) -> Result<(), StorageError>;

    /// Upserts by `app_name`; status resets to `registered`, id and `last_sync_at` survive.
    async fn register_source(&self, source: &NewSource) -> Result<SyncSource, StorageError>;

    /// All sources ordered by app name.
    async fn list_sources(&self) -> Result<Vec<SyncSource>, StorageError>;

    async fn get_source(&self, id: Uuid) -> Result<Option<SyncSource>, StorageError>;

    /// Sets `status`; `last_sync_at` is only written when `Some`.
    async fn set_source_status(
        &self,
        id: Uuid,
        status: SourceStatus,
        last_sync_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError>;

    /// Full id/slug/name table for one entity kind.
    async fn load_lookup(&self, kind: EntityKind) -> Result<Vec<LookupEntry>, StorageError>;

    /// Insert-or-update keyed on the kind's natural key. Only columns present in
    /// `record` are written.
    async fn upsert(
        &self,
        kind: EntityKind,
        record: &CanonicalRecord,
    ) -> Result<UpsertOutcome, StorageError>;
}

/// The record's conflict-key value, or the error both stores report when it is absent.
pub(crate) fn conflict_key(
    descriptor: &EntityDescriptor,
    record: &CanonicalRecord,
) -> Result<String, StorageError> {
    record
        .get(descriptor.natural_key)
        .and_then(scalar_text)
        .ok_or(StorageError::MissingConflictKey {
            table: descriptor.table,
            column: descriptor.natural_key,
        })
}

/// Rejects records that would write a column outside the kind's descriptor.
pub(crate) fn check_columns(
    descriptor: &EntityDescriptor,
    record: &CanonicalRecord,
) -> Result<(), StorageError> {
    match record.keys().find(|c| descriptor.column_type(c).is_none()) {
        Some(column) => Err(StorageError::UnknownColumn {
            table: descriptor.table,
            column: column.clone(),
        }),
        None => Ok(()),
    }
}
