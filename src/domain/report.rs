//! Report types returned by a sync pass. Never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of one entity-kind pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SyncResult {
    pub table: String,
    /// Every successful upsert, new or existing row.
    pub updated: usize,
    /// Subset of `updated` that created a new row.
    pub inserted: usize,
    /// One entry per failed record, in input order.
    pub errors: Vec<String>,
}

impl SyncResult {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            updated: 0,
            inserted: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_upsert(&mut self, inserted: bool) {
        self.updated += 1;
        if inserted {
            self.inserted += 1;
        }
    }
}

/// Result of a single-source sync.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceSyncReport {
    /// Source app name.
    pub source: String,
    pub results: Vec<SyncResult>,
    pub synced_at: DateTime<Utc>,
}

/// Per-source entry of a multi-source run; `error` is set when the attempt failed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceOutcome {
    pub source: String,
    pub results: Vec<SyncResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchSyncReport {
    pub synced_sources: usize,
    pub results: Vec<SourceOutcome>,
    pub synced_at: DateTime<Utc>,
}
