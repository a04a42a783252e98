//! One map -> resolve -> upsert pass over a single entity kind's records.

use crate::domain::entity::{EntityKind, SOURCE_APP_COLUMN, SYNCED_AT_COLUMN};
use crate::domain::mapper::{map_record, MappedRecord};
use crate::domain::report::SyncResult;
use crate::domain::resolver::{ReferenceResolver, Resolution};
use crate::storage::SyncStore;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// What happens to a reference whose inputs match no stored row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferencePolicy {
    /// Store `null` and carry on.
    #[default]
    Lenient,
    /// Reject the record with a per-record error.
    Strict,
}

impl FromStr for ReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(ReferencePolicy::Lenient),
            "strict" => Ok(ReferencePolicy::Strict),
            other => Err(format!(
                "unknown reference policy '{}' (expected lenient or strict)",
                other
            )),
        }
    }
}

impl fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferencePolicy::Lenient => f.write_str("lenient"),
            ReferencePolicy::Strict => f.write_str("strict"),
        }
    }
}

pub struct EntitySyncer<'a> {
    store: &'a dyn SyncStore,
    kind: EntityKind,
    policy: ReferencePolicy,
}

impl<'a> EntitySyncer<'a> {
    pub fn new(store: &'a dyn SyncStore, kind: EntityKind, policy: ReferencePolicy) -> Self {
        Self {
            store,
            kind,
            policy,
        }
    }

    /// Upserts `records` in input order, one statement each.
    ///
    /// Per-record failures land in `SyncResult::errors`; the pass itself never fails.
    pub async fn sync(&self, records: &[JsonValue], source_app: &str) -> SyncResult {
        let descriptor = self.kind.descriptor();
        let resolver = ReferenceResolver::load(self.store, self.kind).await;
        let mut result = SyncResult::new(descriptor.table);

        for (index, raw) in records.iter().enumerate() {
            let mapped = match map_record(self.kind, raw) {
                Ok(mapped) => mapped,
                Err(e) => {
                    let message = format!("{} #{}: {}", descriptor.label, index, e);
                    tracing::warn!(table = descriptor.table, "{}", message);
                    result.errors.push(message);
                    continue;
                }
            };

            match self.write(&resolver, mapped, source_app).await {
                Ok(inserted) => result.record_upsert(inserted),
                Err(message) => {
                    tracing::warn!(table = descriptor.table, "{}", message);
                    result.errors.push(message);
                }
            }
        }

        tracing::info!(
            source = source_app,
            table = descriptor.table,
            updated = result.updated,
            inserted = result.inserted,
            errors = result.errors.len(),
            "entity pass finished"
        );
        result
    }

    /// Resolves, stamps and upserts one record. Errors come back formatted for the report.
    async fn write(
        &self,
        resolver: &ReferenceResolver,
        mut mapped: MappedRecord,
        source_app: &str,
    ) -> Result<bool, String> {
        let descriptor = self.kind.descriptor();
        let key = mapped.display_key();

        for (spec, input) in &mapped.references {
            let value = match resolver.resolve(spec.target, input) {
                Resolution::NotSupplied => continue,
                Resolution::Resolved(id) => JsonValue::String(id),
                Resolution::Unresolved(tried) => {
                    let target = spec.target.descriptor().label.to_lowercase();
                    if self.policy == ReferencePolicy::Strict {
                        return Err(format!(
                            "{} {}: unresolved {} reference '{}'",
                            descriptor.label, key, target, tried
                        ));
                    }
                    tracing::warn!(
                        table = descriptor.table,
                        record = %key,
                        column = spec.column,
                        value = %tried,
                        "unresolved {} reference, storing null",
                        target
                    );
                    JsonValue::Null
                }
            };
            mapped.fields.insert(spec.column.to_string(), value);
        }

        mapped.fields.insert(
            SOURCE_APP_COLUMN.to_string(),
            JsonValue::String(source_app.to_string()),
        );
        mapped.fields.insert(
            SYNCED_AT_COLUMN.to_string(),
            JsonValue::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        self.store
            .upsert(self.kind, &mapped.fields)
            .await
            .map(|outcome| outcome.inserted)
            .map_err(|e| format!("{} {}: {}", descriptor.label, key, e))
    }
}
