//! In-process [`SyncStore`] with the same natural-key upsert semantics as Postgres.

use crate::domain::entity::EntityKind;
use crate::domain::mapper::scalar_text;
use crate::domain::source::{NewSource, SourceStatus, SyncSource};
use crate::storage::{
    check_columns, conflict_key, CanonicalRecord, LookupEntry, StorageError, SyncStore,
    UpsertOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRow {
    pub id: String,
    pub fields: CanonicalRecord,
}

#[derive(Default)]
pub struct MemoryStore {
    sources: Mutex<Vec<SyncSource>>,
    tables: Mutex<HashMap<EntityKind, Vec<StoredRow>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of one table in insertion order.
    pub async fn rows(&self, kind: EntityKind) -> Vec<StoredRow> {
        self.tables
            .lock()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Row whose natural key equals `key`.
    pub async fn find(&self, kind: EntityKind, key: &str) -> Option<StoredRow> {
        let natural_key = kind.descriptor().natural_key;
        self.rows(kind).await.into_iter().find(|row| {
            row.fields
                .get(natural_key)
                .and_then(scalar_text)
                .is_some_and(|v| v == key)
        })
    }

    /// Inserts a row directly, bypassing sync provenance. Returns its id.
    pub async fn seed(&self, kind: EntityKind, fields: CanonicalRecord) -> String {
        let id = Uuid::new_v4().to_string();
        self.tables
            .lock()
            .await
            .entry(kind)
            .or_default()
            .push(StoredRow {
                id: id.clone(),
                fields,
            });
        id
    }
}

#[async_trait]
impl SyncStore for MemoryStore {
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn register_source(&self, source: &NewSource) -> Result<SyncSource, StorageError> {
        let mut sources = self.sources.lock().await;
        if let Some(existing) = sources.iter_mut().find(|s| s.app_name == source.app_name) {
            existing.app_url = source.app_url.clone();
            existing.export_endpoint = source.export_endpoint.clone();
            existing.status = SourceStatus::Registered;
            return Ok(existing.clone());
        }
        let created = SyncSource {
            id: Uuid::new_v4(),
            app_name: source.app_name.clone(),
            app_url: source.app_url.clone(),
            export_endpoint: source.export_endpoint.clone(),
            last_sync_at: None,
            status: SourceStatus::Registered,
        };
        sources.push(created.clone());
        Ok(created)
    }

    async fn list_sources(&self) -> Result<Vec<SyncSource>, StorageError> {
        let mut sources = self.sources.lock().await.clone();
        sources.sort_by(|a, b| a.app_name.cmp(&b.app_name));
        Ok(sources)
    }

    async fn get_source(&self, id: Uuid) -> Result<Option<SyncSource>, StorageError> {
        Ok(self
            .sources
            .lock()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn set_source_status(
        &self,
        id: Uuid,
        status: SourceStatus,
        last_sync_at: Option<DateTime<Utc>>,
    ) -> Result<(), StorageError> {
        let mut sources = self.sources.lock().await;
        let source = sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(StorageError::SourceNotFound(id))?;
        source.status = status;
        if last_sync_at.is_some() {
            source.last_sync_at = last_sync_at;
        }
        Ok(())
    }

    async fn load_lookup(&self, kind: EntityKind) -> Result<Vec<LookupEntry>, StorageError> {
        let descriptor = kind.descriptor();
        let tables = self.tables.lock().await;
        let entries: Vec<LookupEntry> = tables
            .get(&kind)
            .map(|rows| {
                rows.iter()
                    .map(|row| LookupEntry {
                        id: row.id.clone(),
                        slug: descriptor
                            .slug_column
                            .and_then(|c| row.fields.get(c))
                            .and_then(scalar_text),
                        name: row.fields.get(descriptor.name_column).and_then(scalar_text),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(entries)
    }

    async fn upsert(
        &self,
        kind: EntityKind,
        record: &CanonicalRecord,
    ) -> Result<UpsertOutcome, StorageError> {
        let descriptor = kind.descriptor();
        check_columns(descriptor, record)?;
        let key = conflict_key(descriptor, record)?;

        // NOT NULL is checked on the proposed row, before conflict handling, as Postgres does.
        for &column in descriptor.required {
            if record.get(column).map_or(true, |v| v.is_null()) {
                return Err(StorageError::NotNull {
                    table: descriptor.table,
                    column,
                });
            }
        }

        let mut tables = self.tables.lock().await;
        let rows = tables.entry(kind).or_default();
        let existing = rows.iter_mut().find(|row| {
            row.fields
                .get(descriptor.natural_key)
                .and_then(scalar_text)
                .is_some_and(|v| v == key)
        });

        match existing {
            Some(row) => {
                for (column, value) in record {
                    row.fields.insert(column.clone(), value.clone());
                }
                Ok(UpsertOutcome {
                    id: row.id.clone(),
                    inserted: false,
                })
            }
            None => {
                let id = Uuid::new_v4().to_string();
                rows.push(StoredRow {
                    id: id.clone(),
                    fields: record.clone(),
                });
                Ok(UpsertOutcome { id, inserted: true })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> CanonicalRecord {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn upsert_keeps_id_and_unsupplied_fields() {
        let store = MemoryStore::new();
        let first = store
            .upsert(
                EntityKind::Color,
                &record(json!({ "slug": "ruby-red", "name": "Ruby Red", "hex": "#E0115F" })),
            )
            .await
            .unwrap();
        assert!(first.inserted);

        let second = store
            .upsert(
                EntityKind::Color,
                &record(json!({ "slug": "ruby-red", "name": "Ruby" })),
            )
            .await
            .unwrap();
        assert!(!second.inserted);
        assert_eq!(first.id, second.id);

        let row = store.find(EntityKind::Color, "ruby-red").await.unwrap();
        assert_eq!(row.fields["name"], json!("Ruby"));
        assert_eq!(row.fields["hex"], json!("#E0115F"));
        assert_eq!(store.rows(EntityKind::Color).await.len(), 1);
    }

    #[tokio::test]
    async fn upsert_rejects_missing_key_and_nulls() {
        let store = MemoryStore::new();
        let err = store
            .upsert(EntityKind::Season, &record(json!({ "description": "x" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::MissingConflictKey { column: "name", .. }));

        let err = store
            .upsert(EntityKind::Fabric, &record(json!({ "slug": "silk", "name": null })))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotNull { column: "name", .. }));

        let err = store
            .upsert(EntityKind::Season, &record(json!({ "name": "Autumn", "bogus": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn register_is_keyed_on_app_name() {
        let store = MemoryStore::new();
        let reg = NewSource {
            app_name: "Trainer".into(),
            app_url: "https://a.example".into(),
            export_endpoint: "/export".into(),
        };
        let first = store.register_source(&reg).await.unwrap();
        store
            .set_source_status(first.id, SourceStatus::Completed, Some(Utc::now()))
            .await
            .unwrap();

        let again = store
            .register_source(&NewSource {
                app_url: "https://b.example".into(),
                ..reg
            })
            .await
            .unwrap();
        assert_eq!(again.id, first.id);
        assert_eq!(again.app_url, "https://b.example");
        assert_eq!(again.status, SourceStatus::Registered);
        assert!(again.last_sync_at.is_some());
        assert_eq!(store.list_sources().await.unwrap().len(), 1);
    }
}
