//! Turns a registered source into entity passes and owns its status transitions.
//!
//! A source moves to `syncing` when an attempt starts, then to `completed` once every
//! collection has been processed, or to `failed` when the export itself could not be
//! fetched or decoded. Per-record errors never fail a source.

use crate::app::error::SyncError;
use crate::app::registry::SyncRegistry;
use crate::domain::entity::EntityKind;
use crate::domain::payload::ExportPayload;
use crate::domain::report::{BatchSyncReport, SourceOutcome, SourceSyncReport, SyncResult};
use crate::domain::source::SyncSource;
use crate::domain::syncer::{EntitySyncer, ReferencePolicy};
use crate::infra::fetch::ExportClient;
use crate::storage::SyncStore;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct SyncCoordinator {
    store: Arc<dyn SyncStore>,
    registry: SyncRegistry,
    client: ExportClient,
    policy: ReferencePolicy,
}

impl SyncCoordinator {
    pub fn new(store: Arc<dyn SyncStore>, client: ExportClient, policy: ReferencePolicy) -> Self {
        Self {
            registry: SyncRegistry::new(store.clone()),
            store,
            client,
            policy,
        }
    }

    pub fn registry(&self) -> &SyncRegistry {
        &self.registry
    }

    pub async fn sync_source(&self, id: Uuid) -> Result<SourceSyncReport, SyncError> {
        let source = self.registry.get(id).await?;
        self.sync(&source).await
    }

    /// Every registered source, one after another. A failing source is recorded in its
    /// own entry and the loop moves on.
    pub async fn sync_all(&self) -> Result<BatchSyncReport, SyncError> {
        let sources = self.registry.list().await?;
        tracing::info!(sources = sources.len(), "starting multi-source sync");

        let mut results = Vec::with_capacity(sources.len());
        for source in &sources {
            let outcome = match self.sync(source).await {
                Ok(report) => SourceOutcome {
                    source: report.source,
                    results: report.results,
                    error: None,
                },
                Err(e) => SourceOutcome {
                    source: source.app_name.clone(),
                    results: Vec::new(),
                    error: Some(e.to_string()),
                },
            };
            results.push(outcome);
        }

        Ok(BatchSyncReport {
            synced_sources: sources.len(),
            results,
            synced_at: Utc::now(),
        })
    }

    async fn sync(&self, source: &SyncSource) -> Result<SourceSyncReport, SyncError> {
        tracing::info!(source = %source.app_name, url = %source.export_url(), "sync started");
        self.registry.mark_syncing(source.id).await?;

        match self.run_attempt(source).await {
            Ok(results) => {
                let synced_at = Utc::now();
                self.registry.mark_completed(source.id, synced_at).await?;
                tracing::info!(
                    source = %source.app_name,
                    tables = results.len(),
                    "sync completed"
                );
                Ok(SourceSyncReport {
                    source: source.app_name.clone(),
                    results,
                    synced_at,
                })
            }
            Err(e) => {
                tracing::error!(source = %source.app_name, error = %e, "sync failed");
                if let Err(mark_err) = self.registry.mark_failed(source.id).await {
                    tracing::error!(
                        source = %source.app_name,
                        error = %mark_err,
                        "could not mark source failed"
                    );
                }
                Err(e)
            }
        }
    }

    async fn run_attempt(&self, source: &SyncSource) -> Result<Vec<SyncResult>, SyncError> {
        let payload = self.fetch_payload(source).await?;

        let mut results = Vec::new();
        for kind in EntityKind::DISPATCH_ORDER {
            let records = payload.collection(kind);
            if records.is_empty() {
                continue;
            }
            tracing::debug!(
                source = %source.app_name,
                table = kind.table_name(),
                records = records.len(),
                "dispatching collection"
            );
            let syncer = EntitySyncer::new(self.store.as_ref(), kind, self.policy);
            results.push(syncer.sync(&records, &source.app_name).await);
        }
        Ok(results)
    }

    /// The export document, following an index document's "all data" link when one is
    /// advertised. A failed secondary fetch falls back to the index itself.
    async fn fetch_payload(&self, source: &SyncSource) -> Result<ExportPayload, SyncError> {
        let url = source.export_url();
        let payload = ExportPayload::from_value(self.client.fetch_json(&url).await?)
            .ok_or(SyncError::PayloadNotObject { url })?;

        if !payload.is_index_document() {
            return Ok(payload);
        }

        let all_url = source.all_data_url(payload.all_data_link());
        tracing::debug!(source = %source.app_name, url = %all_url, "following index document");
        let secondary = self
            .client
            .fetch_json(&all_url)
            .await
            .and_then(|value| {
                ExportPayload::from_value(value).ok_or(SyncError::PayloadNotObject {
                    url: all_url.clone(),
                })
            });
        match secondary {
            Ok(full) => Ok(full),
            Err(e) => {
                tracing::warn!(
                    source = %source.app_name,
                    error = %e,
                    "secondary export fetch failed, using index document"
                );
                Ok(payload)
            }
        }
    }
}
