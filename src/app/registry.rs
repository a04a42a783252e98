//! Registered sources and their status transitions.

use crate::app::error::SyncError;
use crate::domain::source::{NewSource, SourceStatus, SyncSource};
use crate::storage::SyncStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct SyncRegistry {
    store: Arc<dyn SyncStore>,
}

impl SyncRegistry {
    pub fn new(store: Arc<dyn SyncStore>) -> Self {
        Self { store }
    }

    /// Validates and upserts a registration keyed on `app_name`.
    pub async fn register(
        &self,
        app_name: Option<&str>,
        app_url: Option<&str>,
        export_endpoint: Option<&str>,
    ) -> Result<SyncSource, SyncError> {
        let new_source = NewSource::normalize(app_name, app_url, export_endpoint)
            .ok_or(SyncError::InvalidRegistration)?;
        let source = self.store.register_source(&new_source).await?;
        tracing::info!(
            source = %source.app_name,
            id = %source.id,
            url = %source.export_url(),
            "registered sync source"
        );
        Ok(source)
    }

    pub async fn list(&self) -> Result<Vec<SyncSource>, SyncError> {
        Ok(self.store.list_sources().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<SyncSource, SyncError> {
        self.store
            .get_source(id)
            .await?
            .ok_or(SyncError::SourceNotFound(id))
    }

    pub async fn mark_syncing(&self, id: Uuid) -> Result<(), SyncError> {
        self.set(id, SourceStatus::Syncing, None).await
    }

    pub async fn mark_completed(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), SyncError> {
        self.set(id, SourceStatus::Completed, Some(at)).await
    }

    /// Leaves `last_sync_at` at the last successful sync.
    pub async fn mark_failed(&self, id: Uuid) -> Result<(), SyncError> {
        self.set(id, SourceStatus::Failed, None).await
    }

    async fn set(
        &self,
        id: Uuid,
        status: SourceStatus,
        at: Option<DateTime<Utc>>,
    ) -> Result<(), SyncError> {
        tracing::debug!(id = %id, status = %status, "source status change");
        self.store.set_source_status(id, status, at).await?;
        Ok(())
    }
}
