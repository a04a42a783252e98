//! Registered source applications and their sync lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_EXPORT_ENDPOINT: &str = "/api/export";

/// Last-known state of a source. Written at the start and end of each sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Registered,
    Syncing,
    Completed,
    Failed,
}

impl SourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceStatus::Registered => "registered",
            SourceStatus::Syncing => "syncing",
            SourceStatus::Completed => "completed",
            SourceStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(SourceStatus::Registered),
            "syncing" => Ok(SourceStatus::Syncing),
            "completed" => Ok(SourceStatus::Completed),
            "failed" => Ok(SourceStatus::Failed),
            other => Err(format!("unknown source status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SyncSource {
    pub id: Uuid,
    /// Unique natural key of the source.
    pub app_name: String,
    pub app_url: String,
    pub export_endpoint: String,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub status: SourceStatus,
}

impl SyncSource {
    pub fn export_url(&self) -> String {
        join_url(&self.app_url, &self.export_endpoint)
    }

    /// Secondary "all data" location used when the export is only an index document.
    pub fn all_data_url(&self, link: Option<&str>) -> String {
        match link {
            Some(l) if l.starts_with("http://") || l.starts_with("https://") => l.to_string(),
            Some(l) => join_url(&self.app_url, l),
            None => format!("{}/all", self.export_url().trim_end_matches('/')),
        }
    }
}

/// A validated registration, ready to be upserted by app name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSource {
    pub app_name: String,
    pub app_url: String,
    pub export_endpoint: String,
}

impl NewSource {
    /// Trims inputs, strips a trailing `/` from the URL and defaults the export path.
    /// Returns `None` when `app_name` or `app_url` is missing or blank.
    pub fn normalize(
        app_name: Option<&str>,
        app_url: Option<&str>,
        export_endpoint: Option<&str>,
    ) -> Option<Self> {
        let app_name = app_name.map(str::trim).filter(|s| !s.is_empty())?;
        let app_url = app_url
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())?;
        let export_endpoint = match export_endpoint.map(str::trim).filter(|s| !s.is_empty()) {
            Some(p) if p.starts_with('/') => p.to_string(),
            Some(p) => format!("/{}", p),
            None => DEFAULT_EXPORT_ENDPOINT.to_string(),
        };
        Some(Self {
            app_name: app_name.to_string(),
            app_url: app_url.to_string(),
            export_endpoint,
        })
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
