use crate::storage::StorageError;
use uuid::Uuid;

/// Failures that end a sync attempt or a registry call.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed to fetch export from {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch export from {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to decode export from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Export from {url} is not a JSON object")]
    PayloadNotObject { url: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Source not found: {0}")]
    SourceNotFound(Uuid),

    #[error("app_name and app_url are required")]
    InvalidRegistration,
}
