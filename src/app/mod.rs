pub mod coordinator;
pub mod error;
pub mod registry;

pub use coordinator::SyncCoordinator;
pub use error::SyncError;
pub use registry::SyncRegistry;
