use sync_core::error::StateStoreError;
use sync_runtime::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read input file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse {what} as JSON: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Failed to open the sync database: {0}")]
    Database(#[from] sled::Error),

    #[error("State store error: {0}")]
    State(#[from] StateStoreError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Shutdown requested")]
    ShutdownRequested,
}
