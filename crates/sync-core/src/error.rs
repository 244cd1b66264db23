use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("Failed to encode or decode state record: {0}")]
    Codec(String),

    #[error("State lock poisoned")]
    Poisoned,
}

impl From<bincode::Error> for StateStoreError {
    fn from(err: bincode::Error) -> Self {
        StateStoreError::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for StateStoreError {
    fn from(err: serde_json::Error) -> Self {
        StateStoreError::Codec(err.to_string())
    }
}

/// Failure of a collaborator (remote source or local cache) while fetching
/// a page or a secondary record.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {message}")]
    Network { message: String, retryable: bool },

    #[error("Storage error: {0}")]
    Storage(#[from] StateStoreError),

    #[error("Remote has no record for '{0}'")]
    NotFound(String),
}

impl FetchError {
    pub fn network(message: impl Into<String>) -> Self {
        FetchError::Network {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn network_fatal(message: impl Into<String>) -> Self {
        FetchError::Network {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network { retryable, .. } => *retryable,
            FetchError::Storage(StateStoreError::Sled(sled::Error::Io(_))) => true,
            _ => false,
        }
    }
}

impl From<sled::Error> for FetchError {
    fn from(err: sled::Error) -> Self {
        FetchError::Storage(StateStoreError::Sled(err))
    }
}
