//! Preference storage error types

/// Errors that can occur while reading or writing persisted preferences.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The SQLite backend failed.
    #[error("database error: {0}")]
    Database(#[from] async_sqlite::Error),

    /// The record could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(serde_json::Error),

    /// The stored bytes could not be decoded.
    #[error("deserialization error: {0}")]
    Deserialization(serde_json::Error),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a generic backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}
