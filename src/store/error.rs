//! Error types for the storage layer
//!
//! Lookups on absent keys never produce an error; these variants only cover
//! the cases where the underlying file store cannot be used.

use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// The SQLite handle could not be opened, queried or committed
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// The data directory could not be prepared
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored guild document no longer parses
    #[error("Corrupt configuration document for guild {guild_id}: {source}")]
    CorruptDocument {
        guild_id: u64,
        #[source]
        source: serde_json::Error,
    },

    /// The blocking task running a store operation panicked or was cancelled
    #[error("Storage worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// A document could not be encoded for storage
    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = StoreError::from(rusqlite::Error::InvalidQuery);
        assert!(error.to_string().starts_with("Storage unavailable"));

        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = StoreError::CorruptDocument {
            guild_id: 7,
            source,
        };
        assert!(
            error
                .to_string()
                .starts_with("Corrupt configuration document for guild 7")
        );
    }
}
