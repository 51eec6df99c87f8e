use thiserror::Error;

/// Errors raised by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write conflicted with a concurrent one (e.g. a unique constraint).
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// A record that the unit of work expected to exist is missing.
    #[error("Missing {entity} record: {id}")]
    MissingRecord { entity: &'static str, id: String },

    /// The backend failed.
    #[error("Database error: {0}")]
    Database(Box<dyn std::error::Error + Send + Sync>),

    /// Applying schema migrations failed.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A stored document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Wraps a backend error.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoreError::Database(Box::new(err))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
