use domain::PlacementError;
use thiserror::Error;

/// Errors that can occur when interacting with a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The placement was rejected before anything was written.
    #[error(transparent)]
    Placement(#[from] PlacementError),

    /// A transient concurrency conflict (lost race, deadlock,
    /// serialization failure). The unit was fully rolled back and the
    /// identical request is safe to retry.
    #[error("placement conflict: {reason}")]
    Conflict { reason: String },

    /// A stored row could not be decoded into its domain type.
    #[error("invalid row data: {0}")]
    InvalidRow(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
