use thiserror::Error;

/// Errors surfaced to whatever front-end drives the [`crate::application::LedgerStore`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Zero, negative, or unparseable amount. Rejected before persistence.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// The backing database could not be opened or initialized.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// An add or delete did not commit.
    #[error("Could not save changes: {0:#}")]
    PersistenceFailure(anyhow::Error),

    #[error("Database error: {0:#}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_))
    }
}
