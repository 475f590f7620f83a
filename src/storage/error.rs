use crate::ports::outbound::DatabaseError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    External(#[from] DatabaseError),
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// The external not-found outcome, which callers translate into a
    /// cache invalidation.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::External(DatabaseError::NotFound { .. }))
    }

    /// A transient external failure; retry on a future scan.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::External(e) if e.is_transient())
    }
}
