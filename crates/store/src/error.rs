use thiserror::Error;

/// Uniform error type for all storage backends.
///
/// Backends translate their native failures into these four cases; the
/// ledger turns them into domain errors. Raw driver errors never cross the
/// store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        StoreError::Backend(message.into())
    }
}
