use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a record store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(Uuid),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by timer and task operations
#[derive(Error, Debug)]
pub enum BillableError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timer is already running")]
    AlreadyRunning,

    #[error("timer is not running")]
    NotRunning,

    #[error("session expired, sign in again")]
    SessionExpired,

    /// The write was attempted and failed; nothing was applied locally.
    #[error("failed to save changes: {0}")]
    RemoteWrite(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type BillableResult<T> = Result<T, BillableError>;
