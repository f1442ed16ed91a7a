use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("No rewards to claim")]
    NoRewardsToClaim,

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid oracle secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Reward overflow")]
    RewardOverflow,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt ledger state: {0}")]
    Corrupt(String),
}

impl LedgerError {
    /// Whether the caller may retry the same request unchanged
    ///
    /// Only storage failures qualify: I/O errors, and a database that is
    /// busy, locked or out of space. Signature, payload and balance
    /// rejections will fail again and must surface to the requester.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(_) => true,
            Self::Database(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::DatabaseBusy
                    | ErrorCode::DatabaseLocked
                    | ErrorCode::SystemIoFailure
                    | ErrorCode::DiskFull
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
