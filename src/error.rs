//! Error types for ledgerd

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Wallet 'from' not found")]
    FromWalletNotFound,
    #[error("Wallet 'to' not found")]
    ToWalletNotFound,
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Storage conflict: {0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cryptographic error: {0}")]
    CryptoError(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::DatabaseBusy
                    || e.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                LedgerError::Conflict(err.to_string())
            }
            _ => LedgerError::DatabaseError(err.to_string()),
        }
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, LedgerError>;
