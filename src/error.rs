// Error types for the ledger engine

use crate::core::Hash256;
use sled::transaction::TransactionError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Corrupted chain state: {0}")]
    Corrupted(String),

    #[error("No existing blockchain found, create one first")]
    ChainNotFound,

    #[error("Chain tip moved away from {0} during append")]
    StaleTip(Hash256),

    #[error("Block not found: {0}")]
    BlockNotFound(Hash256),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid address checksum")]
    InvalidChecksum,

    #[error("Proof of work exhausted the nonce space (max nonce {max_nonce})")]
    ProofOfWorkExhausted { max_nonce: u64 },

    #[error("Mining cancelled after {attempts} attempts")]
    MiningCancelled { attempts: u64 },

    #[error("Invalid difficulty: {0} bits (expected 1..=255)")]
    InvalidDifficulty(u32),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Key error: {0}")]
    Key(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<TransactionError<LedgerError>> for LedgerError {
    fn from(err: TransactionError<LedgerError>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => LedgerError::Storage(e),
        }
    }
}

impl From<crate::consensus::ValidationError> for LedgerError {
    fn from(err: crate::consensus::ValidationError) -> Self {
        LedgerError::InvalidBlock(err.to_string())
    }
}
