// Block validation

use crate::core::{Block, Transaction};
use crate::consensus::ProofOfWork;
use std::fmt;

/// Reasons a block is rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoTransactions,
    MissingCoinbase,
    MultipleCoinbase,
    EmptyTransaction,
    InvalidCoinbaseReward { expected: u64, actual: u64 },
    InvalidTransactionsDigest,
    InvalidDifficulty { expected: u32, actual: u32 },
    HashMismatch,
    InvalidProofOfWork,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoTransactions => write!(f, "block has no transactions"),
            Self::MissingCoinbase => write!(f, "first transaction is not a coinbase"),
            Self::MultipleCoinbase => write!(f, "more than one coinbase transaction"),
            Self::EmptyTransaction => write!(f, "transaction without inputs or outputs"),
            Self::InvalidCoinbaseReward { expected, actual } => {
                write!(f, "coinbase pays {}, block reward is {}", actual, expected)
            }
            Self::InvalidTransactionsDigest => write!(f, "transactions digest mismatch"),
            Self::InvalidDifficulty { expected, actual } => {
                write!(f, "difficulty {} bits, expected {}", actual, expected)
            }
            Self::HashMismatch => write!(f, "stored hash does not match header"),
            Self::InvalidProofOfWork => write!(f, "hash is not below the target"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Block validator
#[derive(Debug, Clone, Copy)]
pub struct BlockValidator {
    pow: ProofOfWork,
    block_reward: u64,
}

impl BlockValidator {
    pub fn new(pow: ProofOfWork, block_reward: u64) -> Self {
        Self { pow, block_reward }
    }

    /// Structural checks on a batch about to be mined into a block
    pub fn validate_transactions(&self, transactions: &[Transaction]) -> Result<(), ValidationError> {
        // Must have at least one transaction
        if transactions.is_empty() {
            return Err(ValidationError::NoTransactions);
        }

        // First transaction must be coinbase, and the only one
        if !transactions[0].is_coinbase() {
            return Err(ValidationError::MissingCoinbase);
        }
        if transactions[1..].iter().any(Transaction::is_coinbase) {
            return Err(ValidationError::MultipleCoinbase);
        }

        for tx in transactions {
            if tx.inputs().is_empty() || tx.outputs().is_empty() {
                return Err(ValidationError::EmptyTransaction);
            }
        }

        let reward = transactions[0].total_output_value();
        if reward != self.block_reward {
            return Err(ValidationError::InvalidCoinbaseReward {
                expected: self.block_reward,
                actual: reward,
            });
        }

        Ok(())
    }

    /// Validate a complete block, never trusting its stored hash
    pub fn validate_block(&self, block: &Block) -> Result<(), ValidationError> {
        self.validate_transactions(&block.transactions)?;

        if Block::hash_transactions(&block.transactions) != block.header.transactions_digest {
            return Err(ValidationError::InvalidTransactionsDigest);
        }

        if block.header.difficulty_bits != self.pow.difficulty_bits() {
            return Err(ValidationError::InvalidDifficulty {
                expected: self.pow.difficulty_bits(),
                actual: block.header.difficulty_bits,
            });
        }

        if block.header.hash() != block.hash {
            return Err(ValidationError::HashMismatch);
        }

        if !self.pow.validate(block) {
            return Err(ValidationError::InvalidProofOfWork);
        }

        Ok(())
    }
}
