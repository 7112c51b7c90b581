// Single-node proof-of-work ledger

pub mod core;
pub mod consensus;
pub mod storage;
pub mod wallet;
pub mod config;
pub mod error;
mod cli;

// Re-exports for convenience
pub use core::{Block, BlockHeader, Hash256, Transaction, TxInput, TxOutput};
pub use consensus::{ProofOfWork, Target, BlockValidator, ValidationError};
pub use storage::{Blockchain, BlockchainIterator, UtxoIndex, OutPoint};
pub use wallet::{Address, Keystore, KeyPair, TransactionBuilder};
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use cli::{Cli, CliHandler, Commands};
