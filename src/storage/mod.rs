// Storage layer: persisted chain and the unspent-output view over it

mod blockchain_db;
mod utxo_set;

pub use blockchain_db::{Blockchain, BlockchainIterator};
pub use utxo_set::{UtxoIndex, OutPoint};
