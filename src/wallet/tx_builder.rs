// Transaction builder

use crate::core::{Transaction, TxInput, TxOutput};
use crate::error::{LedgerError, Result};
use crate::storage::{Blockchain, UtxoIndex};
use crate::wallet::Address;

/// Builds coinbase and spend transactions against a chain
pub struct TransactionBuilder<'a> {
    chain: &'a Blockchain,
}

impl<'a> TransactionBuilder<'a> {
    /// Create a new transaction builder
    pub fn new(chain: &'a Blockchain) -> Self {
        Self { chain }
    }

    /// Reward transaction paying the chain's block reward to `to`.
    /// An empty memo gets a random suffix so coinbase ids stay unique.
    pub fn coinbase(&self, to: &Address, memo: &str) -> Result<Transaction> {
        let pubkey_hash = to.pubkey_hash()?;
        let memo = if memo.is_empty() {
            let salt: [u8; 8] = rand::random();
            format!("Reward to '{}' {}", to, hex::encode(salt))
        } else {
            memo.to_string()
        };

        Ok(Transaction::coinbase(&pubkey_hash, memo.into_bytes(), self.chain.block_reward()))
    }

    /// Build a transaction moving `amount` from `from` to `to`.
    ///
    /// Outputs are taken greedily in walk order until they cover the
    /// amount; any excess comes back to `from` as a change output.
    pub fn build(&self, from: &Address, to: &Address, amount: u64) -> Result<Transaction> {
        // Both addresses are checked before touching storage
        let from_hash = from.pubkey_hash()?;
        let to_hash = to.pubkey_hash()?;
        if amount == 0 {
            return Err(LedgerError::InvalidTransaction("amount must be positive".to_string()));
        }

        let utxo = UtxoIndex::new(self.chain);
        let (accumulated, outpoints) = utxo.find_spendable_outputs(&from_hash, amount)?;

        let inputs: Vec<TxInput> = outpoints
            .iter()
            .map(|outpoint| TxInput::new(outpoint.txid, outpoint.vout, from_hash.to_vec()))
            .collect();

        // Payment output
        let mut outputs = vec![TxOutput::new(amount, to_hash.to_vec())];

        // Change output (if any)
        let change = accumulated - amount;
        if change > 0 {
            outputs.push(TxOutput::new(change, from_hash.to_vec()));
        }

        let tx = Transaction::new(inputs, outputs);
        log::debug!("Built transaction {}: {} -> {} ({} inputs, change {})",
            tx.id(), from, to, tx.inputs().len(), change);
        Ok(tx)
    }

    /// Get balance for address
    pub fn get_balance(&self, address: &Address) -> Result<u64> {
        let pubkey_hash = address.pubkey_hash()?;
        UtxoIndex::new(self.chain).get_balance(&pubkey_hash)
    }
}
