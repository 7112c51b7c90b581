// Unspent transaction outputs, derived by walking the chain
//
// Every query walks tip to genesis once, so its cost grows with chain
// length. There is no persisted index to keep consistent with the blocks.

use crate::core::{Hash256, TxOutput};
use crate::error::{LedgerError, Result};
use crate::storage::Blockchain;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;

/// UTXO identifier - transaction hash + output index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash256, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Read-only view over a chain answering "what is unspent"
pub struct UtxoIndex<'a> {
    chain: &'a Blockchain,
}

impl<'a> UtxoIndex<'a> {
    pub fn new(chain: &'a Blockchain) -> Self {
        Self { chain }
    }

    /// Visit every unspent output, newest block first and in block order
    /// within a block, until `visit` breaks.
    ///
    /// A spending input is always in the same block as the output it spends
    /// or a later one. Inputs of a block are recorded before its outputs are
    /// looked at, so every output reaching `visit` is truly unspent.
    fn walk<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(OutPoint, &TxOutput) -> ControlFlow<()>,
    {
        let mut spent: HashSet<OutPoint> = HashSet::new();
        let mut blocks_visited = 0u64;

        for block in self.chain.iter()? {
            let block = block?;
            blocks_visited += 1;

            for tx in &block.transactions {
                if tx.is_coinbase() {
                    continue;
                }
                for input in tx.inputs() {
                    spent.insert(OutPoint::new(input.txid, input.vout));
                }
            }

            for tx in &block.transactions {
                for (index, output) in tx.outputs().iter().enumerate() {
                    let outpoint = OutPoint::new(tx.id(), index as u32);
                    if spent.contains(&outpoint) {
                        continue;
                    }
                    if visit(outpoint, output).is_break() {
                        log::debug!("UTXO walk stopped early after {} blocks", blocks_visited);
                        return Ok(());
                    }
                }
            }
        }

        log::debug!("UTXO walk visited {} blocks, {} spent outputs", blocks_visited, spent.len());
        Ok(())
    }

    /// All unspent outputs locked to `pubkey_hash`, in walk order
    pub fn find_unspent_outputs(&self, pubkey_hash: &[u8]) -> Result<Vec<(OutPoint, TxOutput)>> {
        let mut found = Vec::new();
        self.walk(|outpoint, output| {
            if output.is_locked_with(pubkey_hash) {
                found.push((outpoint, output.clone()));
            }
            ControlFlow::Continue(())
        })?;
        Ok(found)
    }

    /// Every unspent output on the chain, whoever owns it
    pub fn find_all_unspent(&self) -> Result<HashMap<OutPoint, TxOutput>> {
        let mut found = HashMap::new();
        self.walk(|outpoint, output| {
            found.insert(outpoint, output.clone());
            ControlFlow::Continue(())
        })?;
        Ok(found)
    }

    /// Collect outputs of `pubkey_hash` in walk order until they cover
    /// `amount`. Returns the accumulated value and the chosen outputs.
    pub fn find_spendable_outputs(&self, pubkey_hash: &[u8], amount: u64) -> Result<(u64, Vec<OutPoint>)> {
        let mut accumulated = 0u64;
        let mut chosen = Vec::new();

        if amount > 0 {
            self.walk(|outpoint, output| {
                if output.is_locked_with(pubkey_hash) {
                    accumulated = accumulated.saturating_add(output.value);
                    chosen.push(outpoint);
                    if accumulated >= amount {
                        return ControlFlow::Break(());
                    }
                }
                ControlFlow::Continue(())
            })?;
        }

        if accumulated < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: accumulated,
            });
        }
        Ok((accumulated, chosen))
    }

    /// Sum of every unspent output locked to `pubkey_hash`
    pub fn get_balance(&self, pubkey_hash: &[u8]) -> Result<u64> {
        let mut balance = 0u64;
        self.walk(|_, output| {
            if output.is_locked_with(pubkey_hash) {
                balance = balance.saturating_add(output.value);
            }
            ControlFlow::Continue(())
        })?;
        Ok(balance)
    }
}
