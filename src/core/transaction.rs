// Transaction data structures

use crate::core::{Hash256, sha256, Serializable};
use std::io::{self, Read};
use super::serialize::{write_varint, read_varint, write_var_bytes, read_var_bytes, read_array};

/// Output index carried by the coinbase input; the all-ones u32 is -1 as an i32
pub const COINBASE_INDEX: u32 = u32::MAX;

/// Transaction input - references a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInput {
    /// Id of the transaction holding the referenced output
    pub txid: Hash256,
    /// Index of the output in that transaction
    pub vout: u32,
    /// Unlocking data: the spender's pubkey hash, or the memo of a coinbase
    pub unlocking_data: Vec<u8>,
}

impl TxInput {
    /// Create a new transaction input
    pub fn new(txid: Hash256, vout: u32, unlocking_data: Vec<u8>) -> Self {
        Self {
            txid,
            vout,
            unlocking_data,
        }
    }

    /// Create a coinbase input (for mining rewards)
    pub fn coinbase(memo: Vec<u8>) -> Self {
        Self {
            txid: Hash256::zero(),
            vout: COINBASE_INDEX,
            unlocking_data: memo,
        }
    }

    /// Check if this is a coinbase input
    pub fn is_coinbase(&self) -> bool {
        self.txid.is_zero() && self.vout == COINBASE_INDEX
    }

    /// Whether this input was unlocked by the owner of `pubkey_hash`
    pub fn uses_key(&self, pubkey_hash: &[u8]) -> bool {
        !self.is_coinbase() && self.unlocking_data == pubkey_hash
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.txid.as_bytes());
        buf.extend_from_slice(&self.vout.to_be_bytes());
        write_var_bytes(buf, &self.unlocking_data);
    }

    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let txid = Hash256::new(read_array(reader)?);
        let vout = u32::from_be_bytes(read_array(reader)?);
        let unlocking_data = read_var_bytes(reader)?;

        Ok(Self {
            txid,
            vout,
            unlocking_data,
        })
    }
}

/// Transaction output - an amount locked to a pubkey hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: u64,
    /// Hash an address must match to claim this output
    pub unlock_hash: Vec<u8>,
}

impl TxOutput {
    /// Create a new transaction output
    pub fn new(value: u64, unlock_hash: Vec<u8>) -> Self {
        Self {
            value,
            unlock_hash,
        }
    }

    /// Check whether the owner of `pubkey_hash` may spend this output
    pub fn is_locked_with(&self, pubkey_hash: &[u8]) -> bool {
        self.unlock_hash == pubkey_hash
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.value.to_be_bytes());
        write_var_bytes(buf, &self.unlock_hash);
    }

    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let value = u64::from_be_bytes(read_array(reader)?);
        let unlock_hash = read_var_bytes(reader)?;

        Ok(Self {
            value,
            unlock_hash,
        })
    }
}

/// Transaction
///
/// The id is derived from the inputs and outputs when the transaction is
/// built or decoded, so it can never disagree with the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: Hash256,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        let mut tx = Self {
            id: Hash256::zero(),
            inputs,
            outputs,
        };
        tx.id = sha256(&tx.serialize());
        tx
    }

    /// Create a coinbase transaction paying `reward` to `pubkey_hash`
    pub fn coinbase(pubkey_hash: &[u8], memo: Vec<u8>, reward: u64) -> Self {
        Self::new(
            vec![TxInput::coinbase(memo)],
            vec![TxOutput::new(reward, pubkey_hash.to_vec())],
        )
    }

    pub fn id(&self) -> Hash256 {
        self.id
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    /// Check if this is a coinbase transaction
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].is_coinbase()
    }

    /// Calculate total output value
    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|out| out.value).sum()
    }
}

impl Serializable for Transaction {
    fn encode(&self, buf: &mut Vec<u8>) {
        write_varint(buf, self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(buf);
        }

        write_varint(buf, self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(buf);
        }
    }

    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let input_count = read_varint(reader)?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            inputs.push(TxInput::decode(reader)?);
        }

        let output_count = read_varint(reader)?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(TxOutput::decode(reader)?);
        }

        Ok(Self::new(inputs, outputs))
    }
}
