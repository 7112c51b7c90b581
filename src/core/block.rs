// Block data structures

use crate::core::{Hash256, sha256, Transaction, Serializable};
use std::io::{self, Read};
use std::time::{SystemTime, UNIX_EPOCH};
use super::serialize::{write_varint, read_varint, read_array};

/// Encoded header length: prev hash, tx digest, timestamp, bits, nonce
pub const HEADER_SIZE: usize = 32 + 32 + 8 + 4 + 8;

/// Block header - the fields covered by the proof of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Hash of the previous block, zero for genesis
    pub prev_block_hash: Hash256,
    /// SHA-256 over the concatenated ids of the block's transactions
    pub transactions_digest: Hash256,
    /// Block timestamp (Unix epoch seconds)
    pub timestamp: i64,
    /// Number of leading zero bits the block hash must have
    pub difficulty_bits: u32,
    /// Nonce for proof-of-work
    pub nonce: u64,
}

impl BlockHeader {
    /// Create a new block header
    pub fn new(
        prev_block_hash: Hash256,
        transactions_digest: Hash256,
        timestamp: i64,
        difficulty_bits: u32,
        nonce: u64,
    ) -> Self {
        Self {
            prev_block_hash,
            transactions_digest,
            timestamp,
            difficulty_bits,
            nonce,
        }
    }

    /// Calculate the hash of this block header
    pub fn hash(&self) -> Hash256 {
        sha256(&self.serialize())
    }
}

impl Serializable for BlockHeader {
    fn encode(&self, buf: &mut Vec<u8>) {
        buf.reserve(HEADER_SIZE);
        buf.extend_from_slice(self.prev_block_hash.as_bytes());
        buf.extend_from_slice(self.transactions_digest.as_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.difficulty_bits.to_be_bytes());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
    }

    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            prev_block_hash: Hash256::new(read_array(reader)?),
            transactions_digest: Hash256::new(read_array(reader)?),
            timestamp: i64::from_be_bytes(read_array(reader)?),
            difficulty_bits: u32::from_be_bytes(read_array(reader)?),
            nonce: u64::from_be_bytes(read_array(reader)?),
        })
    }
}

/// Block - header, transactions and the hash found by mining
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
    /// Stored hash; validators recompute it from the header
    pub hash: Hash256,
}

impl Block {
    pub fn new(header: BlockHeader, transactions: Vec<Transaction>, hash: Hash256) -> Self {
        Self {
            header,
            transactions,
            hash,
        }
    }

    /// Unmined header for a block on top of `prev_block_hash`, nonce 0
    pub fn template(
        prev_block_hash: Hash256,
        transactions: &[Transaction],
        difficulty_bits: u32,
    ) -> BlockHeader {
        BlockHeader::new(
            prev_block_hash,
            Self::hash_transactions(transactions),
            now(),
            difficulty_bits,
            0,
        )
    }

    /// SHA-256 over the transaction ids in block order
    pub fn hash_transactions(transactions: &[Transaction]) -> Hash256 {
        let mut ids = Vec::with_capacity(transactions.len() * 32);
        for tx in transactions {
            ids.extend_from_slice(tx.id().as_bytes());
        }
        sha256(&ids)
    }

    /// Check if this is the genesis block
    pub fn is_genesis(&self) -> bool {
        self.header.prev_block_hash.is_zero()
    }
}

impl Serializable for Block {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.header.encode(buf);
        buf.extend_from_slice(self.hash.as_bytes());

        write_varint(buf, self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.encode(buf);
        }
    }

    fn decode<R: Read + ?Sized>(reader: &mut R) -> io::Result<Self> {
        let header = BlockHeader::decode(reader)?;
        let hash = Hash256::new(read_array(reader)?);

        let tx_count = read_varint(reader)?;
        let mut transactions = Vec::new();
        for _ in 0..tx_count {
            transactions.push(Transaction::decode(reader)?);
        }

        Ok(Self {
            header,
            transactions,
            hash,
        })
    }
}

fn now() -> i64 {
    // A clock before 1970 only affects the informational timestamp
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
