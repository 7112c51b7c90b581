// Proof of Work implementation

use crate::core::{Block, BlockHeader, Hash256};
use crate::error::{LedgerError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Nonces tried between two looks at the cancellation flag
const CANCEL_POLL_INTERVAL: u64 = 4096;

/// Difficulty target: `1 << (256 - bits)` as a 256-bit big-endian integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    bits: u32,
    bytes: [u8; 32],
}

impl Target {
    /// Build the target for `bits` leading zero bits (1..=255)
    pub fn from_bits(bits: u32) -> Result<Self> {
        if !(1..=255).contains(&bits) {
            return Err(LedgerError::InvalidDifficulty(bits));
        }

        let position = 256 - bits as usize;
        let mut bytes = [0u8; 32];
        bytes[31 - position / 8] = 1 << (position % 8);

        Ok(Self { bits, bytes })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn to_hash256(&self) -> Hash256 {
        Hash256::new(self.bytes)
    }

    /// Check if a hash meets this target (hash < target)
    #[inline]
    pub fn is_valid_hash(&self, hash: &Hash256) -> bool {
        // Lexicographic order on big-endian bytes is numeric order
        hash.as_bytes() < &self.bytes
    }
}

/// Proof of Work miner
#[derive(Debug, Clone, Copy)]
pub struct ProofOfWork {
    /// Fixed difficulty target
    pub target: Target,
    /// Highest nonce tried before giving up
    pub max_nonce: u64,
}

impl ProofOfWork {
    /// Create a new miner with fixed difficulty
    pub fn new(difficulty_bits: u32, max_nonce: u64) -> Result<Self> {
        Ok(Self {
            target: Target::from_bits(difficulty_bits)?,
            max_nonce,
        })
    }

    pub fn difficulty_bits(&self) -> u32 {
        self.target.bits()
    }

    /// Find the first nonce whose header hash is below the target
    pub fn mine(&self, header: &BlockHeader) -> Result<MiningResult> {
        self.search(header, None)
    }

    /// Like `mine`, but gives up with `MiningCancelled` once `cancel` is set
    pub fn mine_with_cancel(&self, header: &BlockHeader, cancel: &AtomicBool) -> Result<MiningResult> {
        self.search(header, Some(cancel))
    }

    fn search(&self, header: &BlockHeader, cancel: Option<&AtomicBool>) -> Result<MiningResult> {
        let start_time = Instant::now();
        let mut candidate = header.clone();
        candidate.difficulty_bits = self.target.bits();
        let mut attempts = 0u64;

        for nonce in 0..=self.max_nonce {
            if let Some(flag) = cancel {
                if attempts % CANCEL_POLL_INTERVAL == 0 && flag.load(Ordering::Relaxed) {
                    log::warn!("Mining cancelled after {} attempts", attempts);
                    return Err(LedgerError::MiningCancelled { attempts });
                }
            }

            candidate.nonce = nonce;
            let hash = candidate.hash();
            attempts += 1;

            if self.target.is_valid_hash(&hash) {
                return Ok(MiningResult {
                    header: candidate,
                    hash,
                    attempts,
                    duration: start_time.elapsed(),
                });
            }

            // Progress indicator every 100k attempts
            if attempts % 100_000 == 0 {
                let elapsed = start_time.elapsed();
                log::debug!("Mining attempts: {} ({:.1} KH/s)",
                    attempts,
                    attempts as f64 / elapsed.as_secs_f64() / 1000.0
                );
            }
        }

        Err(LedgerError::ProofOfWorkExhausted { max_nonce: self.max_nonce })
    }

    /// Verify that a block header satisfies PoW at this difficulty
    pub fn verify_header(&self, header: &BlockHeader) -> bool {
        header.difficulty_bits == self.target.bits() && self.target.is_valid_hash(&header.hash())
    }

    /// Recompute the block hash from its fields; the stored hash must match
    /// and fall below the target
    pub fn validate(&self, block: &Block) -> bool {
        let hash = block.header.hash();
        hash == block.hash
            && block.header.difficulty_bits == self.target.bits()
            && self.target.is_valid_hash(&hash)
    }
}

/// Mining result
#[derive(Debug)]
pub struct MiningResult {
    /// Header with the winning nonce filled in
    pub header: BlockHeader,
    pub hash: Hash256,
    pub attempts: u64,
    pub duration: Duration,
}

impl MiningResult {
    pub fn nonce(&self) -> u64 {
        self.header.nonce
    }

    /// Calculate hash rate (hashes per second)
    pub fn hash_rate(&self) -> f64 {
        self.attempts as f64 / self.duration.as_secs_f64().max(f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> BlockHeader {
        BlockHeader::new(Hash256::zero(), Hash256::new([5; 32]), 1234567890, 8, 0)
    }

    #[test]
    fn test_target_conversion() {
        let target = Target::from_bits(8).unwrap();
        let mut expected = [0u8; 32];
        expected[0] = 0x01;
        assert_eq!(target.to_hash256(), Hash256::new(expected));

        let target = Target::from_bits(1).unwrap();
        assert_eq!(target.to_hash256().as_bytes()[0], 0x80);

        let target = Target::from_bits(255).unwrap();
        assert_eq!(target.to_hash256().as_bytes()[31], 0x02);
    }

    #[test]
    fn test_target_rejects_bad_difficulty() {
        assert!(matches!(Target::from_bits(0), Err(LedgerError::InvalidDifficulty(0))));
        assert!(matches!(Target::from_bits(256), Err(LedgerError::InvalidDifficulty(256))));
    }

    #[test]
    fn test_target_validation() {
        let target = Target::from_bits(8).unwrap();

        assert!(target.is_valid_hash(&Hash256::zero()));
        assert!(!target.is_valid_hash(&Hash256::new([0xff; 32])));

        // The target itself is not strictly below the target
        assert!(!target.is_valid_hash(&target.to_hash256()));
        let mut just_below = [0xff; 32];
        just_below[0] = 0x00;
        assert!(target.is_valid_hash(&Hash256::new(just_below)));
    }

    #[test]
    fn test_pow_mining_easy() {
        let pow = ProofOfWork::new(8, u64::MAX).unwrap();

        let result = pow.mine(&header()).unwrap();
        assert!(result.hash.leading_zeros() >= 8);
        assert_eq!(result.hash, result.header.hash());
        assert!(pow.verify_header(&result.header));
        assert_eq!(result.attempts, result.nonce() + 1);
    }

    #[test]
    fn test_mining_is_deterministic() {
        let pow = ProofOfWork::new(8, u64::MAX).unwrap();
        let first = pow.mine(&header()).unwrap();
        let second = pow.mine(&header()).unwrap();
        assert_eq!(first.nonce(), second.nonce());
        assert_eq!(first.hash, second.hash);
    }

    #[test]
    fn test_nonce_space_exhausted() {
        let pow = ProofOfWork::new(255, 50).unwrap();
        let err = pow.mine(&header()).unwrap_err();
        assert!(matches!(err, LedgerError::ProofOfWorkExhausted { max_nonce: 50 }));
    }

    #[test]
    fn test_mining_cancelled() {
        let pow = ProofOfWork::new(255, u64::MAX).unwrap();
        let cancel = AtomicBool::new(true);
        let err = pow.mine_with_cancel(&header(), &cancel).unwrap_err();
        assert!(matches!(err, LedgerError::MiningCancelled { attempts: 0 }));
    }

    #[test]
    fn test_validate_rejects_tampering() {
        let pow = ProofOfWork::new(8, u64::MAX).unwrap();
        let result = pow.mine(&header()).unwrap();
        let block = Block::new(result.header, vec![], result.hash);
        assert!(pow.validate(&block));

        let mut forged = block.clone();
        forged.header.timestamp += 1;
        assert!(!pow.validate(&forged));

        let mut wrong_hash = block.clone();
        wrong_hash.hash = Hash256::zero();
        assert!(!pow.validate(&wrong_hash));

        // Same block judged at a different difficulty
        let harder = ProofOfWork::new(9, u64::MAX).unwrap();
        assert!(!harder.validate(&block));
    }
}
