// Ledger configuration

use crate::consensus::ProofOfWork;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIFFICULTY_BITS: u32 = 20;
pub const DEFAULT_BLOCK_REWARD: u64 = 20;
pub const GENESIS_COINBASE_DATA: &str =
    "The Times 03/Jan/2009 Chancellor on brink of second bailout for banks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    /// Leading zero bits required of every block hash
    pub difficulty_bits: u32,
    /// Upper bound of the nonce search
    pub max_nonce: u64,
    /// Value minted by each coinbase transaction
    pub block_reward: u64,
    /// Memo carried by the genesis coinbase
    pub genesis_memo: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            difficulty_bits: DEFAULT_DIFFICULTY_BITS,
            max_nonce: u64::MAX,
            block_reward: DEFAULT_BLOCK_REWARD,
            genesis_memo: GENESIS_COINBASE_DATA.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load a JSON config file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=255).contains(&self.difficulty_bits) {
            return Err(LedgerError::InvalidDifficulty(self.difficulty_bits));
        }
        if self.block_reward == 0 {
            return Err(LedgerError::Config("block_reward must be positive".to_string()));
        }
        if self.max_nonce == 0 {
            return Err(LedgerError::Config("max_nonce must be positive".to_string()));
        }
        Ok(())
    }

    pub fn proof_of_work(&self) -> Result<ProofOfWork> {
        ProofOfWork::new(self.difficulty_bits, self.max_nonce)
    }

    /// sled directory holding blocks and chain metadata
    pub fn chain_path(&self) -> PathBuf {
        self.data_dir.join("chain")
    }

    pub fn wallet_path(&self) -> PathBuf {
        self.data_dir.join("wallets.json")
    }
}
