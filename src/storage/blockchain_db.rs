// Blockchain database using sled

use crate::config::LedgerConfig;
use crate::consensus::{BlockValidator, ProofOfWork};
use crate::core::{Block, Hash256, Serializable, Transaction, TxOutput};
use crate::error::{LedgerError, Result};
use crate::storage::{OutPoint, UtxoIndex};
use crate::wallet::Address;
use sled::transaction::{abort, ConflictableTransactionResult};
use sled::{Db, Transactional, Tree};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;

const BLOCKS_TREE: &str = "blocks";
const META_TREE: &str = "meta";
const TIP_KEY: &[u8] = b"tip";
const HEIGHT_KEY: &[u8] = b"height";
const DIFFICULTY_KEY: &[u8] = b"difficulty_bits";
const REWARD_KEY: &[u8] = b"block_reward";

/// Open the sled store at `path`. Every commit is flushed explicitly, so
/// the periodic flusher thread is off and the directory lock is released
/// as soon as the `Db` is dropped.
fn open_store(path: &Path) -> Result<Db> {
    Ok(sled::Config::new().path(path).flush_every_ms(None).open()?)
}

/// Persistent chain: blocks keyed by hash plus the tip pointer
pub struct Blockchain {
    db: Db,
    blocks: Tree,
    meta: Tree,
    pow: ProofOfWork,
    validator: BlockValidator,
    block_reward: u64,
    /// One appender at a time; readers never take it
    write_lock: Mutex<()>,
}

impl Blockchain {
    /// Open the chain under `config.chain_path()`, creating it with a
    /// genesis block paying `genesis_address` if the store is empty
    pub fn open(config: &LedgerConfig, genesis_address: &Address) -> Result<Self> {
        let db = open_store(&config.chain_path())?;
        Self::init(db, config, Some(genesis_address))
    }

    /// Open an existing chain; an empty store is `ChainNotFound`
    pub fn open_existing(config: &LedgerConfig) -> Result<Self> {
        if !config.chain_path().exists() {
            return Err(LedgerError::ChainNotFound);
        }
        let db = open_store(&config.chain_path())?;
        Self::init(db, config, None)
    }

    /// Create an in-memory chain (for testing)
    pub fn temporary(config: &LedgerConfig, genesis_address: &Address) -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::init(db, config, Some(genesis_address))
    }

    fn init(db: Db, config: &LedgerConfig, genesis_address: Option<&Address>) -> Result<Self> {
        config.validate()?;
        let pow = config.proof_of_work()?;

        let chain = Self {
            blocks: db.open_tree(BLOCKS_TREE)?,
            meta: db.open_tree(META_TREE)?,
            db,
            pow,
            validator: BlockValidator::new(pow, config.block_reward),
            block_reward: config.block_reward,
            write_lock: Mutex::new(()),
        };

        if chain.meta.contains_key(TIP_KEY)? {
            let tip = chain.tip()?;
            if !chain.has_block(&tip)? {
                return Err(LedgerError::Corrupted(format!("tip {} has no matching block", tip)));
            }
            chain.check_parameters(config)?;
            log::debug!("Opened chain at height {} (tip {})", chain.height()?, tip);
        } else if !chain.blocks.is_empty() {
            return Err(LedgerError::Corrupted(
                "blocks are stored but the tip pointer is missing".to_string(),
            ));
        } else {
            let address = genesis_address.ok_or(LedgerError::ChainNotFound)?;
            chain.create_genesis(address, &config.genesis_memo)?;
        }

        Ok(chain)
    }

    fn create_genesis(&self, address: &Address, memo: &str) -> Result<()> {
        let coinbase = Transaction::coinbase(&address.pubkey_hash()?, memo.as_bytes().to_vec(), self.block_reward);
        let genesis = self.mine(Hash256::zero(), vec![coinbase], None)?;
        let hash = genesis.hash;
        let bytes = genesis.serialize();

        // Block and tip land together or not at all
        let created = (&self.blocks, &self.meta).transaction(
            |(blocks, meta)| -> ConflictableTransactionResult<bool, LedgerError> {
                if meta.get(TIP_KEY)?.is_some() {
                    return Ok(false);
                }
                blocks.insert(hash.as_bytes().as_slice(), bytes.as_slice())?;
                meta.insert(TIP_KEY, hash.as_bytes().as_slice())?;
                meta.insert(HEIGHT_KEY, &0u64.to_be_bytes()[..])?;
                meta.insert(DIFFICULTY_KEY, &self.pow.difficulty_bits().to_be_bytes()[..])?;
                meta.insert(REWARD_KEY, &self.block_reward.to_be_bytes()[..])?;
                Ok(true)
            },
        )?;
        self.db.flush()?;

        if created {
            log::info!("Created blockchain with genesis block {} paying {}", hash, address);
        }
        Ok(())
    }

    /// The chain keeps the difficulty and reward it was created with;
    /// opening it under different ones is a configuration error
    fn check_parameters(&self, config: &LedgerConfig) -> Result<()> {
        let stored_bits = self.meta_value::<4>(DIFFICULTY_KEY)?.map(u32::from_be_bytes);
        let stored_reward = self.meta_value::<8>(REWARD_KEY)?.map(u64::from_be_bytes);

        let (Some(bits), Some(reward)) = (stored_bits, stored_reward) else {
            return Err(LedgerError::Corrupted("chain parameters are missing".to_string()));
        };
        if bits != config.difficulty_bits {
            return Err(LedgerError::Config(format!(
                "chain was created with difficulty {} bits, config asks for {}",
                bits, config.difficulty_bits
            )));
        }
        if reward != config.block_reward {
            return Err(LedgerError::Config(format!(
                "chain was created with block reward {}, config asks for {}",
                reward, config.block_reward
            )));
        }
        Ok(())
    }

    fn meta_value<const N: usize>(&self, key: &[u8]) -> Result<Option<[u8; N]>> {
        match self.meta.get(key)? {
            Some(data) => <[u8; N]>::try_from(&data[..]).map(Some).map_err(|_| {
                LedgerError::Corrupted(format!(
                    "invalid {} length: {}", String::from_utf8_lossy(key), data.len()
                ))
            }),
            None => Ok(None),
        }
    }

    /// Mine `transactions` into a new block on top of the tip and append it
    pub fn mine_block(&self, transactions: Vec<Transaction>) -> Result<Block> {
        self.append(transactions, None)
    }

    /// `mine_block` that stops early once `cancel` is raised
    pub fn mine_block_with_cancel(&self, transactions: Vec<Transaction>, cancel: &AtomicBool) -> Result<Block> {
        self.append(transactions, Some(cancel))
    }

    fn append(&self, transactions: Vec<Transaction>, cancel: Option<&AtomicBool>) -> Result<Block> {
        // The lock guards no data, so a poisoned lock is still usable
        let _writer = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Err(err) = self.validator.validate_transactions(&transactions) {
            log::warn!("Rejected block: {}", err);
            return Err(err.into());
        }
        if let Err(err) = self.verify_spends(&transactions) {
            log::warn!("Rejected block: {}", err);
            return Err(err);
        }

        let tip = self.tip()?;
        let height = self.height()? + 1;
        let block = self.mine(tip, transactions, cancel)?;
        let hash = block.hash;
        let bytes = block.serialize();

        (&self.blocks, &self.meta).transaction(
            |(blocks, meta)| -> ConflictableTransactionResult<(), LedgerError> {
                if meta.get(TIP_KEY)?.as_deref() != Some(tip.as_bytes().as_slice()) {
                    return abort(LedgerError::StaleTip(tip));
                }
                blocks.insert(hash.as_bytes().as_slice(), bytes.as_slice())?;
                meta.insert(TIP_KEY, hash.as_bytes().as_slice())?;
                meta.insert(HEIGHT_KEY, &height.to_be_bytes()[..])?;
                Ok(())
            },
        )?;
        self.db.flush()?;

        log::info!("Appended block {} at height {} ({} transactions)",
            hash, height, block.transactions.len());
        Ok(block)
    }

    fn mine(&self, prev_hash: Hash256, transactions: Vec<Transaction>, cancel: Option<&AtomicBool>) -> Result<Block> {
        let header = Block::template(prev_hash, &transactions, self.pow.difficulty_bits());
        let result = match cancel {
            Some(flag) => self.pow.mine_with_cancel(&header, flag)?,
            None => self.pow.mine(&header)?,
        };
        log::debug!("Mined {} after {} attempts in {:?} ({:.0} H/s)",
            result.hash, result.attempts, result.duration, result.hash_rate());

        Ok(Block::new(result.header, transactions, result.hash))
    }

    /// Check the batch against the current unspent set: every input claims
    /// an existing output it can unlock, nothing is spent twice, and value
    /// in equals value out
    fn verify_spends(&self, transactions: &[Transaction]) -> Result<()> {
        let mut unspent: HashMap<OutPoint, TxOutput> = UtxoIndex::new(self).find_all_unspent()?;

        for tx in transactions {
            if !tx.is_coinbase() {
                let mut input_total = 0u64;
                for input in tx.inputs() {
                    let outpoint = OutPoint::new(input.txid, input.vout);
                    let output = unspent.remove(&outpoint).ok_or_else(|| {
                        LedgerError::InvalidTransaction(format!(
                            "{} spends unknown or already spent output {}", tx.id(), outpoint
                        ))
                    })?;
                    if !output.is_locked_with(&input.unlocking_data) {
                        return Err(LedgerError::InvalidTransaction(format!(
                            "{} cannot unlock output {}", tx.id(), outpoint
                        )));
                    }
                    input_total = input_total.checked_add(output.value).ok_or_else(|| {
                        LedgerError::InvalidTransaction(format!("{} input value overflows", tx.id()))
                    })?;
                }

                let output_total = tx.outputs().iter()
                    .try_fold(0u64, |acc, out| acc.checked_add(out.value))
                    .ok_or_else(|| {
                        LedgerError::InvalidTransaction(format!("{} output value overflows", tx.id()))
                    })?;
                if input_total != output_total {
                    return Err(LedgerError::InvalidTransaction(format!(
                        "{} spends {} but pays out {}", tx.id(), input_total, output_total
                    )));
                }
            }

            for (index, output) in tx.outputs().iter().enumerate() {
                let outpoint = OutPoint::new(tx.id(), index as u32);
                if unspent.insert(outpoint, output.clone()).is_some() {
                    return Err(LedgerError::InvalidTransaction(format!(
                        "duplicate transaction id {}", tx.id()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Get a block by hash
    pub fn get_block(&self, hash: &Hash256) -> Result<Option<Block>> {
        match self.blocks.get(hash.as_bytes())? {
            Some(data) => {
                let block = Block::deserialize(&data).map_err(|e| {
                    LedgerError::Corrupted(format!("block {} is unreadable: {}", hash, e))
                })?;
                if block.hash != *hash {
                    return Err(LedgerError::Corrupted(format!(
                        "block stored under {} carries hash {}", hash, block.hash
                    )));
                }
                Ok(Some(block))
            }
            None => Ok(None),
        }
    }

    /// Check if a block exists
    pub fn has_block(&self, hash: &Hash256) -> Result<bool> {
        Ok(self.blocks.contains_key(hash.as_bytes())?)
    }

    /// Hash of the most recently appended block
    pub fn tip(&self) -> Result<Hash256> {
        let data = self.meta.get(TIP_KEY)?
            .ok_or_else(|| LedgerError::Corrupted("tip pointer is missing".to_string()))?;
        Hash256::from_slice(&data)
            .ok_or_else(|| LedgerError::Corrupted(format!("invalid tip length: {}", data.len())))
    }

    /// Height of the tip; the genesis block is height 0
    pub fn height(&self) -> Result<u64> {
        let data = self.meta.get(HEIGHT_KEY)?
            .ok_or_else(|| LedgerError::Corrupted("chain height is missing".to_string()))?;
        let bytes = <[u8; 8]>::try_from(&data[..])
            .map_err(|_| LedgerError::Corrupted(format!("invalid height length: {}", data.len())))?;
        Ok(u64::from_be_bytes(bytes))
    }

    /// Walk the chain from the current tip back to genesis
    pub fn iter(&self) -> Result<BlockchainIterator<'_>> {
        Ok(BlockchainIterator {
            next_hash: Some(self.tip()?),
            chain: self,
        })
    }

    /// Audit every block: proof of work, stored hash and linkage.
    /// Returns the number of blocks checked.
    pub fn verify_chain(&self) -> Result<u64> {
        let mut expected = self.tip()?;
        let mut count = 0u64;

        for block in self.iter()? {
            let block = block?;
            if block.hash != expected {
                return Err(LedgerError::Corrupted(format!(
                    "expected block {}, found {}", expected, block.hash
                )));
            }
            self.validator.validate_block(&block).map_err(|e| {
                LedgerError::InvalidBlock(format!("{}: {}", block.hash, e))
            })?;
            expected = block.header.prev_block_hash;
            count += 1;
        }

        let height = self.height()?;
        if count != height + 1 {
            return Err(LedgerError::Corrupted(format!(
                "walked {} blocks but height is {}", count, height
            )));
        }

        log::info!("Verified {} blocks", count);
        Ok(count)
    }

    pub fn block_reward(&self) -> u64 {
        self.block_reward
    }

    pub fn proof_of_work(&self) -> &ProofOfWork {
        &self.pow
    }

    pub fn validator(&self) -> &BlockValidator {
        &self.validator
    }
}

/// Cursor from the tip towards genesis; ends after the genesis block
pub struct BlockchainIterator<'a> {
    next_hash: Option<Hash256>,
    chain: &'a Blockchain,
}

impl Iterator for BlockchainIterator<'_> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.next_hash.take()?;

        match self.chain.get_block(&hash) {
            Ok(Some(block)) => {
                if !block.is_genesis() {
                    self.next_hash = Some(block.header.prev_block_hash);
                }
                Some(Ok(block))
            }
            Ok(None) => Some(Err(LedgerError::Corrupted(format!(
                "block {} is linked from the chain but missing", hash
            )))),
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::TransactionBuilder;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_config() -> LedgerConfig {
        LedgerConfig {
            difficulty_bits: 8,
            ..LedgerConfig::default()
        }
    }

    fn address(byte: u8) -> Address {
        Address::from_pubkey_hash(&[byte; 20])
    }

    #[test]
    fn test_genesis_created_on_open() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();

        assert_eq!(chain.height().unwrap(), 0);
        let genesis = chain.get_block(&chain.tip().unwrap()).unwrap().unwrap();
        assert!(genesis.is_genesis());
        assert_eq!(genesis.transactions.len(), 1);
        assert!(genesis.transactions[0].is_coinbase());
        assert!(chain.proof_of_work().validate(&genesis));
    }

    #[test]
    fn test_mine_block_advances_tip() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let genesis_hash = chain.tip().unwrap();

        let builder = TransactionBuilder::new(&chain);
        let coinbase = builder.coinbase(&address(1), "second").unwrap();
        let block = chain.mine_block(vec![coinbase]).unwrap();

        assert_eq!(chain.tip().unwrap(), block.hash);
        assert_eq!(chain.height().unwrap(), 1);
        assert_eq!(block.header.prev_block_hash, genesis_hash);
        assert!(chain.proof_of_work().validate(&block));
        assert_eq!(chain.get_block(&block.hash).unwrap(), Some(block));
    }

    #[test]
    fn test_get_missing_block() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let missing = Hash256::new([0xab; 32]);
        assert_eq!(chain.get_block(&missing).unwrap(), None);
        assert!(!chain.has_block(&missing).unwrap());
    }

    #[test]
    fn test_iterator_restarts_at_tip() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let builder = TransactionBuilder::new(&chain);
        for memo in ["a", "b"] {
            chain.mine_block(vec![builder.coinbase(&address(1), memo).unwrap()]).unwrap();
        }

        let blocks: Vec<Block> = chain.iter().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].hash, chain.tip().unwrap());
        assert_eq!(blocks.iter().filter(|b| b.is_genesis()).count(), 1);
        assert!(blocks[2].is_genesis());
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].header.prev_block_hash, pair[1].hash);
        }

        chain.mine_block(vec![builder.coinbase(&address(1), "c").unwrap()]).unwrap();
        assert_eq!(chain.iter().unwrap().count(), 4);
    }

    #[test]
    fn test_reject_block_without_coinbase() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let err = chain.mine_block(vec![]).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidBlock(_)));
        assert_eq!(chain.height().unwrap(), 0);
    }

    #[test]
    fn test_reject_double_spend() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let builder = TransactionBuilder::new(&chain);

        let spend = builder.build(&address(1), &address(2), 5).unwrap();
        chain.mine_block(vec![builder.coinbase(&address(3), "").unwrap(), spend.clone()]).unwrap();

        // Replaying the same spend claims outputs that are already gone
        let err = chain
            .mine_block(vec![builder.coinbase(&address(3), "").unwrap(), spend])
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
        assert_eq!(chain.height().unwrap(), 1);
    }

    #[test]
    fn test_reject_value_creation() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let genesis = chain.get_block(&chain.tip().unwrap()).unwrap().unwrap();
        let coinbase_id = genesis.transactions[0].id();

        let inflated = Transaction::new(
            vec![crate::core::TxInput::new(coinbase_id, 0, vec![1; 20])],
            vec![TxOutput::new(1_000, vec![2; 20])],
        );
        let builder = TransactionBuilder::new(&chain);
        let err = chain
            .mine_block(vec![builder.coinbase(&address(3), "").unwrap(), inflated])
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
    }

    #[test]
    fn test_reject_foreign_unlock() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let genesis = chain.get_block(&chain.tip().unwrap()).unwrap().unwrap();
        let coinbase_id = genesis.transactions[0].id();

        // Address 2 tries to claim address 1's reward
        let theft = Transaction::new(
            vec![crate::core::TxInput::new(coinbase_id, 0, vec![2; 20])],
            vec![TxOutput::new(20, vec![2; 20])],
        );
        let builder = TransactionBuilder::new(&chain);
        let err = chain
            .mine_block(vec![builder.coinbase(&address(3), "").unwrap(), theft])
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransaction(_)));
    }

    #[test]
    fn test_cancelled_append_leaves_chain_untouched() {
        let chain = Blockchain::temporary(&test_config(), &address(1)).unwrap();
        let tip = chain.tip().unwrap();

        let cancel = AtomicBool::new(true);
        let coinbase = TransactionBuilder::new(&chain).coinbase(&address(1), "x").unwrap();
        let err = chain.mine_block_with_cancel(vec![coinbase], &cancel).unwrap_err();

        assert!(matches!(err, LedgerError::MiningCancelled { .. }));
        assert_eq!(chain.tip().unwrap(), tip);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_path_buf(),
            ..test_config()
        };

        let tip = {
            let chain = Blockchain::open(&config, &address(1)).unwrap();
            let coinbase = TransactionBuilder::new(&chain).coinbase(&address(1), "").unwrap();
            chain.mine_block(vec![coinbase]).unwrap().hash
        };

        let chain = Blockchain::open_existing(&config).unwrap();
        assert_eq!(chain.tip().unwrap(), tip);
        assert_eq!(chain.height().unwrap(), 1);
        assert_eq!(chain.verify_chain().unwrap(), 2);

        // Reopening with a genesis address must not create a second genesis
        drop(chain);
        let chain = Blockchain::open(&config, &address(9)).unwrap();
        assert_eq!(chain.tip().unwrap(), tip);
    }

    #[test]
    fn test_reopen_with_other_parameters_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        drop(Blockchain::open(&config, &address(1)).unwrap());

        let harder = LedgerConfig { difficulty_bits: 9, ..config.clone() };
        assert!(matches!(Blockchain::open_existing(&harder), Err(LedgerError::Config(_))));
        assert!(matches!(Blockchain::open(&harder, &address(1)), Err(LedgerError::Config(_))));

        let richer = LedgerConfig { block_reward: 50, ..config.clone() };
        assert!(matches!(Blockchain::open_existing(&richer), Err(LedgerError::Config(_))));

        // The original parameters still open and validate the chain
        let chain = Blockchain::open_existing(&config).unwrap();
        let genesis = chain.get_block(&chain.tip().unwrap()).unwrap().unwrap();
        assert!(chain.proof_of_work().validate(&genesis));
        assert_eq!(chain.verify_chain().unwrap(), 1);
    }

    #[test]
    fn test_repeated_reopen_releases_lock() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        drop(Blockchain::open(&config, &address(1)).unwrap());

        for _ in 0..10 {
            let chain = Blockchain::open_existing(&config).unwrap();
            assert_eq!(chain.height().unwrap(), 0);
        }
    }

    #[test]
    fn test_open_existing_without_chain() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        assert!(matches!(Blockchain::open_existing(&config), Err(LedgerError::ChainNotFound)));

        // An empty store is still initialisable afterwards
        create_empty_store(&config);
        assert!(matches!(Blockchain::open_existing(&config), Err(LedgerError::ChainNotFound)));
        assert!(Blockchain::open(&config, &address(1)).is_ok());
    }

    fn create_empty_store(config: &LedgerConfig) {
        let db = open_store(&config.chain_path()).unwrap();
        db.flush().unwrap();
    }

    #[test]
    fn test_tip_without_block_is_corruption() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        {
            let db = open_store(&config.chain_path()).unwrap();
            let meta = db.open_tree(META_TREE).unwrap();
            meta.insert(TIP_KEY, &[7u8; 32][..]).unwrap();
            meta.insert(HEIGHT_KEY, &0u64.to_be_bytes()[..]).unwrap();
            db.flush().unwrap();
        }

        assert!(matches!(Blockchain::open_existing(&config), Err(LedgerError::Corrupted(_))));
    }

    #[test]
    fn test_blocks_without_tip_is_corruption() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            data_dir: dir.path().to_path_buf(),
            ..test_config()
        };
        {
            let db = open_store(&config.chain_path()).unwrap();
            let blocks = db.open_tree(BLOCKS_TREE).unwrap();
            blocks.insert(&[7u8; 32][..], &b"junk"[..]).unwrap();
            db.flush().unwrap();
        }

        let err = Blockchain::open(&config, &address(1)).err().unwrap();
        assert!(matches!(err, LedgerError::Corrupted(_)));
    }

    #[test]
    fn test_concurrent_appends_are_serialised() {
        let chain = Arc::new(Blockchain::temporary(&test_config(), &address(1)).unwrap());

        let handles: Vec<_> = (0..4u8)
            .map(|i| {
                let chain = Arc::clone(&chain);
                std::thread::spawn(move || {
                    let coinbase = TransactionBuilder::new(&chain)
                        .coinbase(&address(10 + i), "")
                        .unwrap();
                    chain.mine_block(vec![coinbase]).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(chain.height().unwrap(), 4);
        assert_eq!(chain.verify_chain().unwrap(), 5);
    }
}
