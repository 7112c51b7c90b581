// CLI commands

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use crate::config::LedgerConfig;
use crate::core::{Block, Hash256};
use crate::error::{LedgerError, Result};
use crate::storage::Blockchain;
use crate::wallet::{Address, Keystore, TransactionBuilder};

#[derive(Parser)]
#[command(name = "powchain")]
#[command(about = "Single-node proof-of-work ledger", long_about = None)]
pub struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the configured data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a chain whose genesis reward goes to ADDRESS
    CreateBlockchain {
        #[arg(long)]
        address: String,
    },

    /// Generate a new key pair and print its address
    CreateWallet,

    /// List all wallet addresses
    ListAddresses,

    /// Get balance for an address
    GetBalance {
        #[arg(long)]
        address: String,
    },

    /// Send coins; the block is mined with the reward going to the sender
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: u64,
    },

    /// Mine a block holding only a coinbase
    Mine {
        #[arg(long)]
        address: String,
        /// Coinbase memo (random when omitted)
        #[arg(long, default_value = "")]
        memo: String,
    },

    /// Print every block from the tip back to genesis
    PrintChain,

    /// Print a single block
    PrintBlock {
        /// Block hash (hex)
        hash: String,
    },

    /// Re-check proof of work and linkage of the whole chain
    VerifyChain,

    /// Get chain info
    Info,
}

/// CLI handler
pub struct CliHandler {
    config: LedgerConfig,
}

impl CliHandler {
    /// Resolve the configuration from the global options
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => LedgerConfig::load(path)?,
            None => LedgerConfig::default(),
        };
        if let Some(dir) = &cli.data_dir {
            config.data_dir = dir.clone();
        }
        config.validate()?;

        Ok(Self { config })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Handle CLI command
    pub fn handle(&self, command: Commands) -> Result<()> {
        match command {
            Commands::CreateBlockchain { address } => self.create_blockchain(&address),
            Commands::CreateWallet => self.create_wallet(),
            Commands::ListAddresses => self.list_addresses(),
            Commands::GetBalance { address } => self.get_balance(&address),
            Commands::Send { from, to, amount } => self.send(&from, &to, amount),
            Commands::Mine { address, memo } => self.mine(&address, &memo),
            Commands::PrintChain => self.print_chain(),
            Commands::PrintBlock { hash } => self.print_block(&hash),
            Commands::VerifyChain => self.verify_chain(),
            Commands::Info => self.info(),
        }
    }

    fn open_chain(&self) -> Result<Blockchain> {
        Blockchain::open_existing(&self.config)
    }

    fn create_blockchain(&self, address: &str) -> Result<()> {
        let address = Address::parse(address)?;
        fs::create_dir_all(&self.config.data_dir)?;

        let chain = Blockchain::open(&self.config, &address)?;
        println!("Blockchain ready");
        println!("  Tip: {}", chain.tip()?);
        println!("  Height: {}", chain.height()?);
        Ok(())
    }

    fn create_wallet(&self) -> Result<()> {
        let path = self.config.wallet_path();
        let mut keystore = Keystore::load_or_default(&path)?;
        let address = keystore.new_address();

        fs::create_dir_all(&self.config.data_dir)?;
        keystore.save(&path)?;
        println!("New address: {}", address);
        Ok(())
    }

    fn list_addresses(&self) -> Result<()> {
        let keystore = Keystore::load_or_default(self.config.wallet_path())?;
        let addresses = keystore.list_addresses();
        println!("Addresses ({}):", addresses.len());
        for address in addresses {
            let marker = if keystore.default_address() == Some(&address) { " (default)" } else { "" };
            println!("  {}{}", address, marker);
        }
        Ok(())
    }

    fn get_balance(&self, address: &str) -> Result<()> {
        let address = Address::parse(address)?;
        let chain = self.open_chain()?;
        let balance = TransactionBuilder::new(&chain).get_balance(&address)?;
        println!("Balance of '{}': {}", address, balance);
        Ok(())
    }

    fn send(&self, from: &str, to: &str, amount: u64) -> Result<()> {
        let from = Address::parse(from)?;
        let to = Address::parse(to)?;
        let chain = self.open_chain()?;
        let builder = TransactionBuilder::new(&chain);

        let coinbase = builder.coinbase(&from, "")?;
        let tx = builder.build(&from, &to, amount)?;
        let txid = tx.id();
        let block = chain.mine_block(vec![coinbase, tx])?;

        println!("Sent {} from {} to {}", amount, from, to);
        println!("  Transaction: {}", txid);
        println!("  Block: {}", block.hash);
        Ok(())
    }

    fn mine(&self, address: &str, memo: &str) -> Result<()> {
        let address = Address::parse(address)?;
        let chain = self.open_chain()?;
        let coinbase = TransactionBuilder::new(&chain).coinbase(&address, memo)?;
        let block = chain.mine_block(vec![coinbase])?;

        println!("Mined block {}", block.hash);
        println!("  Nonce: {}", block.header.nonce);
        println!("  Reward: {} to {}", chain.block_reward(), address);
        Ok(())
    }

    fn print_chain(&self) -> Result<()> {
        let chain = self.open_chain()?;
        for block in chain.iter()? {
            let block = block?;
            print_block(&chain, &block);
            println!();
        }
        Ok(())
    }

    fn print_block(&self, hash: &str) -> Result<()> {
        let hash = Hash256::from_hex(hash)
            .ok_or_else(|| LedgerError::InvalidBlock(format!("not a block hash: {}", hash)))?;
        let chain = self.open_chain()?;
        let block = chain.get_block(&hash)?.ok_or(LedgerError::BlockNotFound(hash))?;
        print_block(&chain, &block);
        Ok(())
    }

    fn verify_chain(&self) -> Result<()> {
        let chain = self.open_chain()?;
        let count = chain.verify_chain()?;
        println!("Chain OK: {} blocks verified", count);
        Ok(())
    }

    fn info(&self) -> Result<()> {
        let chain = self.open_chain()?;
        println!("Chain Info:");
        println!("  Data dir: {}", self.config.data_dir.display());
        println!("  Height: {}", chain.height()?);
        println!("  Tip: {}", chain.tip()?);
        println!("  Difficulty bits: {}", chain.proof_of_work().difficulty_bits());
        println!("  Block reward: {}", chain.block_reward());
        Ok(())
    }
}

/// Print block information
fn print_block(chain: &Blockchain, block: &Block) {
    println!("============ Block {} ============", block.hash);
    println!("  Previous: {}", block.header.prev_block_hash);
    println!("  Transactions digest: {}", block.header.transactions_digest);
    println!("  Timestamp: {}", block.header.timestamp);
    println!("  Difficulty bits: {}", block.header.difficulty_bits);
    println!("  Nonce: {}", block.header.nonce);
    println!("  PoW valid: {}", chain.proof_of_work().validate(block));

    for tx in &block.transactions {
        println!("  Transaction {}", tx.id());
        for (i, input) in tx.inputs().iter().enumerate() {
            if input.is_coinbase() {
                println!("    in  [{}] coinbase: {}", i, String::from_utf8_lossy(&input.unlocking_data));
            } else {
                println!("    in  [{}] {}:{}", i, input.txid, input.vout);
            }
        }
        for (i, output) in tx.outputs().iter().enumerate() {
            let owner = <&[u8; 20]>::try_from(output.unlock_hash.as_slice())
                .map(|hash| Address::from_pubkey_hash(hash).to_string())
                .unwrap_or_else(|_| hex::encode(&output.unlock_hash));
            println!("    out [{}] {} -> {}", i, output.value, owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn handler(dir: &TempDir) -> CliHandler {
        let cli = Cli::parse_from([
            "powchain",
            "--data-dir",
            dir.path().to_str().unwrap(),
            "info",
        ]);
        let mut handler = CliHandler::new(&cli).unwrap();
        handler.config.difficulty_bits = 8;
        handler
    }

    #[test]
    fn test_parse_send() {
        let cli = Cli::parse_from(["powchain", "send", "--from", "a", "--to", "b", "--amount", "7"]);
        assert!(matches!(cli.command, Commands::Send { amount: 7, .. }));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_commands_need_existing_chain() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        assert!(matches!(handler.handle(Commands::Info), Err(LedgerError::ChainNotFound)));
    }

    #[test]
    fn test_wallet_and_chain_flow() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);

        handler.handle(Commands::CreateWallet).unwrap();
        handler.handle(Commands::CreateWallet).unwrap();
        let keystore = Keystore::load(handler.config().wallet_path()).unwrap();
        let addresses = keystore.list_addresses();
        assert_eq!(addresses.len(), 2);

        let miner = addresses[0].to_string();
        let payee = addresses[1].to_string();
        handler.handle(Commands::CreateBlockchain { address: miner.clone() }).unwrap();
        handler.handle(Commands::Send { from: miner.clone(), to: payee.clone(), amount: 5 }).unwrap();
        handler.handle(Commands::Mine { address: payee.clone(), memo: String::new() }).unwrap();
        handler.handle(Commands::VerifyChain).unwrap();

        let chain = Blockchain::open_existing(handler.config()).unwrap();
        let builder = TransactionBuilder::new(&chain);
        assert_eq!(chain.height().unwrap(), 2);
        assert_eq!(builder.get_balance(&addresses[0]).unwrap(), 35);
        assert_eq!(builder.get_balance(&addresses[1]).unwrap(), 25);
    }

    #[test]
    fn test_bad_address_rejected() {
        let dir = TempDir::new().unwrap();
        let handler = handler(&dir);
        let err = handler.handle(Commands::CreateBlockchain { address: "0OIl".to_string() }).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAddress(_)));
    }
}
