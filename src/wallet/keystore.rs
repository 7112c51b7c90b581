// Key management

use crate::core::hash160;
use crate::error::{LedgerError, Result};
use crate::wallet::Address;
use secp256k1::{Secp256k1, SecretKey, PublicKey};
use rand::rngs::OsRng;
use std::collections::HashMap;
use std::path::Path;
use std::fs;
use serde::{Serialize, Deserialize};

/// Serializable key pair (for storage)
#[derive(Serialize, Deserialize)]
struct StoredKey {
    secret_key: String,
    address: Address,
}

#[derive(Serialize, Deserialize, Default)]
struct StoredKeystore {
    keys: Vec<StoredKey>,
    default_address: Option<Address>,
}

/// Key pair
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub address: Address,
}

impl KeyPair {
    /// Generate a new key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret(&secp, secret_key)
    }

    /// Create from secret key bytes
    fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| LedgerError::Key(format!("invalid secret key: {}", e)))?;
        Ok(Self::from_secret(&secp, secret_key))
    }

    fn from_secret(secp: &Secp256k1<secp256k1::All>, secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key(secp);
        let address = Address::from_pubkey_hash(&hash160(&public_key.serialize()));
        Self {
            secret_key,
            public_key,
            address,
        }
    }

    /// Get public key bytes (compressed)
    pub fn pubkey_bytes(&self) -> Vec<u8> {
        self.public_key.serialize().to_vec()
    }

    /// Get pubkey hash
    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.pubkey_bytes())
    }
}

/// Keystore - manages multiple key pairs
#[derive(Default)]
pub struct Keystore {
    keys: HashMap<Address, KeyPair>,
    default_address: Option<Address>,
}

impl Keystore {
    /// Create a new keystore
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a new address
    pub fn new_address(&mut self) -> Address {
        let keypair = KeyPair::generate();
        let address = keypair.address.clone();

        // Set as default if first address
        if self.default_address.is_none() {
            self.default_address = Some(address.clone());
        }

        self.keys.insert(address.clone(), keypair);
        address
    }

    /// Get key pair for address
    pub fn get_keypair(&self, address: &Address) -> Option<&KeyPair> {
        self.keys.get(address)
    }

    /// All addresses, sorted
    pub fn list_addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.keys.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Get default address
    pub fn default_address(&self) -> Option<&Address> {
        self.default_address.as_ref()
    }

    /// Count addresses
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    /// Save keystore to file (plain JSON, not encrypted)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let stored = StoredKeystore {
            keys: self
                .list_addresses()
                .into_iter()
                .filter_map(|address| {
                    self.keys.get(&address).map(|kp| StoredKey {
                        secret_key: hex::encode(kp.secret_key.secret_bytes()),
                        address,
                    })
                })
                .collect(),
            default_address: self.default_address.clone(),
        };

        let json = serde_json::to_string_pretty(&stored)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load keystore from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let stored: StoredKeystore = serde_json::from_str(&json)?;

        let mut keys = HashMap::new();
        for entry in stored.keys {
            let bytes = hex::decode(&entry.secret_key)
                .map_err(|e| LedgerError::Key(format!("invalid secret key encoding: {}", e)))?;
            let keypair = KeyPair::from_secret_bytes(&bytes)?;
            if keypair.address != entry.address {
                return Err(LedgerError::Key(format!(
                    "stored key does not match address {}", entry.address
                )));
            }
            keys.insert(keypair.address.clone(), keypair);
        }

        Ok(Self {
            keys,
            default_address: stored.default_address,
        })
    }

    /// Load from `path` if it exists, otherwise start empty
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            log::debug!("Loading keystore from {}", path.as_ref().display());
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }
}
