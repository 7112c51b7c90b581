// Base58Check addresses

use crate::core::hash256;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version byte prepended to the pubkey hash
pub const ADDRESS_VERSION: u8 = 0x00;
pub const CHECKSUM_LEN: usize = 4;
pub const PUBKEY_HASH_LEN: usize = 20;

/// Base58 text of `input`
pub fn base58_encode(input: &[u8]) -> String {
    bs58::encode(input).into_string()
}

/// Raw bytes behind Base58 text
pub fn base58_decode(input: &str) -> Result<Vec<u8>> {
    bs58::decode(input)
        .into_vec()
        .map_err(|e| LedgerError::InvalidAddress(format!("{}: {}", input, e)))
}

/// First four bytes of SHA256(SHA256(payload))
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = hash256(payload);
    let mut sum = [0u8; CHECKSUM_LEN];
    sum.copy_from_slice(&hash.as_bytes()[..CHECKSUM_LEN]);
    sum
}

/// Base58(version ++ payload ++ checksum)
pub fn encode_check(version: u8, payload: &[u8]) -> String {
    let mut full = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    full.push(version);
    full.extend_from_slice(payload);
    let sum = checksum(&full);
    full.extend_from_slice(&sum);
    base58_encode(&full)
}

/// Inverse of `encode_check`; fails with `InvalidChecksum` on any mismatch
pub fn decode_check(text: &str) -> Result<(u8, Vec<u8>)> {
    let full = base58_decode(text)?;
    if full.len() <= CHECKSUM_LEN {
        return Err(LedgerError::InvalidAddress(format!("{}: too short", text)));
    }

    let (versioned, sum) = full.split_at(full.len() - CHECKSUM_LEN);
    if checksum(versioned).as_slice() != sum {
        return Err(LedgerError::InvalidChecksum);
    }
    Ok((versioned[0], versioned[1..].to_vec()))
}

/// Textual address owning the outputs locked to its pubkey hash
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create address from public key hash
    pub fn from_pubkey_hash(hash: &[u8; PUBKEY_HASH_LEN]) -> Self {
        Self(encode_check(ADDRESS_VERSION, hash))
    }

    /// Validate `text` and wrap it
    pub fn parse(text: &str) -> Result<Self> {
        let address = Self(text.to_string());
        address.pubkey_hash()?;
        Ok(address)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back to the 20-byte hash outputs are locked with
    pub fn pubkey_hash(&self) -> Result<[u8; PUBKEY_HASH_LEN]> {
        let (version, payload) = decode_check(&self.0)?;
        if version != ADDRESS_VERSION {
            return Err(LedgerError::InvalidAddress(format!(
                "{}: unknown version {:#04x}", self.0, version
            )));
        }
        payload.as_slice().try_into().map_err(|_| {
            LedgerError::InvalidAddress(format!("{}: payload is {} bytes", self.0, payload.len()))
        })
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "00010966776006953d5567439e5e39f86a0d273beed61967f6";
    const ENCODED: &str = "16UwLL9Risc3QfPqBUvKofHmBQ7wMtjvM";

    #[test]
    fn test_base58_known_vector() {
        let raw = hex::decode(RAW).unwrap();
        assert_eq!(base58_encode(&raw), ENCODED);
        assert_eq!(hex::encode(base58_decode(ENCODED).unwrap()), RAW);
    }

    #[test]
    fn test_leading_zero_bytes_survive() {
        let raw = [0u8, 0, 1, 2];
        let text = base58_encode(&raw);
        assert!(text.starts_with("11"));
        assert_eq!(base58_decode(&text).unwrap(), raw);
    }

    #[test]
    fn test_known_address_decodes() {
        let address = Address::parse(ENCODED).unwrap();
        let hash = address.pubkey_hash().unwrap();
        assert_eq!(hex::encode(hash), "010966776006953d5567439e5e39f86a0d273bee");
        assert_eq!(Address::from_pubkey_hash(&hash), address);
    }

    #[test]
    fn test_corrupted_character_fails_checksum() {
        let corrupted = format!("{}N", &ENCODED[..ENCODED.len() - 1]);
        assert!(matches!(Address::parse(&corrupted), Err(LedgerError::InvalidChecksum)));
    }

    #[test]
    fn test_invalid_characters_rejected() {
        // '0', 'O', 'I' and 'l' are not in the alphabet
        assert!(matches!(Address::parse("0OIl"), Err(LedgerError::InvalidAddress(_))));
        assert!(matches!(Address::parse(""), Err(LedgerError::InvalidAddress(_))));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let text = encode_check(0x05, &[1; PUBKEY_HASH_LEN]);
        assert!(matches!(Address::parse(&text), Err(LedgerError::InvalidAddress(_))));
    }

    #[test]
    fn test_wrong_payload_length_rejected() {
        let text = encode_check(ADDRESS_VERSION, &[1; 19]);
        assert!(matches!(Address::parse(&text), Err(LedgerError::InvalidAddress(_))));
    }

    #[test]
    fn test_round_trip_from_hash() {
        let hash = [0x12; PUBKEY_HASH_LEN];
        let address = Address::from_pubkey_hash(&hash);
        assert!(address.as_str().starts_with('1'));
        assert_eq!(address.pubkey_hash().unwrap(), hash);
        assert_eq!(address.to_string().parse::<Address>().unwrap(), address);
    }
}
