// Addresses, keys and transaction building

mod address;
mod keystore;
mod tx_builder;

pub use address::{
    Address, base58_decode, base58_encode, checksum, decode_check, encode_check,
    ADDRESS_VERSION, CHECKSUM_LEN, PUBKEY_HASH_LEN,
};
pub use keystore::{Keystore, KeyPair};
pub use tx_builder::TransactionBuilder;
