//! BIP-39 mnemonic seed backup and restoration.

use bip39::{Language, Mnemonic};

use crate::error::WalletError;
use crate::keys::Seed;

/// Convert seed entropy to a BIP-39 mnemonic phrase.
///
/// Entropy length must be a multiple of 4 bytes in the 16..=32 range;
/// 32-byte entropy yields the usual 24 words.
pub fn seed_to_mnemonic(seed: &Seed) -> Result<String, WalletError> {
    let m = Mnemonic::from_entropy_in(Language::English, seed.as_bytes())
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(m.to_string())
}

/// Parse a BIP-39 mnemonic phrase and extract its entropy as a [`Seed`].
///
/// Normalizes whitespace and converts to lowercase before parsing.
pub fn mnemonic_to_seed(phrase: &str) -> Result<Seed, WalletError> {
    let normalized = phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let m = Mnemonic::parse_in(Language::English, &normalized)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Seed::from_bytes(&m.to_entropy())
}
