//! Base-address encoding for the Saros ledger.
//!
//! Addresses use Bech32m encoding ([BIP-350]) with human-readable prefixes:
//! - Mainnet: `srs1...`
//! - Testnet: `tsrs1...`
//!
//! Each address encodes a version byte (currently 0) followed by two 32-byte
//! BLAKE3 key hashes: the payment credential and the stake credential. The
//! Bech32m checksum provides guaranteed detection of up to 4 character
//! errors.
//!
//! [BIP-350]: https://github.com/bitcoin/bips/blob/master/bip-0350.mediawiki

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::crypto::PublicKey;
use crate::error::AddressError;
use crate::types::Hash256;

/// Bech32m checksum constant (BIP-350).
const BECH32M_CONST: u32 = 0x2bc830a3;

/// Bech32 character set for encoding 5-bit values.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Current address version.
pub const ADDRESS_VERSION: u8 = 0;

/// Raw payload bytes an address carries: payment hash plus stake hash.
const PAYLOAD_BYTES: usize = 64;

/// Network identifier determining the address prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    /// Mainnet (HRP: "srs", addresses start with `srs1`).
    Mainnet,
    /// Testnet (HRP: "tsrs", addresses start with `tsrs1`).
    Testnet,
}

impl Network {
    /// Human-readable prefix for this network.
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "srs",
            Network::Testnet => "tsrs",
        }
    }

    /// Look up network from a human-readable prefix.
    pub fn from_hrp(hrp: &str) -> Result<Self, AddressError> {
        match hrp {
            "srs" => Ok(Network::Mainnet),
            "tsrs" => Ok(Network::Testnet),
            _ => Err(AddressError::UnknownNetwork(hrp.to_string())),
        }
    }
}

/// A Saros base address binding a payment credential to a stake credential.
///
/// Human-readable form is `srs1...` (mainnet) or `tsrs1...` (testnet).
/// Internally stores the network, version byte, and both 32-byte BLAKE3
/// key hashes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    version: u8,
    payment_hash: Hash256,
    stake_hash: Hash256,
}

impl Address {
    /// Create an address from a payment and stake key hash.
    pub fn from_key_hashes(payment_hash: Hash256, stake_hash: Hash256, network: Network) -> Self {
        Self {
            network,
            version: ADDRESS_VERSION,
            payment_hash,
            stake_hash,
        }
    }

    /// Create an address from a payment and stake public key.
    pub fn from_public_keys(payment: &PublicKey, stake: &PublicKey, network: Network) -> Self {
        Self::from_key_hashes(payment.key_hash(), stake.key_hash(), network)
    }

    /// The BLAKE3 hash of the payment key controlling spends.
    pub fn payment_hash(&self) -> Hash256 {
        self.payment_hash
    }

    /// The BLAKE3 hash of the stake key the address delegates with.
    pub fn stake_hash(&self) -> Hash256 {
        self.stake_hash
    }

    /// The network this address belongs to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The address version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Encode this address as a Bech32m string.
    pub fn encode(&self) -> String {
        let hrp = self.network.hrp();
        let mut raw = Vec::with_capacity(PAYLOAD_BYTES);
        raw.extend_from_slice(self.payment_hash.as_bytes());
        raw.extend_from_slice(self.stake_hash.as_bytes());
        // 64 bytes always convert cleanly to 5-bit groups
        let data_5bit = convert_bits(&raw, 8, 5, true).unwrap_or_default();

        let mut payload = Vec::with_capacity(1 + data_5bit.len());
        payload.push(self.version);
        payload.extend_from_slice(&data_5bit);

        let checksum = bech32m_create_checksum(hrp, &payload);

        let mut result = String::with_capacity(hrp.len() + 1 + payload.len() + 6);
        result.push_str(hrp);
        result.push('1');
        for &d in &payload {
            result.push(CHARSET[d as usize] as char);
        }
        for &d in &checksum {
            result.push(CHARSET[d as usize] as char);
        }
        result
    }

    /// Decode a Bech32m address string.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        // Bech32 spec: all alpha chars must be the same case
        let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper {
            return Err(AddressError::MixedCase);
        }

        let s_lower = s.to_ascii_lowercase();

        let sep_pos = s_lower.rfind('1').ok_or(AddressError::MissingSeparator)?;

        if sep_pos == 0 {
            return Err(AddressError::InvalidHrp);
        }
        // Need at least 6 checksum chars + 1 version char after separator
        if sep_pos + 8 > s_lower.len() {
            return Err(AddressError::InvalidLength);
        }

        let hrp = &s_lower[..sep_pos];
        let data_part = &s_lower[sep_pos + 1..];

        let mut data = Vec::with_capacity(data_part.len());
        for c in data_part.chars() {
            let pos = CHARSET
                .iter()
                .position(|&ch| ch as char == c)
                .ok_or(AddressError::InvalidCharacter(c))?;
            data.push(pos as u8);
        }

        if !bech32m_verify_checksum(hrp, &data) {
            return Err(AddressError::InvalidChecksum);
        }

        let payload = &data[..data.len() - 6];

        if payload.is_empty() {
            return Err(AddressError::InvalidLength);
        }

        let version = payload[0];
        if version != ADDRESS_VERSION {
            return Err(AddressError::InvalidVersion(version));
        }

        let raw = convert_bits(&payload[1..], 5, 8, false).ok_or(AddressError::InvalidPadding)?;

        if raw.len() != PAYLOAD_BYTES {
            return Err(AddressError::InvalidLength);
        }

        let network = Network::from_hrp(hrp)?;

        let mut payment = [0u8; 32];
        payment.copy_from_slice(&raw[..32]);
        let mut stake = [0u8; 32];
        stake.copy_from_slice(&raw[32..]);

        Ok(Self {
            network,
            version,
            payment_hash: Hash256(payment),
            stake_hash: Hash256(stake),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}

// --- Bech32m internals ---

/// Compute the Bech32m polymod over a sequence of 5-bit values.
fn bech32m_polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];
    let mut chk: u32 = 1;
    for &v in values {
        let b = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (v as u32);
        for (i, &g) in GEN.iter().enumerate() {
            if (b >> i) & 1 != 0 {
                chk ^= g;
            }
        }
    }
    chk
}

/// Expand the HRP for Bech32m checksum computation.
fn bech32m_hrp_expand(hrp: &str) -> Vec<u8> {
    let mut ret = Vec::with_capacity(hrp.len() * 2 + 1);
    for c in hrp.bytes() {
        ret.push(c >> 5);
    }
    ret.push(0);
    for c in hrp.bytes() {
        ret.push(c & 31);
    }
    ret
}

/// Create the 6-value Bech32m checksum for the given HRP and data.
fn bech32m_create_checksum(hrp: &str, data: &[u8]) -> Vec<u8> {
    let mut values = bech32m_hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    let polymod = bech32m_polymod(&values) ^ BECH32M_CONST;
    (0..6)
        .map(|i| ((polymod >> (5 * (5 - i))) & 31) as u8)
        .collect()
}

/// Verify the Bech32m checksum for the given HRP and data (including checksum).
fn bech32m_verify_checksum(hrp: &str, data: &[u8]) -> bool {
    let mut values = bech32m_hrp_expand(hrp);
    values.extend_from_slice(data);
    bech32m_polymod(&values) == BECH32M_CONST
}

/// Convert between bit widths (e.g. 8-bit bytes to 5-bit Bech32 groups).
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut ret = Vec::new();
    let maxv = (1u32 << to_bits) - 1;
    for &value in data {
        let v = value as u32;
        if v >> from_bits != 0 {
            return None;
        }
        acc = (acc << from_bits) | v;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            ret.push(((acc >> bits) & maxv) as u8);
        }
    }
    if pad {
        if bits > 0 {
            ret.push(((acc << (to_bits - bits)) & maxv) as u8);
        }
    } else if bits >= from_bits || ((acc << (to_bits - bits)) & maxv) != 0 {
        return None;
    }
    Some(ret)
}
