//! Core engine types: UTXOs, transaction bodies, witnesses, parameters.
//!
//! All monetary values are in lovelace (1 coin = 10^6 lovelace) and all
//! numeric fields use u64. Transaction bodies serialize through bincode
//! with the standard config so the byte form is canonical: hashing and
//! signing commit to exactly those bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::KeyMaterial;
use crate::error::TransactionError;

/// A 32-byte hash value.
///
/// Used for transaction hashes and key hashes (both BLAKE3).
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Hash256 from a byte array.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One entry of a UTXO's value bundle: an asset-unit identifier and its
/// integer quantity. The base currency uses the unit
/// [`LOVELACE_UNIT`](crate::constants::LOVELACE_UNIT).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AssetAmount {
    /// Asset-unit identifier.
    pub unit: String,
    /// Integer quantity of the unit.
    pub quantity: u64,
}

impl AssetAmount {
    /// A lovelace-only amount.
    pub fn lovelace(quantity: u64) -> Self {
        Self {
            unit: crate::constants::LOVELACE_UNIT.to_string(),
            quantity,
        }
    }

    /// Whether this entry is the base currency.
    pub fn is_lovelace(&self) -> bool {
        self.unit == crate::constants::LOVELACE_UNIT
    }
}

/// An unspent transaction output as reported by the ledger collaborator.
///
/// Immutable once fetched. The engine never marks a UTXO spent anywhere;
/// spending it means placing it into a transaction input set.
#[derive(Clone, Debug)]
pub struct Utxo {
    /// Hash of the transaction that created this output.
    pub tx_hash: Hash256,
    /// Index of the output within that transaction.
    pub output_index: u32,
    /// Value bundle carried by the output.
    pub amounts: Vec<AssetAmount>,
    /// Bech32m address owning the output.
    pub owner_address: String,
    /// Key material able to spend the output, in one of several encodings.
    pub key_ref: KeyMaterial,
}

impl Utxo {
    /// Lovelace carried by this UTXO, if its bundle has a base-currency entry.
    pub fn lovelace(&self) -> Option<u64> {
        self.amounts
            .iter()
            .find(|a| a.is_lovelace())
            .map(|a| a.quantity)
    }

    /// Whether the bundle holds exactly one entry and it is lovelace.
    ///
    /// Multi-asset outputs are excluded from coin selection upstream; this
    /// is the predicate that excludes them.
    pub fn is_single_asset(&self) -> bool {
        self.amounts.len() == 1 && self.amounts[0].is_lovelace()
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.output_index)
    }
}

/// A transaction input: reference to the output being consumed.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub struct TxInput {
    /// Hash of the transaction containing the referenced output.
    pub tx_hash: Hash256,
    /// Index of the output within that transaction.
    pub index: u32,
}

/// A transaction output paying lovelace to an address.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TxOutput {
    /// Recipient address in bech32m form.
    pub address: String,
    /// Value in lovelace.
    pub lovelace: u64,
}

/// The unsigned transaction body: what gets hashed and signed.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TransactionBody {
    /// Inputs consuming previous outputs.
    pub inputs: Vec<TxInput>,
    /// Outputs created by this transaction (payment plus change).
    pub outputs: Vec<TxOutput>,
    /// Transaction fee in lovelace.
    pub fee: u64,
    /// Slot after which the transaction is no longer valid for inclusion.
    pub ttl: u64,
}

impl TransactionBody {
    /// Serialize the body to its canonical byte form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }

    /// Parse a body back from canonical bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TransactionError> {
        let (body, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))?;
        Ok(body)
    }

    /// Compute the transaction hash (BLAKE3 over exactly the canonical bytes).
    pub fn body_hash(&self) -> Result<Hash256, TransactionError> {
        let encoded = self.to_bytes()?;
        Ok(Hash256(blake3::hash(&encoded).into()))
    }

    /// Sum of all output values. Returns None on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.lovelace))
    }
}

/// A vkey witness: one signature authorizing spends by one key.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct Witness {
    /// Raw Ed25519 public key (32 bytes).
    pub vkey: [u8; 32],
    /// Ed25519 signature over the transaction hash (64 bytes).
    #[serde(with = "serde_bytes64")]
    pub signature: [u8; 64],
}

/// The witness set attached to a signed transaction: one entry per
/// distinct signing key, not one per input.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct WitnessSet {
    pub vkey_witnesses: Vec<Witness>,
}

/// The full broadcastable container: body plus witness set.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct TransactionContainer {
    pub body: TransactionBody,
    pub witnesses: WitnessSet,
}

impl TransactionContainer {
    /// Serialize the container to canonical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TransactionError> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| TransactionError::Serialization(e.to_string()))
    }
}

/// Terminal, immutable artifact of a payment flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    /// Canonical bytes of the transaction body.
    pub body_bytes: Vec<u8>,
    /// Witnesses over the body hash.
    pub witness_set: WitnessSet,
    /// Hex encoding of the full container, ready for broadcast.
    pub serialized_hex: String,
    /// Final fee in lovelace.
    pub fee: u64,
    /// Change returned to the wallet in lovelace.
    pub change: u64,
}

/// Numeric protocol-parameter snapshot used for fee and minimum-value math.
///
/// Read-only: fetched once per operation, never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolParameters {
    pub min_fee_coeff_a: u64,
    pub min_fee_const_b: u64,
    pub coins_per_utxo_word: u64,
    pub pool_deposit: u64,
    pub key_deposit: u64,
    pub max_tx_size: u64,
    pub max_value_size: u64,
}

/// Protocol parameters as the ledger collaborator reports them: string
/// fields that may be absent or malformed. Resolved into
/// [`ProtocolParameters`] with named fallback constants; a parse failure
/// is never fatal.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawProtocolParameters {
    pub min_fee_a: Option<String>,
    pub min_fee_b: Option<String>,
    pub coins_per_utxo_word: Option<String>,
    pub pool_deposit: Option<String>,
    pub key_deposit: Option<String>,
    pub max_tx_size: Option<String>,
    pub max_val_size: Option<String>,
}

// --- Persisted record shapes (consumed by the external store) ---

/// Wallet account metadata as the store keeps it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AccountRecord {
    /// Account index within the derivation tree.
    pub account_index: u32,
    /// Opaque reference to the encrypted root key held by the caller.
    pub root_key_ref: String,
}

/// A discovered address as persisted by the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AddressRecord {
    /// Bech32m address string.
    pub address: String,
    /// Textual derivation path that produced the address.
    pub path: String,
    /// Whether the ledger reported the address as used.
    pub is_used: bool,
    /// When usage was observed. Staleness policy belongs to the caller.
    pub observed_at: chrono::DateTime<chrono::Utc>,
}

/// A signed-transaction artifact as persisted by the store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Hash of the transaction body.
    pub tx_hash: String,
    /// Hex encoding of the broadcastable container.
    pub serialized_hex: String,
    /// Fee in lovelace.
    pub fee: u64,
    /// Change in lovelace.
    pub change: u64,
}

mod serde_bytes64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 64], D::Error> {
        let v = Vec::<u8>::deserialize(deserializer)?;
        v.try_into()
            .map_err(|_| serde::de::Error::custom("expected 64 bytes"))
    }
}
