//! Ed25519 signing primitives and key-material handling.
//!
//! Provides keypair construction, key hashing, and witness
//! creation/verification. Uses ed25519-dalek for the curve operations and
//! BLAKE3 for key hashes. The secret half of a [`KeyPair`] is zeroized on
//! drop by the underlying library.
//!
//! # Witness scheme
//!
//! A witness is one Ed25519 signature over the transaction body hash,
//! carrying the raw verifying key alongside it. One witness authorizes
//! every input spent by the same key, so a signed transaction carries one
//! witness per distinct key rather than one per input.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CryptoError;
use crate::types::{Hash256, Witness};

/// Spending-key material as it arrives from the outside, in one of the
/// encodings a wallet record may hold.
///
/// Resolved exactly once, at ingestion, into a [`KeyPair`]; the variant tag
/// routes the decoding instead of trial-and-error parsing per use.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum KeyMaterial {
    /// 64 bytes: secret scalar followed by chain code.
    Extended(Vec<u8>),
    /// Raw 32-byte secret scalar.
    Normal([u8; 32]),
    /// Hex-encoded 32-byte secret scalar.
    Encoded(String),
}

impl KeyMaterial {
    /// Resolve the material into a canonical keypair.
    pub fn resolve(&self) -> Result<KeyPair, CryptoError> {
        match self {
            KeyMaterial::Extended(bytes) => {
                if bytes.len() != 64 {
                    return Err(CryptoError::MalformedKeyMaterial(format!(
                        "extended key must be 64 bytes, got {}",
                        bytes.len()
                    )));
                }
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&bytes[..32]);
                Ok(KeyPair::from_secret_bytes(secret))
            }
            KeyMaterial::Normal(secret) => Ok(KeyPair::from_secret_bytes(*secret)),
            KeyMaterial::Encoded(hex_str) => {
                let decoded = hex::decode(hex_str.trim()).map_err(|e| {
                    CryptoError::MalformedKeyMaterial(format!("bad hex: {e}"))
                })?;
                let secret: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| {
                    CryptoError::MalformedKeyMaterial(format!(
                        "encoded key must be 32 bytes, got {}",
                        v.len()
                    ))
                })?;
                Ok(KeyPair::from_secret_bytes(secret))
            }
        }
    }
}

/// Ed25519 keypair able to witness transactions.
///
/// Wraps [`ed25519_dalek::SigningKey`]; the secret is zeroized on drop by
/// the underlying library. Keep instances scoped as narrowly as possible.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Derive the public key from this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Sign a message, returning the raw 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key for verifying witnesses and deriving credentials.
#[derive(Clone)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key: vk })
    }

    /// Get the raw public key bytes (32 bytes).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Compute the BLAKE3 key hash used as an address credential.
    pub fn key_hash(&self) -> Hash256 {
        key_hash(&self.to_bytes())
    }

    /// Verify an Ed25519 signature on a message.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

/// Compute the BLAKE3 key hash from raw public key bytes.
pub fn key_hash(pubkey_bytes: &[u8; 32]) -> Hash256 {
    Hash256(blake3::hash(pubkey_bytes).into())
}

/// Produce a vkey witness: a signature by `keypair` over the body hash.
pub fn make_witness(body_hash: &Hash256, keypair: &KeyPair) -> Witness {
    Witness {
        vkey: keypair.public_key().to_bytes(),
        signature: keypair.sign(body_hash.as_bytes()),
    }
}

/// Verify a witness against a body hash: the signature must verify and,
/// when `expected_key_hash` is given, the vkey must hash to it.
pub fn verify_witness(
    body_hash: &Hash256,
    witness: &Witness,
    expected_key_hash: Option<&Hash256>,
) -> Result<(), CryptoError> {
    let pk = PublicKey::from_bytes(&witness.vkey)?;
    if let Some(expected) = expected_key_hash {
        if pk.key_hash() != *expected {
            return Err(CryptoError::VerificationFailed);
        }
    }
    pk.verify(body_hash.as_bytes(), &witness.signature)
}
