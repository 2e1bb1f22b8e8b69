//! Seed management and hierarchical key derivation.
//!
//! Uses BLAKE3 keyed derivation to walk `purpose'/coin'/account'/chain/index`
//! paths from a master seed. This is simpler than BIP-32 (which is
//! incompatible with Ed25519) while keeping the properties that matter:
//! every node is recoverable from the seed and path alone, and hardened
//! segments consume the parent's private scalar so a leaked public subtree
//! cannot climb past them.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use saros_core::address::{Address, Network};
use saros_core::crypto::{KeyPair, PublicKey};
use saros_core::types::Hash256;

use crate::error::WalletError;
use crate::path::{DerivationPath, Segment};

/// BLAKE3 KDF contexts. Distinct per derivation role so hardened, soft,
/// and root derivations can never collide.
const ROOT_SECRET_CONTEXT: &str = "saros-wallet root secret v1";
const ROOT_CHAIN_CONTEXT: &str = "saros-wallet root chain v1";
const CHILD_SECRET_CONTEXT: &str = "saros-wallet child secret v1";
const CHILD_CHAIN_CONTEXT: &str = "saros-wallet child chain v1";

/// Master seed entropy, 16 to 64 bytes.
///
/// Secret material is zeroized on drop to avoid leaking key material in
/// freed memory.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Seed {
    bytes: Vec<u8>,
}

impl Seed {
    /// Generate a random 32-byte seed from the OS cryptographic RNG.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut bytes = vec![0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a seed from raw entropy. Length must be 16 to 64 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        if !(16..=64).contains(&bytes.len()) {
            return Err(WalletError::Derivation(format!(
                "seed must be 16..=64 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Restore a seed from a BIP-39 mnemonic phrase.
    pub fn from_mnemonic(phrase: &str) -> Result<Self, WalletError> {
        crate::mnemonic::mnemonic_to_seed(phrase)
    }

    /// Encode this seed as a BIP-39 mnemonic phrase for backup.
    pub fn to_mnemonic(&self) -> Result<String, WalletError> {
        crate::mnemonic::seed_to_mnemonic(self)
    }

    /// Get the raw seed bytes. Handle with care.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Clone for Seed {
    fn clone(&self) -> Self {
        Self {
            bytes: self.bytes.clone(),
        }
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// One node of the derivation tree: a private scalar plus a chain code.
///
/// Both halves are zeroized on drop. Nodes are cheap to derive; prefer
/// re-deriving from the seed over holding many of them.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyNode {
    secret: [u8; 32],
    chain_code: [u8; 32],
}

impl KeyNode {
    /// The root node of a seed's derivation tree.
    pub fn from_seed(seed: &Seed) -> Self {
        Self {
            secret: blake3::derive_key(ROOT_SECRET_CONTEXT, seed.as_bytes()),
            chain_code: blake3::derive_key(ROOT_CHAIN_CONTEXT, seed.as_bytes()),
        }
    }

    /// Derive one child along a path segment.
    ///
    /// Hardened segments mix in the private scalar; soft segments mix in
    /// the public key instead, so they are derivable without the secret
    /// side-channel ever widening.
    pub fn derive_child(&self, segment: Segment) -> Self {
        let mut ikm = Vec::with_capacity(32 + 32 + 4);
        ikm.extend_from_slice(&self.chain_code);
        if segment.is_hardened() {
            ikm.extend_from_slice(&self.secret);
        } else {
            ikm.extend_from_slice(&self.public_key().to_bytes());
        }
        ikm.extend_from_slice(&segment.wire_index().to_le_bytes());

        let node = Self {
            secret: blake3::derive_key(CHILD_SECRET_CONTEXT, &ikm),
            chain_code: blake3::derive_key(CHILD_CHAIN_CONTEXT, &ikm),
        };
        ikm.zeroize();
        node
    }

    /// Derive the node at the end of a full path.
    pub fn derive_path(&self, path: &DerivationPath) -> Self {
        let mut node = Self {
            secret: self.secret,
            chain_code: self.chain_code,
        };
        for &segment in path.segments() {
            node = node.derive_child(segment);
        }
        node
    }

    /// The Ed25519 public key of this node.
    pub fn public_key(&self) -> PublicKey {
        KeyPair::from_secret_bytes(self.secret).public_key()
    }

    /// The BLAKE3 hash of this node's public key.
    pub fn key_hash(&self) -> Hash256 {
        self.public_key().key_hash()
    }

    /// A signing keypair for this node. Scope it tightly.
    pub fn keypair(&self) -> KeyPair {
        KeyPair::from_secret_bytes(self.secret)
    }

    /// The 64-byte extended form: secret scalar followed by chain code.
    pub fn extended_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&self.secret);
        out.extend_from_slice(&self.chain_code);
        out
    }
}

impl fmt::Debug for KeyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyNode")
            .field("key_hash", &self.key_hash())
            .finish_non_exhaustive()
    }
}

/// Derive the base address at `account'/chain/index`, pairing the payment
/// key with the account's fixed staking key.
pub fn derive_address(
    seed: &Seed,
    account: u32,
    chain: u32,
    index: u32,
    network: Network,
) -> Result<Address, WalletError> {
    let root = KeyNode::from_seed(seed);
    let payment = root.derive_path(&DerivationPath::address(account, chain, index)?);
    let stake = root.derive_path(&DerivationPath::staking(account)?);
    Ok(Address::from_key_hashes(
        payment.key_hash(),
        stake.key_hash(),
        network,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use saros_core::constants::EXTERNAL_CHAIN;

    fn seed(byte: u8) -> Seed {
        Seed::from_bytes(&[byte; 32]).unwrap()
    }

    #[test]
    fn seed_generate_unique() {
        let s1 = Seed::generate();
        let s2 = Seed::generate();
        assert_ne!(s1.as_bytes(), s2.as_bytes());
    }

    #[test]
    fn seed_length_bounds() {
        assert!(Seed::from_bytes(&[0u8; 15]).is_err());
        assert!(Seed::from_bytes(&[0u8; 16]).is_ok());
        assert!(Seed::from_bytes(&[0u8; 64]).is_ok());
        assert!(Seed::from_bytes(&[0u8; 65]).is_err());
    }

    #[test]
    fn seed_debug_hides_bytes() {
        let s = Seed::from_bytes(&[0xAB; 32]).unwrap();
        let debug = format!("{s:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("ab"));
    }

    #[test]
    fn root_node_deterministic() {
        let n1 = KeyNode::from_seed(&seed(1));
        let n2 = KeyNode::from_seed(&seed(1));
        assert_eq!(n1.public_key(), n2.public_key());
        assert_eq!(n1.key_hash(), n2.key_hash());
    }

    #[test]
    fn root_node_differs_per_seed() {
        let n1 = KeyNode::from_seed(&seed(1));
        let n2 = KeyNode::from_seed(&seed(2));
        assert_ne!(n1.key_hash(), n2.key_hash());
    }

    #[test]
    fn derive_path_deterministic() {
        let path = DerivationPath::address(0, EXTERNAL_CHAIN, 5).unwrap();
        let n1 = KeyNode::from_seed(&seed(3)).derive_path(&path);
        let n2 = KeyNode::from_seed(&seed(3)).derive_path(&path);
        assert_eq!(n1.key_hash(), n2.key_hash());
    }

    #[test]
    fn derive_path_differs_per_index() {
        let root = KeyNode::from_seed(&seed(4));
        let n5 = root.derive_path(&DerivationPath::address(0, 0, 5).unwrap());
        let n6 = root.derive_path(&DerivationPath::address(0, 0, 6).unwrap());
        assert_ne!(n5.key_hash(), n6.key_hash());
    }

    #[test]
    fn derive_path_differs_per_chain() {
        let root = KeyNode::from_seed(&seed(4));
        let ext = root.derive_path(&DerivationPath::address(0, 0, 0).unwrap());
        let int = root.derive_path(&DerivationPath::address(0, 1, 0).unwrap());
        assert_ne!(ext.key_hash(), int.key_hash());
    }

    #[test]
    fn hardened_and_soft_siblings_differ() {
        let root = KeyNode::from_seed(&seed(5));
        let h = root.derive_child(Segment::hardened(7).unwrap());
        let s = root.derive_child(Segment::soft(7).unwrap());
        assert_ne!(h.key_hash(), s.key_hash());
    }

    #[test]
    fn stepwise_matches_derive_path() {
        let root = KeyNode::from_seed(&seed(6));
        let path = DerivationPath::address(1, 0, 3).unwrap();
        let direct = root.derive_path(&path);

        let mut stepped = KeyNode::from_seed(&seed(6));
        for &seg in path.segments() {
            stepped = stepped.derive_child(seg);
        }
        assert_eq!(direct.key_hash(), stepped.key_hash());
    }

    #[test]
    fn keypair_signs_as_node() {
        let node = KeyNode::from_seed(&seed(7));
        let kp = node.keypair();
        assert_eq!(kp.public_key(), node.public_key());
    }

    #[test]
    fn extended_bytes_roundtrip_through_key_material() {
        use saros_core::crypto::KeyMaterial;
        let node = KeyNode::from_seed(&seed(8))
            .derive_path(&DerivationPath::address(0, 0, 0).unwrap());
        let resolved = KeyMaterial::Extended(node.extended_bytes())
            .resolve()
            .unwrap();
        assert_eq!(resolved.public_key(), node.public_key());
    }

    #[test]
    fn derive_address_deterministic() {
        let a1 = derive_address(&seed(9), 0, EXTERNAL_CHAIN, 0, Network::Testnet).unwrap();
        let a2 = derive_address(&seed(9), 0, EXTERNAL_CHAIN, 0, Network::Testnet).unwrap();
        assert_eq!(a1, a2);
        assert!(a1.encode().starts_with("tsrs1"));
    }

    #[test]
    fn derive_address_shares_stake_hash_within_account() {
        let a0 = derive_address(&seed(9), 0, 0, 0, Network::Mainnet).unwrap();
        let a1 = derive_address(&seed(9), 0, 0, 1, Network::Mainnet).unwrap();
        assert_ne!(a0.payment_hash(), a1.payment_hash());
        assert_eq!(a0.stake_hash(), a1.stake_hash());
    }

    #[test]
    fn derive_address_stake_differs_across_accounts() {
        let a = derive_address(&seed(9), 0, 0, 0, Network::Mainnet).unwrap();
        let b = derive_address(&seed(9), 1, 0, 0, Network::Mainnet).unwrap();
        assert_ne!(a.stake_hash(), b.stake_hash());
    }

    #[test]
    fn node_debug_hides_secret() {
        let node = KeyNode::from_seed(&seed(10));
        let debug = format!("{node:?}");
        assert!(debug.contains("key_hash"));
        assert!(!debug.contains("secret"));
    }
}
