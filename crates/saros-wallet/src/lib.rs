//! # saros-wallet — HD wallet engine over a UTXO ledger.
//!
//! Provides deterministic key derivation from a master seed along
//! 1852'/1815' paths, gap-limited address discovery against a ledger
//! collaborator, greedy coin selection with linear fee estimation, and a
//! staged transaction assembler that signs and serializes payments.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`path`] — Derivation path segments and the 1852'/1815' layout
//! - [`keys`] — Seed, KeyNode, BLAKE3-based key derivation
//! - [`mnemonic`] — BIP-39 seed encoding
//! - [`params`] — Protocol-parameter resolution with fallbacks
//! - [`discovery`] — Gap-limited address discovery
//! - [`coin_selection`] — Greedy UTXO selection
//! - [`assembler`] — Staged transaction assembly and signing
//! - [`orchestrator`] — High-level wallet operations

pub mod assembler;
pub mod coin_selection;
pub mod discovery;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod orchestrator;
pub mod params;
pub mod path;

// Re-exports for convenient access
pub use assembler::{FeePolicy, TxAssembler};
pub use coin_selection::{BalanceSummary, Selection, balance, select, spendable};
pub use discovery::{CancelFlag, Chain, DiscoveredAddress, DiscoveryPolicy};
pub use error::WalletError;
pub use keys::{KeyNode, Seed, derive_address};
pub use orchestrator::{AccountCreated, WalletOrchestrator};
pub use path::{DerivationPath, Segment};
