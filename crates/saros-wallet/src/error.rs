//! Wallet error types.

use saros_core::error::{AddressError, CryptoError, TransactionError};
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Insufficient funds to cover the target amount, fee, and change reserve.
    #[error("insufficient funds: available {available}, required {required} (short {shortfall})")]
    InsufficientFunds {
        /// Total spendable lovelace across all candidates.
        available: u64,
        /// Target plus estimated fee plus minimum change output.
        required: u64,
        /// `required - available`, always positive.
        shortfall: u64,
    },

    /// No spendable UTXOs among the candidates.
    #[error("no spendable UTXOs")]
    NoUtxos,

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Key derivation failure. Always aborts the operation that needed the key.
    #[error("key derivation: {0}")]
    Derivation(String),

    /// A candidate UTXO's key material or value bundle could not be resolved.
    #[error("input resolution: {0}")]
    InputResolution(String),

    /// No derived key matches an input's required signing key.
    #[error("missing signing key: {0}")]
    MissingSigningKey(String),

    /// Fee arithmetic produced a non-representable value.
    #[error("fee computation: {0}")]
    FeeComputation(String),

    /// The finished artifact failed a final consistency check.
    #[error("serialization invariant violated: {0}")]
    SerializationInvariant(String),

    /// Change is owed but no change address was supplied.
    #[error("no change address available")]
    NoChangeAddress,

    /// An assembler stage was invoked out of order.
    #[error("invalid stage: expected {expected}, was {actual}")]
    InvalidStage {
        expected: &'static str,
        actual: &'static str,
    },

    /// The operation was cancelled cooperatively.
    #[error("operation cancelled")]
    Cancelled,

    /// Whole-operation ledger failure (as opposed to a per-address
    /// usage-query failure, which is recorded on the address instead).
    #[error("ledger: {0}")]
    Ledger(String),

    /// Persistence failure.
    #[error("storage: {0}")]
    Storage(String),

    /// Invalid BIP-39 mnemonic phrase.
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// Cryptographic error from saros-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Address error from saros-core.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Transaction error from saros-core.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
