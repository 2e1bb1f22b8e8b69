//! Defensive resolution of ledger-reported protocol parameters.
//!
//! The ledger collaborator reports parameters as optional strings. Each
//! field is parsed independently; a missing or malformed value falls back
//! to a named constant and logs a warning. A parameter problem is never
//! fatal to the operation that needed it.

use tracing::warn;

use saros_core::constants::{
    FALLBACK_COINS_PER_UTXO_WORD, FALLBACK_KEY_DEPOSIT, FALLBACK_MAX_TX_SIZE,
    FALLBACK_MAX_VALUE_SIZE, FALLBACK_MIN_FEE_COEFF_A, FALLBACK_MIN_FEE_CONST_B,
    FALLBACK_POOL_DEPOSIT,
};
use saros_core::types::{ProtocolParameters, RawProtocolParameters};

/// Resolve one raw field, falling back on absence or a parse failure.
fn resolve_field(name: &str, raw: Option<&str>, fallback: u64) -> u64 {
    match raw {
        Some(s) => match s.trim().parse::<u64>() {
            Ok(v) => v,
            Err(_) => {
                warn!(field = name, value = s, fallback, "unparseable protocol parameter");
                fallback
            }
        },
        None => {
            warn!(field = name, fallback, "missing protocol parameter");
            fallback
        }
    }
}

/// Resolve a raw parameter snapshot into the numeric form the fee and
/// minimum-value math consumes.
pub fn resolve_parameters(raw: &RawProtocolParameters) -> ProtocolParameters {
    ProtocolParameters {
        min_fee_coeff_a: resolve_field(
            "min_fee_a",
            raw.min_fee_a.as_deref(),
            FALLBACK_MIN_FEE_COEFF_A,
        ),
        min_fee_const_b: resolve_field(
            "min_fee_b",
            raw.min_fee_b.as_deref(),
            FALLBACK_MIN_FEE_CONST_B,
        ),
        coins_per_utxo_word: resolve_field(
            "coins_per_utxo_word",
            raw.coins_per_utxo_word.as_deref(),
            FALLBACK_COINS_PER_UTXO_WORD,
        ),
        pool_deposit: resolve_field(
            "pool_deposit",
            raw.pool_deposit.as_deref(),
            FALLBACK_POOL_DEPOSIT,
        ),
        key_deposit: resolve_field(
            "key_deposit",
            raw.key_deposit.as_deref(),
            FALLBACK_KEY_DEPOSIT,
        ),
        max_tx_size: resolve_field(
            "max_tx_size",
            raw.max_tx_size.as_deref(),
            FALLBACK_MAX_TX_SIZE,
        ),
        max_value_size: resolve_field(
            "max_val_size",
            raw.max_val_size.as_deref(),
            FALLBACK_MAX_VALUE_SIZE,
        ),
    }
}
