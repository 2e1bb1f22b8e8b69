//! Greedy single-pass coin selection with linear fee estimation.
//!
//! Candidates are consumed in caller order (the caller controls
//! prioritization, e.g. oldest-first or largest-first). Selection stops as
//! soon as the accumulated input value covers the target plus the estimated
//! fee plus a minimum-value reserve for the change output. Deterministic
//! and non-optimal on purpose; no least-waste search.
//!
//! Multi-asset candidates are excluded before selection via [`spendable`];
//! the engine only funds payments from single-asset outputs.

use tracing::debug;

use saros_core::constants::{
    BASE_MIN_UTXO_LOVELACE, MIN_FEE_FLOOR, MULTI_ASSET_MIN_UTXO_LOVELACE, PER_INPUT_BYTES,
    PER_OUTPUT_BYTES, PER_WITNESS_BYTES, TX_OVERHEAD_BYTES, UTXO_ENTRY_WORDS,
};
use saros_core::types::{ProtocolParameters, Utxo};

use crate::error::WalletError;

/// Outputs assumed while estimating fees during selection: the payment
/// output plus the change output.
const ASSUMED_OUTPUTS: u64 = 2;

/// Result of coin selection.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Selected UTXOs, in the order they were accepted.
    pub selected: Vec<Utxo>,
    /// Total lovelace across the selected inputs.
    pub total_input: u64,
    /// Fee estimate at the moment selection stopped.
    pub estimated_fee: u64,
    /// Minimum lovelace any output (notably change) must carry.
    pub min_output_value: u64,
}

/// Balance breakdown over a candidate UTXO set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSummary {
    /// Lovelace held in single-asset UTXOs, available to selection.
    pub spendable: u64,
    /// Lovelace locked in multi-asset bundles, invisible to selection.
    pub excluded: u64,
    /// Number of spendable UTXOs.
    pub utxo_count: usize,
    /// Number of excluded multi-asset UTXOs.
    pub excluded_count: usize,
}

impl BalanceSummary {
    /// Total lovelace across all candidates, spendable or not.
    pub fn total(&self) -> u64 {
        self.spendable.saturating_add(self.excluded)
    }

    /// Spendable balance in whole coins (display helper, not for math).
    pub fn spendable_coins(&self) -> f64 {
        self.spendable as f64 / saros_core::constants::COIN as f64
    }
}

/// Summarize a candidate set without consuming it.
pub fn balance(candidates: &[Utxo]) -> BalanceSummary {
    let mut summary = BalanceSummary {
        spendable: 0,
        excluded: 0,
        utxo_count: 0,
        excluded_count: 0,
    };
    for u in candidates {
        let value = u.lovelace().unwrap_or(0);
        if u.is_single_asset() {
            summary.spendable = summary.spendable.saturating_add(value);
            summary.utxo_count += 1;
        } else {
            summary.excluded = summary.excluded.saturating_add(value);
            summary.excluded_count += 1;
        }
    }
    summary
}

/// Filter a candidate set down to the UTXOs selection may consume:
/// single-entry bundles whose only entry is the base currency.
pub fn spendable(candidates: &[Utxo]) -> Vec<Utxo> {
    candidates
        .iter()
        .filter(|u| {
            let ok = u.is_single_asset();
            if !ok {
                debug!(utxo = %u, "skipping multi-asset candidate");
            }
            ok
        })
        .cloned()
        .collect()
}

/// Estimated serialized size of a transaction with the given shape.
pub fn estimate_size(inputs: u64, outputs: u64, witnesses: u64) -> u64 {
    TX_OVERHEAD_BYTES
        .saturating_add(inputs.saturating_mul(PER_INPUT_BYTES))
        .saturating_add(outputs.saturating_mul(PER_OUTPUT_BYTES))
        .saturating_add(witnesses.saturating_mul(PER_WITNESS_BYTES))
}

/// Linear fee for a transaction shape: `a × size + b`, floored at the
/// safety minimum.
pub fn estimate_fee(params: &ProtocolParameters, inputs: u64, outputs: u64, witnesses: u64) -> u64 {
    let size = estimate_size(inputs, outputs, witnesses);
    params
        .min_fee_coeff_a
        .saturating_mul(size)
        .saturating_add(params.min_fee_const_b)
        .max(MIN_FEE_FLOOR)
}

/// Minimum lovelace an output must carry:
/// `max(base floor, coins_per_utxo_word-derived value)`, with a larger
/// floor when the output could bundle non-base assets.
pub fn min_output_value(params: &ProtocolParameters, multi_asset: bool) -> u64 {
    let base = if multi_asset {
        MULTI_ASSET_MIN_UTXO_LOVELACE
    } else {
        BASE_MIN_UTXO_LOVELACE
    };
    base.max(params.coins_per_utxo_word.saturating_mul(UTXO_ENTRY_WORDS))
}

/// Select candidates to fund `target` lovelace.
///
/// The fee estimate is recomputed at every step for the shape selected so
/// far (one witness assumed per input). A target below the minimum output
/// value is reserved at that minimum, since the payment output will be
/// bumped to it downstream. On exhaustion the error carries the full
/// available/required/shortfall breakdown and no partial selection
/// escapes.
pub fn select(
    candidates: &[Utxo],
    target: u64,
    params: &ProtocolParameters,
) -> Result<Selection, WalletError> {
    if target == 0 {
        return Err(WalletError::InvalidAmount("target must be non-zero".into()));
    }
    let spendable = spendable(candidates);
    if spendable.is_empty() {
        return Err(WalletError::NoUtxos);
    }

    let min_output = min_output_value(params, false);
    // what actually leaves the wallet once the payment is bumped
    let effective_target = target.max(min_output);

    let mut selected: Vec<Utxo> = Vec::new();
    let mut total_input: u64 = 0;

    for utxo in spendable.iter() {
        // spendable() guarantees a lovelace entry
        let value = utxo.lovelace().unwrap_or(0);
        selected.push(utxo.clone());
        total_input = total_input.saturating_add(value);

        let n = selected.len() as u64;
        let fee = estimate_fee(params, n, ASSUMED_OUTPUTS, n);
        let required = effective_target
            .saturating_add(fee)
            .saturating_add(min_output);

        debug!(
            step = n,
            utxo = %utxo,
            total_input,
            fee,
            required,
            "selection step"
        );

        if total_input >= required {
            return Ok(Selection {
                selected,
                total_input,
                estimated_fee: fee,
                min_output_value: min_output,
            });
        }
    }

    let n = selected.len() as u64;
    let fee = estimate_fee(params, n, ASSUMED_OUTPUTS, n);
    let required = effective_target
        .saturating_add(fee)
        .saturating_add(min_output);
    Err(WalletError::InsufficientFunds {
        available: total_input,
        required,
        shortfall: required.saturating_sub(total_input),
    })
}
