//! Protocol and policy constants. All monetary values in lovelace
//! (1 coin = 10^6 lovelace).

pub const COIN: u64 = 1_000_000;

/// Asset-unit identifier of the base currency in a UTXO's amount bundle.
pub const LOVELACE_UNIT: &str = "lovelace";

// --- Derivation scheme (purpose'/coin'/account'/chain/index) ---

/// Purpose segment of every derivation path (hardened).
pub const PURPOSE: u32 = 1852;
/// Coin-type segment of every derivation path (hardened).
pub const COIN_TYPE: u32 = 1815;
/// Chain index for receive (external) addresses.
pub const EXTERNAL_CHAIN: u32 = 0;
/// Chain index for change (internal) addresses.
pub const INTERNAL_CHAIN: u32 = 1;
/// Chain index for the per-account staking credential.
pub const STAKING_CHAIN: u32 = 2;

/// Consecutive unused addresses required before discovery stops.
pub const DEFAULT_GAP_LIMIT: u32 = 20;

// --- Fallbacks for protocol parameters fetched from the ledger ---
//
// The ledger collaborator reports parameters as strings; each one is parsed
// defensively and replaced by the matching fallback on failure.

pub const FALLBACK_MIN_FEE_COEFF_A: u64 = 44;
pub const FALLBACK_MIN_FEE_CONST_B: u64 = 155_381;
pub const FALLBACK_COINS_PER_UTXO_WORD: u64 = 34_482;
pub const FALLBACK_POOL_DEPOSIT: u64 = 500_000_000;
pub const FALLBACK_KEY_DEPOSIT: u64 = 2_000_000;
pub const FALLBACK_MAX_TX_SIZE: u64 = 16_384;
pub const FALLBACK_MAX_VALUE_SIZE: u64 = 5_000;

// --- Fee and minimum-value policy ---

/// Fixed byte-size estimate for the non-variable part of a transaction.
pub const TX_OVERHEAD_BYTES: u64 = 160;
/// Estimated serialized bytes added per transaction input.
pub const PER_INPUT_BYTES: u64 = 44;
/// Estimated serialized bytes added per transaction output.
pub const PER_OUTPUT_BYTES: u64 = 70;
/// Estimated serialized bytes added per vkey witness.
pub const PER_WITNESS_BYTES: u64 = 102;

/// Safety floor below which an estimated fee is never allowed to fall.
pub const MIN_FEE_FLOOR: u64 = 160_000;

/// Minimum lovelace any single-asset output must carry.
pub const BASE_MIN_UTXO_LOVELACE: u64 = 500_000;
/// Larger minimum applied when an output could bundle non-base assets.
pub const MULTI_ASSET_MIN_UTXO_LOVELACE: u64 = 1_500_000;

/// Scale factor: minimum output value derived from `coins_per_utxo_word`.
/// A single-asset output occupies roughly this many words on the ledger.
pub const UTXO_ENTRY_WORDS: u64 = 20;

// --- Transaction validity ---

/// Slots added to the current slot to form a draft's time-to-live.
pub const TTL_WINDOW_SLOTS: u64 = 1000;

// --- Collaborator pacing ---

/// Mandatory delay between successive ledger queries, in milliseconds.
pub const INTER_REQUEST_DELAY_MS: u64 = 100;
/// Upper bound on a single UTXO query before it degrades to "no data".
pub const UTXO_QUERY_TIMEOUT_MS: u64 = 10_000;
