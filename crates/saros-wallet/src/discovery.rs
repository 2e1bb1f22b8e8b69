//! Gap-limited address discovery against the remote ledger.
//!
//! Walks a chain's address indices strictly ascending, asking the ledger
//! whether each derived address has been used, until a run of consecutive
//! unused addresses reaches the gap limit. No reordering and no parallel
//! speculation: each step's termination decision depends on the previous
//! step's answer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use saros_core::address::{Address, Network};
use saros_core::constants::{DEFAULT_GAP_LIMIT, EXTERNAL_CHAIN, INTER_REQUEST_DELAY_MS, INTERNAL_CHAIN};
use saros_core::traits::LedgerQuery;
use saros_core::types::AddressRecord;

use crate::error::WalletError;
use crate::keys::{KeyNode, Seed};
use crate::path::DerivationPath;

/// Which address chain of an account to scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chain {
    /// Receive addresses (chain 0).
    External,
    /// Change addresses (chain 1).
    Internal,
}

impl Chain {
    /// The chain index used in derivation paths.
    pub fn index(&self) -> u32 {
        match self {
            Chain::External => EXTERNAL_CHAIN,
            Chain::Internal => INTERNAL_CHAIN,
        }
    }
}

/// Cooperative cancellation flag shared between an operation and its caller.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Request cancellation. Takes effect at the next iteration boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pacing and stop policy for a discovery scan.
#[derive(Clone, Debug)]
pub struct DiscoveryPolicy {
    /// Consecutive unused addresses required before the scan stops.
    pub gap_limit: u32,
    /// Mandatory delay between successive usage queries.
    pub inter_request_delay: Duration,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            gap_limit: DEFAULT_GAP_LIMIT,
            inter_request_delay: Duration::from_millis(INTER_REQUEST_DELAY_MS),
        }
    }
}

/// One address produced by a discovery scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredAddress {
    /// The derived base address.
    pub address: Address,
    /// The path that produced the payment credential.
    pub path: DerivationPath,
    /// Whether the ledger reported the address as used.
    pub is_used: bool,
    /// When the usage answer was observed.
    pub observed_at: chrono::DateTime<chrono::Utc>,
    /// Set when the usage query failed and the address was counted as
    /// unused by default. The caller decides whether to re-check.
    pub query_failure: Option<String>,
}

impl DiscoveredAddress {
    /// The persisted form of this address.
    pub fn to_record(&self) -> AddressRecord {
        AddressRecord {
            address: self.address.encode(),
            path: self.path.to_string(),
            is_used: self.is_used,
            observed_at: self.observed_at,
        }
    }
}

/// Scan one chain of an account until `gap_limit` consecutive addresses
/// come back unused.
///
/// Returns exactly `last-used-index + 1 + gap_limit` addresses (or
/// `gap_limit` when nothing was ever used). A usage-query failure is
/// counted as unused but recorded on the address; only derivation failure
/// or cancellation aborts the scan.
pub async fn discover_chain(
    seed: &Seed,
    account: u32,
    chain: Chain,
    network: Network,
    ledger: &dyn LedgerQuery,
    policy: &DiscoveryPolicy,
    cancel: &CancelFlag,
) -> Result<Vec<DiscoveredAddress>, WalletError> {
    let root = KeyNode::from_seed(seed);
    let stake_hash = root
        .derive_path(&DerivationPath::staking(account)?)
        .key_hash();

    let mut discovered = Vec::new();
    let mut consecutive_unused: u32 = 0;
    let mut index: u32 = 0;

    while consecutive_unused < policy.gap_limit {
        if cancel.is_cancelled() {
            debug!(account, chain = chain.index(), index, "discovery cancelled");
            return Err(WalletError::Cancelled);
        }

        let path = DerivationPath::address(account, chain.index(), index)?;
        let payment_hash = root.derive_path(&path).key_hash();
        let address = Address::from_key_hashes(payment_hash, stake_hash, network);
        let encoded = address.encode();

        let (is_used, query_failure) = match ledger.is_address_used(&encoded).await {
            Ok(used) => (used, None),
            Err(e) => {
                warn!(address = %encoded, error = %e, "usage query failed, counting as unused");
                (false, Some(e.to_string()))
            }
        };

        if is_used {
            consecutive_unused = 0;
        } else {
            consecutive_unused += 1;
        }

        debug!(
            account,
            chain = chain.index(),
            index,
            is_used,
            consecutive_unused,
            "discovery probe"
        );

        discovered.push(DiscoveredAddress {
            address,
            path,
            is_used,
            observed_at: chrono::Utc::now(),
            query_failure,
        });

        index = index
            .checked_add(1)
            .ok_or_else(|| WalletError::Derivation("address index overflow".into()))?;

        if consecutive_unused < policy.gap_limit && !policy.inter_request_delay.is_zero() {
            tokio::time::sleep(policy.inter_request_delay).await;
        }
    }

    Ok(discovered)
}
