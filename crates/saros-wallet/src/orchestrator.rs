//! High-level wallet operations over the ledger and store collaborators.
//!
//! The orchestrator wires discovery, selection, and assembly into the three
//! caller-facing operations: account creation, address discovery, and
//! payment building. Every operation is all-or-nothing; a failure leaves no
//! partial artifact behind, and the returned error names the step that
//! failed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use saros_core::address::Network;
use saros_core::constants::{EXTERNAL_CHAIN, UTXO_QUERY_TIMEOUT_MS};
use saros_core::traits::{LedgerQuery, WalletStore};
use saros_core::types::{
    AccountRecord, RawProtocolParameters, SignedTransaction, TransactionRecord, Utxo,
};

use crate::assembler::{self, FeePolicy};
use crate::coin_selection;
use crate::discovery::{self, CancelFlag, Chain, DiscoveredAddress, DiscoveryPolicy};
use crate::error::WalletError;
use crate::keys::{derive_address, Seed};
use crate::params::resolve_parameters;
use crate::path::DerivationPath;

/// Result of account creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountCreated {
    pub account_index: u32,
    /// First external address of the account.
    pub payment_address: String,
    /// Opaque reference the caller can use to locate the account's keys.
    pub account_key_ref: String,
}

/// Drives wallet operations against pluggable collaborators.
pub struct WalletOrchestrator {
    ledger: Arc<dyn LedgerQuery>,
    store: Arc<dyn WalletStore>,
    network: Network,
    discovery_policy: DiscoveryPolicy,
    fee_policy: FeePolicy,
    utxo_query_timeout: Duration,
}

impl WalletOrchestrator {
    pub fn new(ledger: Arc<dyn LedgerQuery>, store: Arc<dyn WalletStore>, network: Network) -> Self {
        Self {
            ledger,
            store,
            network,
            discovery_policy: DiscoveryPolicy::default(),
            fee_policy: FeePolicy::default(),
            utxo_query_timeout: Duration::from_millis(UTXO_QUERY_TIMEOUT_MS),
        }
    }

    /// Override the discovery pacing and gap policy.
    pub fn with_discovery_policy(mut self, policy: DiscoveryPolicy) -> Self {
        self.discovery_policy = policy;
        self
    }

    /// Override the fee buffer policy.
    pub fn with_fee_policy(mut self, policy: FeePolicy) -> Self {
        self.fee_policy = policy;
        self
    }

    /// Override the per-query UTXO fetch timeout.
    pub fn with_utxo_query_timeout(mut self, timeout: Duration) -> Self {
        self.utxo_query_timeout = timeout;
        self
    }

    /// Create an account: derive its first external address and persist the
    /// account metadata.
    pub fn create_account(
        &self,
        seed: &Seed,
        account_index: u32,
    ) -> Result<AccountCreated, WalletError> {
        let payment_address =
            derive_address(seed, account_index, EXTERNAL_CHAIN, 0, self.network)?.encode();
        let account_key_ref = DerivationPath::account(account_index)?.to_string();

        self.store
            .put_account(&AccountRecord {
                account_index,
                root_key_ref: account_key_ref.clone(),
            })
            .map_err(|e| WalletError::Storage(format!("persisting account: {e}")))?;

        info!(account_index, address = %payment_address, "account created");
        Ok(AccountCreated {
            account_index,
            payment_address,
            account_key_ref,
        })
    }

    /// Scan one chain of an account and persist the discovered batch.
    pub async fn discover_addresses(
        &self,
        seed: &Seed,
        account_index: u32,
        chain: Chain,
        cancel: &CancelFlag,
    ) -> Result<Vec<DiscoveredAddress>, WalletError> {
        let discovered = discovery::discover_chain(
            seed,
            account_index,
            chain,
            self.network,
            self.ledger.as_ref(),
            &self.discovery_policy,
            cancel,
        )
        .await?;

        let records: Vec<_> = discovered.iter().map(DiscoveredAddress::to_record).collect();
        self.store
            .put_addresses(account_index, &records)
            .map_err(|e| WalletError::Storage(format!("persisting addresses: {e}")))?;

        info!(
            account_index,
            chain = chain.index(),
            total = discovered.len(),
            used = discovered.iter().filter(|a| a.is_used).count(),
            "discovery complete"
        );
        Ok(discovered)
    }

    /// Fetch UTXOs for a list of addresses, sequentially and paced.
    ///
    /// A query that times out degrades to "no data" for that address; a
    /// query that errors fails the whole operation.
    pub async fn fetch_utxos_for(
        &self,
        addresses: &[String],
        cancel: &CancelFlag,
    ) -> Result<Vec<Utxo>, WalletError> {
        let mut utxos = Vec::new();
        for (i, address) in addresses.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(WalletError::Cancelled);
            }
            match tokio::time::timeout(self.utxo_query_timeout, self.ledger.fetch_utxos(address))
                .await
            {
                Ok(Ok(mut batch)) => utxos.append(&mut batch),
                Ok(Err(e)) => {
                    return Err(WalletError::Ledger(format!("fetching UTXOs for {address}: {e}")));
                }
                Err(_) => {
                    warn!(address = %address, "UTXO query timed out, treating as no data");
                }
            }
            if i + 1 < addresses.len() && !self.discovery_policy.inter_request_delay.is_zero() {
                tokio::time::sleep(self.discovery_policy.inter_request_delay).await;
            }
        }
        Ok(utxos)
    }

    /// Build, sign, and persist a payment from candidate UTXOs.
    ///
    /// Candidates are consumed in the given order. The artifact is returned
    /// only after the store accepted it.
    pub async fn build_payment(
        &self,
        candidates: &[Utxo],
        to_address: &str,
        amount: u64,
        change_address: Option<&str>,
    ) -> Result<SignedTransaction, WalletError> {
        let raw = self
            .ledger
            .fetch_protocol_parameters()
            .await
            .map_err(|e| WalletError::Ledger(format!("fetching protocol parameters: {e}")))?;
        let current_slot = self
            .ledger
            .fetch_current_slot()
            .await
            .map_err(|e| WalletError::Ledger(format!("fetching current slot: {e}")))?;

        self.build_payment_at(candidates, to_address, amount, change_address, &raw, current_slot)
    }

    /// Build, sign, and persist a payment against a caller-supplied ledger
    /// view, skipping the parameter and slot round-trips.
    pub fn build_payment_at(
        &self,
        candidates: &[Utxo],
        to_address: &str,
        amount: u64,
        change_address: Option<&str>,
        raw_params: &RawProtocolParameters,
        current_slot: u64,
    ) -> Result<SignedTransaction, WalletError> {
        let params = resolve_parameters(raw_params);
        let selection = coin_selection::select(candidates, amount, &params)?;
        let signed = assembler::assemble_payment(
            params,
            self.fee_policy.clone(),
            current_slot,
            &selection.selected,
            to_address,
            amount,
            change_address,
        )?;

        let tx_hash = saros_core::types::Hash256(blake3::hash(&signed.body_bytes).into());
        self.store
            .put_transaction(&TransactionRecord {
                tx_hash: tx_hash.to_string(),
                serialized_hex: signed.serialized_hex.clone(),
                fee: signed.fee,
                change: signed.change,
            })
            .map_err(|e| WalletError::Storage(format!("persisting transaction: {e}")))?;

        info!(tx_hash = %tx_hash, fee = signed.fee, change = signed.change, "payment built");
        Ok(signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use saros_core::crypto::KeyMaterial;
    use saros_core::error::{LedgerError, StoreError};
    use saros_core::types::{AddressRecord, AssetAmount, Hash256, RawProtocolParameters};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    struct MockLedger {
        used: HashSet<String>,
        utxos: HashMap<String, Vec<Utxo>>,
        slot: u64,
        raw_params: RawProtocolParameters,
        slow_utxo_queries: bool,
        fail_utxo_queries: bool,
        fail_param_queries: bool,
    }

    impl MockLedger {
        fn new() -> Self {
            Self {
                used: HashSet::new(),
                utxos: HashMap::new(),
                slot: 41_000_000,
                raw_params: RawProtocolParameters {
                    min_fee_a: Some("44".into()),
                    min_fee_b: Some("155381".into()),
                    coins_per_utxo_word: Some("34482".into()),
                    ..Default::default()
                },
                slow_utxo_queries: false,
                fail_utxo_queries: false,
                fail_param_queries: false,
            }
        }
    }

    #[async_trait]
    impl LedgerQuery for MockLedger {
        async fn is_address_used(&self, address: &str) -> Result<bool, LedgerError> {
            Ok(self.used.contains(address))
        }

        async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, LedgerError> {
            if self.fail_utxo_queries {
                return Err(LedgerError::Unavailable("mock outage".into()));
            }
            if self.slow_utxo_queries {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(self.utxos.get(address).cloned().unwrap_or_default())
        }

        async fn fetch_protocol_parameters(&self) -> Result<RawProtocolParameters, LedgerError> {
            if self.fail_param_queries {
                return Err(LedgerError::Unavailable("mock outage".into()));
            }
            Ok(self.raw_params.clone())
        }

        async fn fetch_current_slot(&self) -> Result<u64, LedgerError> {
            Ok(self.slot)
        }
    }

    #[derive(Default)]
    struct MockStore {
        accounts: Mutex<Vec<AccountRecord>>,
        addresses: Mutex<HashMap<u32, Vec<AddressRecord>>>,
        transactions: Mutex<Vec<TransactionRecord>>,
        fail_writes: bool,
    }

    impl WalletStore for MockStore {
        fn put_account(&self, account: &AccountRecord) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Backend("mock write failure".into()));
            }
            self.accounts.lock().unwrap().push(account.clone());
            Ok(())
        }

        fn put_addresses(
            &self,
            account_index: u32,
            addresses: &[AddressRecord],
        ) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Backend("mock write failure".into()));
            }
            self.addresses
                .lock()
                .unwrap()
                .insert(account_index, addresses.to_vec());
            Ok(())
        }

        fn put_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Backend("mock write failure".into()));
            }
            self.transactions.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn fast_orchestrator(
        ledger: MockLedger,
        store: MockStore,
    ) -> (WalletOrchestrator, Arc<MockStore>) {
        let store = Arc::new(store);
        let orch = WalletOrchestrator::new(Arc::new(ledger), store.clone(), Network::Testnet)
            .with_discovery_policy(DiscoveryPolicy {
                gap_limit: 5,
                inter_request_delay: Duration::ZERO,
            });
        (orch, store)
    }

    fn seed() -> Seed {
        Seed::from_bytes(&[3u8; 32]).unwrap()
    }

    fn utxo(tag: u8, lovelace: u64) -> Utxo {
        Utxo {
            tx_hash: Hash256([tag; 32]),
            output_index: 0,
            amounts: vec![AssetAmount::lovelace(lovelace)],
            owner_address: "tsrs1owner".into(),
            key_ref: KeyMaterial::Normal([tag; 32]),
        }
    }

    #[tokio::test]
    async fn create_account_persists_and_returns_address() {
        let (orch, store) = fast_orchestrator(MockLedger::new(), MockStore::default());
        let created = orch.create_account(&seed(), 0).unwrap();

        assert!(created.payment_address.starts_with("tsrs1"));
        assert_eq!(created.account_key_ref, "1852'/1815'/0'");
        let accounts = store.accounts.lock().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_index, 0);
    }

    #[tokio::test]
    async fn create_account_storage_failure() {
        let store = MockStore {
            fail_writes: true,
            ..Default::default()
        };
        let (orch, _) = fast_orchestrator(MockLedger::new(), store);
        let err = orch.create_account(&seed(), 0).unwrap_err();
        assert!(matches!(err, WalletError::Storage(_)));
    }

    #[tokio::test]
    async fn discover_addresses_persists_batch() {
        let mut ledger = MockLedger::new();
        // mark the first two external addresses used
        for i in 0..2 {
            let addr = derive_address(&seed(), 0, EXTERNAL_CHAIN, i, Network::Testnet)
                .unwrap()
                .encode();
            ledger.used.insert(addr);
        }
        let (orch, store) = fast_orchestrator(ledger, MockStore::default());

        let discovered = orch
            .discover_addresses(&seed(), 0, Chain::External, &CancelFlag::new())
            .await
            .unwrap();

        // 2 used + gap of 5
        assert_eq!(discovered.len(), 7);
        assert!(discovered[0].is_used && discovered[1].is_used);
        assert_eq!(store.addresses.lock().unwrap()[&0].len(), 7);
    }

    #[tokio::test]
    async fn fetch_utxos_sequential_and_merged() {
        let mut ledger = MockLedger::new();
        ledger.utxos.insert("a1".into(), vec![utxo(1, 2_000_000)]);
        ledger.utxos.insert("a2".into(), vec![utxo(2, 3_000_000)]);
        let (orch, _) = fast_orchestrator(ledger, MockStore::default());

        let utxos = orch
            .fetch_utxos_for(&["a1".into(), "a2".into(), "a3".into()], &CancelFlag::new())
            .await
            .unwrap();
        assert_eq!(utxos.len(), 2);
    }

    #[tokio::test]
    async fn fetch_utxos_timeout_degrades_to_empty() {
        let mut ledger = MockLedger::new();
        ledger.slow_utxo_queries = true;
        ledger.utxos.insert("a1".into(), vec![utxo(1, 2_000_000)]);
        let store = MockStore::default();
        let orch = WalletOrchestrator::new(
            Arc::new(ledger),
            Arc::new(store),
            Network::Testnet,
        )
        .with_utxo_query_timeout(Duration::from_millis(10));

        let utxos = orch
            .fetch_utxos_for(&["a1".into()], &CancelFlag::new())
            .await
            .unwrap();
        assert!(utxos.is_empty());
    }

    #[tokio::test]
    async fn fetch_utxos_hard_failure_aborts() {
        let mut ledger = MockLedger::new();
        ledger.fail_utxo_queries = true;
        let (orch, _) = fast_orchestrator(ledger, MockStore::default());

        let err = orch
            .fetch_utxos_for(&["a1".into()], &CancelFlag::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Ledger(_)));
    }

    #[tokio::test]
    async fn fetch_utxos_cancellation() {
        let (orch, _) = fast_orchestrator(MockLedger::new(), MockStore::default());
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = orch
            .fetch_utxos_for(&["a1".into()], &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::Cancelled);
    }

    #[tokio::test]
    async fn build_payment_end_to_end() {
        let (orch, store) = fast_orchestrator(MockLedger::new(), MockStore::default());
        let candidates = vec![utxo(1, 10_000_000), utxo(2, 10_000_000)];

        let signed = orch
            .build_payment(&candidates, "tsrs1dest", 5_000_000, Some("tsrs1change"))
            .await
            .unwrap();

        assert!(!signed.serialized_hex.is_empty());
        assert!(signed.fee > 0);
        let records = store.transactions.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].fee, signed.fee);
        assert_eq!(records[0].serialized_hex, signed.serialized_hex);
    }

    #[tokio::test]
    async fn build_payment_insufficient_funds_stores_nothing() {
        let (orch, store) = fast_orchestrator(MockLedger::new(), MockStore::default());
        let candidates = vec![utxo(1, 4_000_000)];

        let err = orch
            .build_payment(&candidates, "tsrs1dest", 5_000_000, Some("tsrs1change"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::InsufficientFunds { .. }));
        assert!(store.transactions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn build_payment_storage_failure_after_assembly() {
        let store = MockStore {
            fail_writes: true,
            ..Default::default()
        };
        let (orch, _) = fast_orchestrator(MockLedger::new(), store);
        let candidates = vec![utxo(1, 10_000_000)];

        let err = orch
            .build_payment(&candidates, "tsrs1dest", 5_000_000, Some("tsrs1change"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Storage(_)));
    }

    #[tokio::test]
    async fn build_payment_at_uses_supplied_view_only() {
        let mut ledger = MockLedger::new();
        // the ledger's own parameter endpoint is down; the supplied view
        // must carry the operation
        ledger.fail_param_queries = true;
        let raw = ledger.raw_params.clone();
        let (orch, store) = fast_orchestrator(ledger, MockStore::default());

        let signed = orch
            .build_payment_at(
                &[utxo(1, 10_000_000)],
                "tsrs1dest",
                5_000_000,
                Some("tsrs1change"),
                &raw,
                1_000,
            )
            .unwrap();

        let body =
            saros_core::types::TransactionBody::from_bytes(&signed.body_bytes).unwrap();
        assert_eq!(body.ttl, 1_000 + saros_core::constants::TTL_WINDOW_SLOTS);
        assert_eq!(store.transactions.lock().unwrap().len(), 1);

        // the round-trip variant surfaces the outage instead
        let err = orch
            .build_payment(&[utxo(1, 10_000_000)], "tsrs1dest", 5_000_000, Some("tsrs1change"))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Ledger(_)));
    }

    #[tokio::test]
    async fn build_payment_with_degraded_parameters() {
        let mut ledger = MockLedger::new();
        ledger.raw_params = RawProtocolParameters {
            min_fee_a: Some("garbage".into()),
            ..Default::default()
        };
        let (orch, _) = fast_orchestrator(ledger, MockStore::default());
        let candidates = vec![utxo(1, 10_000_000)];

        // fallbacks keep the operation alive
        let signed = orch
            .build_payment(&candidates, "tsrs1dest", 5_000_000, Some("tsrs1change"))
            .await
            .unwrap();
        assert!(signed.fee > 0);
    }
}
