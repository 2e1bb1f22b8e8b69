//! Collaborator interfaces for the Saros wallet engine.
//!
//! These traits define the contracts at the engine boundary:
//! - [`LedgerQuery`] — read-only view of the remote ledger (an indexer or
//!   node gateway implements)
//! - [`WalletStore`] — persistence for accounts, addresses, and signed
//!   transactions (a database layer implements)
//!
//! The engine treats both as opaque: it never caches ledger answers beyond
//! a single operation and never reads back what it stored.

use async_trait::async_trait;

use crate::error::{LedgerError, StoreError};
use crate::types::{
    AccountRecord, AddressRecord, RawProtocolParameters, TransactionRecord, Utxo,
};

/// Read-only queries against the remote ledger.
///
/// Every call can fail or hang; callers own pacing, timeouts, and the
/// decision of how a failure degrades. Answers are snapshots, not
/// subscriptions.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Whether the ledger has ever seen a transaction touching `address`.
    async fn is_address_used(&self, address: &str) -> Result<bool, LedgerError>;

    /// All unspent outputs currently held by `address`.
    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, LedgerError>;

    /// Current protocol parameters, in the ledger's loosely-typed shape.
    async fn fetch_protocol_parameters(&self) -> Result<RawProtocolParameters, LedgerError>;

    /// Current slot number of the chain tip.
    async fn fetch_current_slot(&self) -> Result<u64, LedgerError>;
}

/// Persistence for wallet artifacts.
///
/// The engine only ever appends: accounts at creation, address batches
/// after discovery, transaction records after signing. It never reads its
/// own writes back; queries belong to the owning application.
pub trait WalletStore: Send + Sync {
    /// Persist metadata for a newly created account.
    fn put_account(&self, account: &AccountRecord) -> Result<(), StoreError>;

    /// Persist a batch of discovered addresses, replacing any prior batch
    /// for the same account and chain.
    fn put_addresses(
        &self,
        account_index: u32,
        addresses: &[AddressRecord],
    ) -> Result<(), StoreError>;

    /// Persist a signed-transaction artifact.
    fn put_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyMaterial;
    use crate::types::{AssetAmount, Hash256};
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    // ------------------------------------------------------------------
    // Mock: LedgerQuery
    // ------------------------------------------------------------------

    struct MockLedger {
        used: HashSet<String>,
        utxos: HashMap<String, Vec<Utxo>>,
        slot: u64,
        fail_queries: bool,
    }

    impl MockLedger {
        fn new() -> Self {
            Self {
                used: HashSet::new(),
                utxos: HashMap::new(),
                slot: 0,
                fail_queries: false,
            }
        }

        fn mark_used(&mut self, address: &str) {
            self.used.insert(address.to_string());
        }

        fn insert_utxo(&mut self, address: &str, lovelace: u64) {
            self.utxos.entry(address.to_string()).or_default().push(Utxo {
                tx_hash: Hash256([0x11; 32]),
                output_index: 0,
                amounts: vec![AssetAmount::lovelace(lovelace)],
                owner_address: address.to_string(),
                key_ref: KeyMaterial::Normal([7u8; 32]),
            });
        }
    }

    #[async_trait]
    impl LedgerQuery for MockLedger {
        async fn is_address_used(&self, address: &str) -> Result<bool, LedgerError> {
            if self.fail_queries {
                return Err(LedgerError::Query("mock failure".into()));
            }
            Ok(self.used.contains(address))
        }

        async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, LedgerError> {
            if self.fail_queries {
                return Err(LedgerError::Query("mock failure".into()));
            }
            Ok(self.utxos.get(address).cloned().unwrap_or_default())
        }

        async fn fetch_protocol_parameters(&self) -> Result<RawProtocolParameters, LedgerError> {
            Ok(RawProtocolParameters {
                min_fee_a: Some("44".into()),
                min_fee_b: Some("155381".into()),
                ..Default::default()
            })
        }

        async fn fetch_current_slot(&self) -> Result<u64, LedgerError> {
            Ok(self.slot)
        }
    }

    // ------------------------------------------------------------------
    // Mock: WalletStore
    // ------------------------------------------------------------------

    struct MockStore {
        accounts: Mutex<Vec<AccountRecord>>,
        addresses: Mutex<HashMap<u32, Vec<AddressRecord>>>,
        transactions: Mutex<Vec<TransactionRecord>>,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                accounts: Mutex::new(Vec::new()),
                addresses: Mutex::new(HashMap::new()),
                transactions: Mutex::new(Vec::new()),
            }
        }
    }

    impl WalletStore for MockStore {
        fn put_account(&self, account: &AccountRecord) -> Result<(), StoreError> {
            self.accounts.lock().unwrap().push(account.clone());
            Ok(())
        }

        fn put_addresses(
            &self,
            account_index: u32,
            addresses: &[AddressRecord],
        ) -> Result<(), StoreError> {
            self.addresses
                .lock()
                .unwrap()
                .insert(account_index, addresses.to_vec());
            Ok(())
        }

        fn put_transaction(&self, record: &TransactionRecord) -> Result<(), StoreError> {
            self.transactions.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Object safety
    // ------------------------------------------------------------------

    fn _assert_ledger_object_safe(lq: &dyn LedgerQuery) {
        let _ = lq;
    }

    fn _assert_store_object_safe(ws: &dyn WalletStore) {
        let _ = ws;
    }

    // ------------------------------------------------------------------
    // LedgerQuery tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn ledger_address_usage() {
        let mut lq = MockLedger::new();
        lq.mark_used("srs1abc");
        assert!(lq.is_address_used("srs1abc").await.unwrap());
        assert!(!lq.is_address_used("srs1def").await.unwrap());
    }

    #[tokio::test]
    async fn ledger_fetch_utxos() {
        let mut lq = MockLedger::new();
        lq.insert_utxo("srs1abc", 5_000_000);
        let utxos = lq.fetch_utxos("srs1abc").await.unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].lovelace(), Some(5_000_000));
    }

    #[tokio::test]
    async fn ledger_fetch_utxos_empty() {
        let lq = MockLedger::new();
        assert!(lq.fetch_utxos("srs1nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ledger_query_failure_propagates() {
        let mut lq = MockLedger::new();
        lq.fail_queries = true;
        assert!(matches!(
            lq.is_address_used("srs1abc").await.unwrap_err(),
            LedgerError::Query(_)
        ));
    }

    #[tokio::test]
    async fn ledger_parameters_loosely_typed() {
        let lq = MockLedger::new();
        let raw = lq.fetch_protocol_parameters().await.unwrap();
        assert_eq!(raw.min_fee_a.as_deref(), Some("44"));
        assert!(raw.coins_per_utxo_word.is_none());
    }

    #[tokio::test]
    async fn ledger_current_slot() {
        let mut lq = MockLedger::new();
        lq.slot = 12_345_678;
        assert_eq!(lq.fetch_current_slot().await.unwrap(), 12_345_678);
    }

    #[tokio::test]
    async fn ledger_as_dyn() {
        let lq = MockLedger::new();
        let dyn_lq: &dyn LedgerQuery = &lq;
        assert_eq!(dyn_lq.fetch_current_slot().await.unwrap(), 0);
    }

    // ------------------------------------------------------------------
    // WalletStore tests
    // ------------------------------------------------------------------

    #[test]
    fn store_put_account() {
        let ws = MockStore::new();
        ws.put_account(&AccountRecord {
            account_index: 0,
            root_key_ref: "vault://acct-0".into(),
        })
        .unwrap();
        assert_eq!(ws.accounts.lock().unwrap().len(), 1);
    }

    #[test]
    fn store_put_addresses_replaces_batch() {
        let ws = MockStore::new();
        let record = AddressRecord {
            address: "srs1abc".into(),
            path: "1852'/1815'/0'/0/0".into(),
            is_used: true,
            observed_at: chrono::Utc::now(),
        };
        ws.put_addresses(0, std::slice::from_ref(&record)).unwrap();
        ws.put_addresses(0, &[record.clone(), record]).unwrap();
        assert_eq!(ws.addresses.lock().unwrap()[&0].len(), 2);
    }

    #[test]
    fn store_put_transaction() {
        let ws = MockStore::new();
        ws.put_transaction(&TransactionRecord {
            tx_hash: "aa".repeat(32),
            serialized_hex: "deadbeef".into(),
            fee: 170_000,
            change: 830_000,
        })
        .unwrap();
        assert_eq!(ws.transactions.lock().unwrap().len(), 1);
    }

    #[test]
    fn store_as_dyn() {
        let ws = MockStore::new();
        let dyn_ws: &dyn WalletStore = &ws;
        assert!(dyn_ws
            .put_account(&AccountRecord {
                account_index: 3,
                root_key_ref: "vault://acct-3".into(),
            })
            .is_ok());
    }
}
