//! Shared test doubles and fixtures for the integration suite.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use saros_core::crypto::KeyMaterial;
use saros_core::error::{LedgerError, StoreError};
use saros_core::traits::{LedgerQuery, WalletStore};
use saros_core::types::{
    AccountRecord, AddressRecord, AssetAmount, Hash256, RawProtocolParameters, TransactionRecord,
    Utxo,
};
use saros_wallet::Seed;

/// Deterministic seed for fixtures.
pub fn test_seed() -> Seed {
    Seed::from_bytes(&[7u8; 32]).unwrap()
}

/// Single-asset UTXO owned by a fresh in-memory key.
pub fn utxo(tag: u8, lovelace: u64) -> Utxo {
    Utxo {
        tx_hash: Hash256([tag; 32]),
        output_index: 0,
        amounts: vec![AssetAmount::lovelace(lovelace)],
        owner_address: "tsrs1owner".into(),
        key_ref: KeyMaterial::Normal([tag.wrapping_add(1); 32]),
    }
}

/// Multi-asset UTXO, excluded by the spendable filter.
pub fn multi_asset_utxo(tag: u8, lovelace: u64) -> Utxo {
    Utxo {
        tx_hash: Hash256([tag; 32]),
        output_index: 1,
        amounts: vec![
            AssetAmount::lovelace(lovelace),
            AssetAmount {
                unit: "deadbeef.token".into(),
                quantity: 1,
            },
        ],
        owner_address: "tsrs1owner".into(),
        key_ref: KeyMaterial::Normal([tag.wrapping_add(1); 32]),
    }
}

/// Protocol parameters as the ledger would report them, all well-formed.
pub fn raw_params() -> RawProtocolParameters {
    RawProtocolParameters {
        min_fee_a: Some("44".into()),
        min_fee_b: Some("155381".into()),
        coins_per_utxo_word: Some("34482".into()),
        pool_deposit: Some("500000000".into()),
        key_deposit: Some("2000000".into()),
        max_tx_size: Some("16384".into()),
        max_val_size: Some("5000".into()),
    }
}

/// Ledger double scripted through its public fields.
pub struct ScriptedLedger {
    pub used: HashSet<String>,
    pub utxos: HashMap<String, Vec<Utxo>>,
    pub raw_params: RawProtocolParameters,
    pub slot: u64,
    /// Addresses whose usage query errors instead of answering.
    pub fail_usage_for: HashSet<String>,
    pub usage_calls: Mutex<Vec<String>>,
}

impl ScriptedLedger {
    pub fn new() -> Self {
        Self {
            used: HashSet::new(),
            utxos: HashMap::new(),
            raw_params: raw_params(),
            slot: 41_000_000,
            fail_usage_for: HashSet::new(),
            usage_calls: Mutex::new(Vec::new()),
        }
    }
}

impl Default for ScriptedLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerQuery for ScriptedLedger {
    async fn is_address_used(&self, address: &str) -> Result<bool, LedgerError> {
        self.usage_calls.lock().unwrap().push(address.to_string());
        if self.fail_usage_for.contains(address) {
            return Err(LedgerError::Unavailable("scripted failure".into()));
        }
        Ok(self.used.contains(address))
    }

    async fn fetch_utxos(&self, address: &str) -> Result<Vec<Utxo>, LedgerError> {
        Ok(self.utxos.get(address).cloned().unwrap_or_default())
    }

    async fn fetch_protocol_parameters(&self) -> Result<RawProtocolParameters, LedgerError> {
        Ok(self.raw_params.clone())
    }

    async fn fetch_current_slot(&self) -> Result<u64, LedgerError> {
        Ok(self.slot)
    }
}

/// Store double that records every write.
#[derive(Default)]
pub struct InMemoryStore {
    pub accounts: Mutex<Vec<AccountRecord>>,
    pub addresses: Mutex<HashMap<u32, Vec<AddressRecord>>>,
    pub transactions: Mutex<Vec<TransactionRecord>>,
}

impl WalletStore for InMemoryStore {
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
