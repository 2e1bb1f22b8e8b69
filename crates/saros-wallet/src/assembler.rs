//! Transaction assembly state machine.
//!
//! A draft moves one-directionally through
//! `Empty → InputsAdded → OutputsAdded → FeeSet → Built → Signed → Serialized`.
//! Any out-of-order call is an [`WalletError::InvalidStage`]; a failed stage
//! invalidates the draft and a fresh assembler must be started. No partial
//! artifact ever escapes: the only successful exit is [`TxAssembler::serialize`]
//! returning a complete [`SignedTransaction`].
//!
//! Key material arriving on the inputs is resolved exactly once, at
//! [`TxAssembler::add_inputs`]; after signing, the resolved keys are dropped.

use tracing::{debug, info};

use saros_core::constants::TTL_WINDOW_SLOTS;
use saros_core::crypto::{self, KeyPair};
use saros_core::types::{
    Hash256, ProtocolParameters, SignedTransaction, TransactionBody, TransactionContainer,
    TxInput, TxOutput, Utxo, Witness, WitnessSet,
};

use crate::coin_selection;
use crate::error::WalletError;

/// Fee safety buffers added on top of the library-reported minimum fee.
///
/// These are empirical policy knobs tuned against a particular ledger's fee
/// model, not protocol invariants; callers with a different fee schedule
/// should supply their own values.
#[derive(Clone, Debug)]
pub struct FeePolicy {
    /// Flat buffer per transaction.
    pub base_buffer: u64,
    /// Buffer added per input.
    pub per_input_buffer: u64,
    /// The protocol buffer is `min_fee_const_b / protocol_divisor`, floored.
    pub protocol_divisor: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            base_buffer: 5_000,
            per_input_buffer: 1_000,
            protocol_divisor: 64,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Empty,
    InputsAdded,
    OutputsAdded,
    FeeSet,
    Built,
    Signed,
    Serialized,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Empty => "Empty",
            Stage::InputsAdded => "InputsAdded",
            Stage::OutputsAdded => "OutputsAdded",
            Stage::FeeSet => "FeeSet",
            Stage::Built => "Built",
            Stage::Signed => "Signed",
            Stage::Serialized => "Serialized",
        }
    }
}

/// Builds, fees, signs, and serializes one transaction draft.
#[derive(Debug)]
pub struct TxAssembler {
    stage: Stage,
    params: ProtocolParameters,
    fee_policy: FeePolicy,
    ttl: u64,

    inputs: Vec<TxInput>,
    total_input: u64,
    /// Distinct signing keys in first-seen order.
    signing_keys: Vec<(Hash256, KeyPair)>,

    outputs: Vec<TxOutput>,
    change_address: Option<String>,

    fee: u64,
    change: u64,

    body: Option<TransactionBody>,
    body_bytes: Vec<u8>,
    body_hash: Hash256,
    witnesses: Vec<Witness>,
}

impl TxAssembler {
    /// Start an empty draft. TTL is fixed at creation from the current slot.
    pub fn new(params: ProtocolParameters, fee_policy: FeePolicy, current_slot: u64) -> Self {
        Self {
            stage: Stage::Empty,
            params,
            fee_policy,
            ttl: current_slot.saturating_add(TTL_WINDOW_SLOTS),
            inputs: Vec::new(),
            total_input: 0,
            signing_keys: Vec::new(),
            outputs: Vec::new(),
            change_address: None,
            fee: 0,
            change: 0,
            body: None,
            body_bytes: Vec::new(),
            body_hash: Hash256::ZERO,
            witnesses: Vec::new(),
        }
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), WalletError> {
        if self.stage != expected {
            return Err(WalletError::InvalidStage {
                expected: expected.name(),
                actual: self.stage.name(),
            });
        }
        Ok(())
    }

    /// The draft's time-to-live slot.
    pub fn ttl(&self) -> u64 {
        self.ttl
    }

    /// Ingest the selected inputs, resolving each UTXO's key material once.
    ///
    /// Fails with [`WalletError::InputResolution`] when a bundle is empty,
    /// lacks a base-currency entry, or its key material does not decode.
    pub fn add_inputs(&mut self, utxos: &[Utxo]) -> Result<&mut Self, WalletError> {
        self.expect_stage(Stage::Empty)?;
        if utxos.is_empty() {
            return Err(WalletError::InputResolution("no inputs supplied".into()));
        }

        for utxo in utxos {
            let value = utxo.lovelace().ok_or_else(|| {
                WalletError::InputResolution(format!("{utxo}: bundle has no lovelace entry"))
            })?;
            let keypair = utxo
                .key_ref
                .resolve()
                .map_err(|e| WalletError::InputResolution(format!("{utxo}: {e}")))?;
            let key_hash = keypair.public_key().key_hash();

            self.inputs.push(TxInput {
                tx_hash: utxo.tx_hash,
                index: utxo.output_index,
            });
            self.total_input = self.total_input.checked_add(value).ok_or_else(|| {
                WalletError::InputResolution("input value overflow".into())
            })?;

            if !self.signing_keys.iter().any(|(h, _)| *h == key_hash) {
                self.signing_keys.push((key_hash, keypair));
            }
        }

        debug!(
            inputs = self.inputs.len(),
            distinct_keys = self.signing_keys.len(),
            total_input = self.total_input,
            "inputs added"
        );
        self.stage = Stage::InputsAdded;
        Ok(self)
    }

    /// Add the payment output (bumped to the minimum coin value when below
    /// it) and reserve the change address.
    pub fn add_outputs(
        &mut self,
        to_address: &str,
        amount: u64,
        change_address: Option<&str>,
    ) -> Result<&mut Self, WalletError> {
        self.expect_stage(Stage::InputsAdded)?;
        if amount == 0 {
            return Err(WalletError::InvalidAmount("payment amount is zero".into()));
        }
        let change_address = change_address.ok_or(WalletError::NoChangeAddress)?;

        let min_value = coin_selection::min_output_value(&self.params, false);
        let payment = if amount < min_value {
            debug!(amount, min_value, "payment bumped to minimum output value");
            min_value
        } else {
            amount
        };

        self.outputs.push(TxOutput {
            address: to_address.to_string(),
            lovelace: payment,
        });
        self.change_address = Some(change_address.to_string());
        self.stage = Stage::OutputsAdded;
        Ok(self)
    }

    /// Compute the final fee (library minimum plus the deterministic safety
    /// buffer) and balance the draft with a change output. Change below
    /// the minimum output value is absorbed into the fee.
    pub fn set_fee(&mut self) -> Result<&mut Self, WalletError> {
        self.expect_stage(Stage::OutputsAdded)?;

        let n_inputs = self.inputs.len() as u64;
        let n_witnesses = self.signing_keys.len() as u64;
        let min_fee = coin_selection::estimate_fee(
            &self.params,
            n_inputs,
            self.outputs.len() as u64 + 1,
            n_witnesses,
        );

        if self.fee_policy.protocol_divisor == 0 {
            return Err(WalletError::FeeComputation("protocol divisor is zero".into()));
        }
        let protocol_buffer = self.params.min_fee_const_b / self.fee_policy.protocol_divisor;
        let buffer = self
            .fee_policy
            .base_buffer
            .checked_add(
                self.fee_policy
                    .per_input_buffer
                    .checked_mul(n_inputs)
                    .ok_or_else(|| WalletError::FeeComputation("buffer overflow".into()))?,
            )
            .and_then(|b| b.checked_add(protocol_buffer))
            .ok_or_else(|| WalletError::FeeComputation("buffer overflow".into()))?;
        let mut fee = min_fee
            .checked_add(buffer)
            .ok_or_else(|| WalletError::FeeComputation("fee overflow".into()))?;

        let outputs_sum: u64 = self
            .outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.lovelace))
            .ok_or_else(|| WalletError::FeeComputation("output sum overflow".into()))?;
        let mut change = self
            .total_input
            .checked_sub(outputs_sum)
            .and_then(|rest| rest.checked_sub(fee))
            .ok_or_else(|| {
                WalletError::FeeComputation(format!(
                    "inputs {} do not cover outputs {} plus fee {}",
                    self.total_input, outputs_sum, fee
                ))
            })?;

        // a change output below the minimum coin value would be rejected
        // by the ledger; absorb it into the fee instead
        let min_change = coin_selection::min_output_value(&self.params, false);
        if change > 0 && change < min_change {
            debug!(change, min_change, "sub-minimum change absorbed into fee");
            fee = fee
                .checked_add(change)
                .ok_or_else(|| WalletError::FeeComputation("fee overflow".into()))?;
            change = 0;
        }

        if change > 0 {
            // change_address is guaranteed set by the OutputsAdded stage
            let addr = self
                .change_address
                .clone()
                .ok_or(WalletError::NoChangeAddress)?;
            self.outputs.push(TxOutput {
                address: addr,
                lovelace: change,
            });
        }

        debug!(fee, change, min_fee, buffer, "fee set");
        self.fee = fee;
        self.change = change;
        self.stage = Stage::FeeSet;
        Ok(self)
    }

    /// Freeze the body into canonical bytes and its hash.
    pub fn build(&mut self) -> Result<&mut Self, WalletError> {
        self.expect_stage(Stage::FeeSet)?;

        let body = TransactionBody {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            fee: self.fee,
            ttl: self.ttl,
        };
        self.body_bytes = body.to_bytes()?;
        self.body_hash = body.body_hash()?;
        self.body = Some(body);

        debug!(body_hash = %self.body_hash, bytes = self.body_bytes.len(), "body built");
        self.stage = Stage::Built;
        Ok(self)
    }

    /// Witness the body hash, one signature per distinct signing key, then
    /// release the key material.
    pub fn sign(&mut self) -> Result<&mut Self, WalletError> {
        self.expect_stage(Stage::Built)?;
        if self.signing_keys.is_empty() {
            return Err(WalletError::MissingSigningKey(
                "no signing keys held for the draft's inputs".into(),
            ));
        }

        for (_, keypair) in &self.signing_keys {
            self.witnesses.push(crypto::make_witness(&self.body_hash, keypair));
        }
        self.signing_keys.clear();

        debug!(witnesses = self.witnesses.len(), "draft signed");
        self.stage = Stage::Signed;
        Ok(self)
    }

    /// Produce the terminal artifact, enforcing the final consistency
    /// checks: non-empty encoding and exact input/output/fee balance.
    pub fn serialize(&mut self) -> Result<SignedTransaction, WalletError> {
        self.expect_stage(Stage::Signed)?;

        let body = self
            .body
            .take()
            .ok_or_else(|| WalletError::SerializationInvariant("missing body".into()))?;
        let witness_set = WitnessSet {
            vkey_witnesses: std::mem::take(&mut self.witnesses),
        };
        let container = TransactionContainer {
            body: body.clone(),
            witnesses: witness_set.clone(),
        };
        let serialized_hex = hex::encode(container.to_bytes()?);

        if serialized_hex.is_empty() {
            return Err(WalletError::SerializationInvariant("empty encoding".into()));
        }
        let outputs_sum = body
            .total_output_value()
            .ok_or_else(|| WalletError::SerializationInvariant("output sum overflow".into()))?;
        let balanced = outputs_sum
            .checked_add(self.fee)
            .is_some_and(|total| total == self.total_input);
        if !balanced {
            return Err(WalletError::SerializationInvariant(format!(
                "inputs {} != outputs {} + fee {}",
                self.total_input, outputs_sum, self.fee
            )));
        }

        info!(
            body_hash = %self.body_hash,
            fee = self.fee,
            change = self.change,
            "transaction serialized"
        );
        self.stage = Stage::Serialized;
        Ok(SignedTransaction {
            body_bytes: std::mem::take(&mut self.body_bytes),
            witness_set,
            serialized_hex,
            fee: self.fee,
            change: self.change,
        })
    }
}

/// Run the whole pipeline over an already-selected input set.
pub fn assemble_payment(
    params: ProtocolParameters,
    fee_policy: FeePolicy,
    current_slot: u64,
    inputs: &[Utxo],
    to_address: &str,
    amount: u64,
    change_address: Option<&str>,
) -> Result<SignedTransaction, WalletError> {
    let mut assembler = TxAssembler::new(params, fee_policy, current_slot);
    assembler
        .add_inputs(inputs)?
        .add_outputs(to_address, amount, change_address)?
        .set_fee()?
        .build()?
        .sign()?;
    assembler.serialize()
}
