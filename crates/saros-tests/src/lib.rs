//! End-to-end integration test suite for the Saros wallet engine.
//!
//! This crate contains integration tests that drive the full pipeline:
//! derivation, discovery against a scripted ledger, coin selection,
//! assembly, signing, and persistence, verifying the wallet invariants
//! hold across module boundaries.

pub mod helpers;
