//! # saros-core
//! Foundation types and collaborator traits for the Saros wallet engine.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod traits;
pub mod types;
