//! Clawrrency - a cooperative digital currency for autonomous agents.
//!
//! The crate is organized leaves-first:
//!
//! 1. `crypto` - Ed25519 keys, signatures, canonical hashing
//! 2. `tx` - the signed transaction record and its builder
//! 3. `economics` - fees, reputation, minting and staking rules
//! 4. `ledger` - account state and the authoritative transition function
//! 5. `registry` - bot identities, stakes, attestations
//! 6. `consensus` - PBFT agreement over transaction digests
//! 7. `market` - content-addressed skill artifacts and trade
//! 8. `sdk` - one facade binding the above for embedding processes

pub mod config;
pub mod consensus;
pub mod crypto;
pub mod economics;
pub mod governance;
pub mod ledger;
pub mod market;
pub mod registry;
pub mod sdk;
pub mod storage;
pub mod tx;

pub use config::Config;
pub use sdk::Sdk;
