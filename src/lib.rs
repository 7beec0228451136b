//! gravimon - local monitor for Antigravity model quotas.
//!
//! Discovers the Antigravity language server running on this machine, finds
//! the local HTTP port serving its quota API, and maintains a periodically
//! refreshed snapshot of per-model usage data. Consumers read the snapshot
//! through [`state::QuotaStore::view`]; they never talk to the network
//! themselves.

pub mod config;
pub mod inspect;
pub mod monitor;
pub mod quota;
pub mod state;
