// Core modules
pub mod client;
pub mod config;
pub mod error;
pub mod timeutil;

// Freeze/snapshot/release protocol
pub mod freeze;
pub mod signals;

// Tiered retention
pub mod retention;

// One-run orchestration
pub mod run;

// Convenience re-exports
pub use client::{
    BackupRecord, DbClient, DbConnector, DbTarget, InstanceMetadata, SnapshotStore, Volume,
};
pub use config::BackupConfig;
pub use error::Error;
pub use freeze::{acquire, unlock_with_retries, FreezeGuard, UNLOCK_ATTEMPTS};
pub use retention::{allowed_timestamps, apply, classify, tiers, TierSpec, TierStep};
pub use run::{execute, RunReport};
