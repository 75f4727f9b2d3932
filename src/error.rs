//! Error taxonomy for one backup run.
//!
//! Fatal before any lock is taken: Connection, RoleConflict, VolumeNotFound.
//! Non-fatal by policy: StillLocked (the snapshot already exists; only the
//! write-freeze is left behind and an operator must clear it).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be reached. Raised before any lock attempt.
    #[error("cannot connect to database at {target}: {cause}")]
    Connection { target: String, cause: anyhow::Error },

    /// The node is primary and the role override was not requested.
    /// Freezing the write path of a live primary is refused by default.
    #[error("node at {target} is primary; pass the force flag to freeze it anyway")]
    RoleConflict { target: String },

    /// No attached volume matches the configured device path.
    #[error("no attached volume matches device {device}")]
    VolumeNotFound { device: String },

    /// Unlock retries exhausted. The server still reports a locked state.
    #[error("database still locked after {attempts} unlock attempt(s); manual unlock required")]
    StillLocked { attempts: u32 },

    /// Any other failure reported by an injected client.
    #[error(transparent)]
    Client(#[from] anyhow::Error),
}
