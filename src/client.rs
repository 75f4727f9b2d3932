//! External collaborator interfaces.
//!
//! The actual network wrappers (MongoDB driver, EC2/EBS API, instance
//! metadata endpoint) live outside this crate and are injected through the
//! traits below. The core never talks to the network directly, which also
//! keeps the whole flow testable with scripted in-memory clients.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Original connection parameters of the target database.
///
/// Kept separately from any live session so the emergency unlock path can
/// re-derive a fresh connection without trusting objects from an
/// interrupted call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for DbTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One live session against the replicated document database.
pub trait DbClient: Send {
    /// Does this node currently hold the primary (writable) role?
    fn is_primary(&self) -> Result<bool>;
    /// Flush to durable storage and block writes until `unlock`.
    fn fsync_and_lock(&self) -> Result<()>;
    /// Request one unlock step (servers count nested locks down by one).
    fn unlock(&self) -> Result<()>;
    /// Does the server still report a locked state?
    fn is_locked(&self) -> Result<bool>;
}

/// Session factory bound to one target. `connect` may be called more than
/// once per process: the normal flow uses one session, the signal path
/// derives its own.
pub trait DbConnector: Send + Sync {
    fn target(&self) -> &DbTarget;
    fn connect(&self) -> Result<Box<dyn DbClient>>;
}

/// One block-storage volume attached to this instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: String,
    /// Device path as reported by the attachment, e.g. "/dev/sdf".
    pub device: String,
}

/// One previously created storage snapshot relevant to an environment.
/// Immutable once created; destroyed only by explicit deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub env: String,
    pub label: String,
}

/// Block-storage service surface used by the run.
pub trait SnapshotStore {
    /// Volumes attached to the given instance.
    fn list_volumes(&self, instance_id: &str) -> Result<Vec<Volume>>;
    /// Request a snapshot of a volume; returns the new snapshot id.
    fn create_snapshot(&self, volume_id: &str, description: &str) -> Result<String>;
    /// Attach a key/value tag to a snapshot.
    fn tag(&self, snapshot_id: &str, key: &str, value: &str) -> Result<()>;
    /// All snapshots tagged for the given environment, scope-limited to the
    /// owning account by the implementation.
    fn list_snapshots(&self, env: &str) -> Result<Vec<BackupRecord>>;
    /// Delete one snapshot.
    fn delete_snapshot(&self, snapshot_id: &str) -> Result<()>;
}

/// Source of the current instance identity.
pub trait InstanceMetadata {
    fn current_instance_id(&self) -> Result<String>;
}
