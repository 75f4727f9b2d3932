//! One backup run: resolve the target volume, freeze the database around a
//! snapshot request, then prune old snapshots for this environment.
//!
//! Failures before the lock is held abort immediately with nothing to clean
//! up. Once the lock is held, release is always attempted before a snapshot
//! failure is surfaced. Retention never rolls back anything: by then the
//! snapshot is created and the lock released.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::client::{DbConnector, InstanceMetadata, SnapshotStore};
use crate::config::BackupConfig;
use crate::error::Error;
use crate::{freeze, retention};

/// Aggregate outcome of one run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub snapshot_id: String,
    /// Snapshots examined by the retention phase (including the new one).
    pub examined: usize,
    pub deleted: usize,
    pub failed: usize,
    pub kept: usize,
    /// Unlock retries were exhausted; an operator must clear the lock.
    pub still_locked: bool,
}

pub fn execute(
    cfg: &BackupConfig,
    connector: &dyn DbConnector,
    store: &dyn SnapshotStore,
    metadata: &dyn InstanceMetadata,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    // 1) Resolve the target volume before touching the database.
    let instance = metadata
        .current_instance_id()
        .context("resolve instance id")?;
    let volume = store
        .list_volumes(&instance)
        .context("list attached volumes")?
        .into_iter()
        .find(|v| v.device == cfg.device)
        .ok_or_else(|| Error::VolumeNotFound {
            device: cfg.device.clone(),
        })?;
    info!("run: device {} resolved to volume {}", cfg.device, volume.id);

    // 2) Freeze, request the snapshot, tag it for this environment.
    let guard = freeze::acquire(connector, cfg.allow_role_override)?;
    let snap_result = store
        .create_snapshot(&volume.id, &cfg.snapshot_description(now))
        .and_then(|id| {
            store.tag(&id, "env", &cfg.env)?;
            Ok(id)
        });

    // 3) Release before surfacing any snapshot failure. StillLocked is
    //    non-fatal by policy: the data is safe, only the freeze lingers.
    let still_locked = match guard.release() {
        Ok(()) => false,
        Err(e) => {
            warn!("run: {e}");
            true
        }
    };
    let snapshot_id = snap_result.context("create snapshot")?;
    info!("run: snapshot {snapshot_id} created for volume {}", volume.id);

    // 4) Retention over everything tagged for this environment.
    let backups = store.list_snapshots(&cfg.env).context("list snapshots")?;
    let examined = backups.len();
    let allowed = retention::allowed_timestamps(now);
    let doomed = retention::classify(&backups, &allowed, &snapshot_id);
    let marked = doomed.len();
    let deleted = retention::apply(store, &doomed);
    let failed = marked - deleted;
    if failed > 0 {
        warn!("run: {deleted} of {marked} deletion(s) succeeded");
    } else {
        info!("run: {deleted} of {marked} deletion(s) succeeded");
    }

    Ok(RunReport {
        snapshot_id,
        examined,
        deleted,
        failed,
        kept: examined - marked,
        still_locked,
    })
}
