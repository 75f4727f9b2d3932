//! Freeze coordinator: fsync-and-lock the database around a snapshot
//! request, with release guaranteed on every exit path.
//!
//! State machine:
//!   Unlocked -> Locked (acquire) -> Unlocked (release, <=5 attempts)
//!                                -> StillLocked (retries exhausted; terminal
//!                                   but non-fatal, operator clears the lock)
//! RoleConflict / Connection are entered only from Unlocked; no lock is ever
//! held on those paths.
//!
//! The guard is the single owner of the lock state. Dropping it without an
//! explicit release (panic, early `?`) runs the same bounded unlock loop
//! best-effort. The signal path (see signals.rs) shares unlock_with_retries
//! over a freshly derived session.

use log::{debug, info, warn};

use crate::client::{DbClient, DbConnector};
use crate::error::Error;

/// Bounded unlock loop: the emergency paths reuse it, so it must not be
/// able to hang indefinitely.
pub const UNLOCK_ATTEMPTS: u32 = 5;

/// Owner of one held consistency lock.
pub struct FreezeGuard {
    conn: Box<dyn DbClient>,
    released: bool,
}

/// Connect and take the consistency lock.
///
/// If the node is primary and `allow_role_override` is false, fails with
/// `RoleConflict` without ever calling fsync-and-lock: the write path of a
/// live primary is not frozen by accident.
pub fn acquire(connector: &dyn DbConnector, allow_role_override: bool) -> Result<FreezeGuard, Error> {
    let target = connector.target().clone();
    let conn = connector.connect().map_err(|cause| Error::Connection {
        target: target.to_string(),
        cause,
    })?;

    if conn.is_primary()? && !allow_role_override {
        return Err(Error::RoleConflict {
            target: target.to_string(),
        });
    }

    conn.fsync_and_lock()?;
    info!("freeze: database at {target} fsynced and write-locked");
    Ok(FreezeGuard {
        conn,
        released: false,
    })
}

impl FreezeGuard {
    /// Release the lock. Up to UNLOCK_ATTEMPTS unlock calls, polling the
    /// server's lock state after each and stopping as soon as it reports
    /// unlocked. Exhaustion returns `StillLocked`, which callers treat as
    /// non-fatal: the snapshot is already taken, only the write-freeze is
    /// left for an operator to clear.
    pub fn release(mut self) -> Result<(), Error> {
        self.released = true;
        let attempts = unlock_with_retries(self.conn.as_ref())?;
        info!("freeze: write lock released after {attempts} attempt(s)");
        Ok(())
    }
}

impl Drop for FreezeGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Unwind or early return while the lock is held.
        warn!("freeze: guard dropped while locked, running emergency release");
        if let Err(e) = unlock_with_retries(self.conn.as_ref()) {
            warn!("freeze: emergency release failed: {e}");
        }
    }
}

/// Shared bounded release routine. Per-attempt unlock errors are logged and
/// do not consume the loop early; the server's reported lock state is the
/// only stop condition. Returns the number of attempts used.
pub fn unlock_with_retries(conn: &dyn DbClient) -> Result<u32, Error> {
    for attempt in 1..=UNLOCK_ATTEMPTS {
        if let Err(e) = conn.unlock() {
            warn!("unlock attempt {attempt}/{UNLOCK_ATTEMPTS} failed: {e:#}");
        }
        match conn.is_locked() {
            Ok(false) => {
                debug!("unlock: server reports unlocked after attempt {attempt}");
                return Ok(attempt);
            }
            Ok(true) => {}
            Err(e) => warn!("lock state probe failed after attempt {attempt}: {e:#}"),
        }
    }
    Err(Error::StillLocked {
        attempts: UNLOCK_ATTEMPTS,
    })
}
