//! Termination-signal listener for the freeze window.
//!
//! Installed once at process start, before any lock is taken. On the first
//! termination-class signal the listener thread derives a fresh database
//! session from the original target parameters, runs the same bounded
//! unlock loop as the normal path, and exits the process with a non-zero
//! status regardless of outcome. It fires at most once and never re-raises.
//!
//! The fresh session matters: the interrupted call stack's objects are not
//! trusted from here. Synchronous fault signals (SIGSEGV, SIGILL) cannot be
//! serviced by a listener thread; in-process unwinding is covered by the
//! FreezeGuard drop path instead.

use std::process;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use log::{info, warn};
use signal_hook::consts::signal::{SIGABRT, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::client::DbConnector;
use crate::freeze::unlock_with_retries;

/// Exit status after a signal-triggered shutdown, whatever the unlock outcome.
pub const SIGNAL_EXIT_CODE: i32 = 2;

/// Register the listener thread. Call once, before acquiring the lock.
pub fn install(connector: Arc<dyn DbConnector>) -> Result<()> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGABRT, SIGQUIT]).context("register signal handlers")?;

    thread::Builder::new()
        .name("msnap-signals".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                warn!(
                    "signal {sig} received; attempting emergency unlock of {}",
                    connector.target()
                );
                emergency_unlock(connector.as_ref());
                process::exit(SIGNAL_EXIT_CODE);
            }
        })
        .context("spawn signal listener thread")?;

    Ok(())
}

/// Bounded unlock over a freshly derived session. Harmless when no lock is
/// held: the first lock-state probe reports unlocked and the loop stops.
fn emergency_unlock(connector: &dyn DbConnector) {
    match connector.connect() {
        Ok(conn) => match unlock_with_retries(conn.as_ref()) {
            Ok(attempts) => info!("signal: write lock released after {attempts} attempt(s)"),
            Err(e) => warn!("signal: {e}"),
        },
        Err(e) => warn!(
            "signal: cannot reconnect to {} for unlock: {e:#}",
            connector.target()
        ),
    }
}
