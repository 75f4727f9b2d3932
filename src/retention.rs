//! Tiered retention: classify an unbounded set of timestamped backups into
//! a small allowed set and delete everything else.
//!
//! Three contiguous tiers relative to the run's "now", most recent last:
//! - monthly: first-of-month midnights over (now-1y .. now-2w]
//! - daily:   midnights over (now-2w .. now-2d]
//! - recent:  hour boundaries over (now-2d .. now]
//!
//! Each tier is a descriptor (interval + step + anchor) processed by one
//! sampling loop, so the boundary arithmetic lives in a single place. A
//! backup survives iff its creation timestamp, rounded to the nearest
//! minute, lands exactly on a sampled boundary. Rounding is minute-grained
//! on purpose: it absorbs snapshot-service latency of a few seconds, while
//! a backup created a full minute late does not survive.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Months, Utc};
use log::{debug, info, warn};

use crate::client::{BackupRecord, SnapshotStore};
use crate::timeutil::{floor_day, floor_hour, floor_month, months_back, round_minute};

/// Sampling period of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierStep {
    Hours(i64),
    Days(i64),
    /// Calendar-aware: the 1st of each month, whatever its length.
    Months(u32),
}

/// One retention tier: a half-open interval [start, end) sampled at `step`,
/// with `start` already rounded to the tier's anchor boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierSpec {
    pub name: &'static str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step: TierStep,
}

impl TierSpec {
    /// Sampled boundaries: start, start+step, ... while strictly before end.
    /// Strictly increasing by construction.
    pub fn boundaries(&self) -> Vec<DateTime<Utc>> {
        let mut out = Vec::new();
        let mut cur = self.start;
        while cur < self.end {
            out.push(cur);
            cur = match self.step {
                TierStep::Hours(h) => cur + Duration::hours(h),
                TierStep::Days(d) => cur + Duration::days(d),
                TierStep::Months(m) => match cur.checked_add_months(Months::new(m)) {
                    Some(next) => next,
                    None => break,
                },
            };
        }
        out
    }
}

/// The three tiers for a given "now". Boundaries between tiers are shared
/// exactly (each tier's end is the next tier's start), so the sampled
/// sequences are pairwise disjoint.
pub fn tiers(now: DateTime<Utc>) -> [TierSpec; 3] {
    let recent_start = floor_hour(now) - Duration::days(2);
    let daily_end = floor_day(now) - Duration::days(2);
    let daily_start = floor_day(now) - Duration::weeks(2);
    let monthly_start = months_back(floor_month(now), 12);

    [
        TierSpec {
            name: "monthly",
            start: monthly_start,
            end: daily_start,
            step: TierStep::Months(1),
        },
        TierSpec {
            name: "daily",
            start: daily_start,
            end: daily_end,
            step: TierStep::Days(1),
        },
        TierSpec {
            name: "recent",
            start: recent_start,
            end: now,
            step: TierStep::Hours(1),
        },
    ]
}

/// Materialized union of all tier boundaries for this "now". Pure and
/// deterministic; recomputed every run.
pub fn allowed_timestamps(now: DateTime<Utc>) -> HashSet<DateTime<Utc>> {
    let mut allowed = HashSet::new();
    for tier in tiers(now) {
        let bounds = tier.boundaries();
        debug!(
            "retention: tier {} [{} .. {}) -> {} boundary(ies)",
            tier.name,
            tier.start,
            tier.end,
            bounds.len()
        );
        allowed.extend(bounds);
    }
    allowed
}

/// Backups to delete: everything whose minute-rounded creation timestamp is
/// not an allowed boundary. The just-created snapshot is always preserved,
/// whatever its timestamp: it may not round onto a boundary yet and must
/// never be deleted by the run that created it.
pub fn classify<'a>(
    backups: &'a [BackupRecord],
    allowed: &HashSet<DateTime<Utc>>,
    just_created_id: &str,
) -> Vec<&'a BackupRecord> {
    backups
        .iter()
        .filter(|b| b.id != just_created_id)
        .filter(|b| !allowed.contains(&round_minute(b.created_at)))
        .collect()
}

/// Delete the marked backups. Each deletion is independent: per-item
/// failures are logged and do not stop the batch. Returns the count of
/// records successfully removed.
pub fn apply(store: &dyn SnapshotStore, to_delete: &[&BackupRecord]) -> usize {
    let mut deleted = 0;
    for rec in to_delete {
        match store.delete_snapshot(&rec.id) {
            Ok(()) => {
                info!("retention: deleted snapshot {} ({})", rec.id, rec.created_at);
                deleted += 1;
            }
            Err(e) => warn!("retention: failed to delete snapshot {}: {e:#}", rec.id),
        }
    }
    deleted
}
