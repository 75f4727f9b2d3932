use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;

use mongosnap::retention::{allowed_timestamps, classify};
use mongosnap::BackupRecord;

use crate::cmd_plan::parse_now;

/// Dry classification: prints what a run at `now` would delete, without
/// deleting anything.
pub fn exec(backups: PathBuf, now: Option<String>, keep: Option<String>, json: bool) -> Result<()> {
    let now = parse_now(now)?;
    let raw = fs::read_to_string(&backups)
        .with_context(|| format!("read backup list {}", backups.display()))?;
    let records: Vec<BackupRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parse backup list {}", backups.display()))?;

    let allowed = allowed_timestamps(now);
    let keep = keep.unwrap_or_default();
    let doomed = classify(&records, &allowed, &keep);

    if json {
        let out = json!({
            "now": now.to_rfc3339(),
            "examined": records.len(),
            "delete": doomed.iter().map(|b| json!({
                "id": b.id,
                "created_at": b.created_at.to_rfc3339(),
            })).collect::<Vec<_>>(),
            "kept": records.len() - doomed.len(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "classify at {}: {} examined, {} to delete, {} kept",
        now.to_rfc3339(),
        records.len(),
        doomed.len(),
        records.len() - doomed.len()
    );
    for b in doomed {
        println!("  delete {} ({})", b.id, b.created_at.to_rfc3339());
    }
    Ok(())
}
