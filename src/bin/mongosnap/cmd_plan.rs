use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;

use mongosnap::retention::{tiers, TierStep};

pub fn parse_now(arg: Option<String>) -> Result<DateTime<Utc>> {
    match arg {
        Some(s) => {
            let t = DateTime::parse_from_rfc3339(s.trim())
                .with_context(|| format!("parse --now {:?} as RFC 3339", s))?;
            Ok(t.with_timezone(&Utc))
        }
        None => Ok(Utc::now()),
    }
}

fn step_label(step: TierStep) -> String {
    match step {
        TierStep::Hours(h) => format!("{h}h"),
        TierStep::Days(d) => format!("{d}d"),
        TierStep::Months(m) => format!("{m}mo"),
    }
}

pub fn exec(now: Option<String>, json: bool) -> Result<()> {
    let now = parse_now(now)?;
    let specs = tiers(now);

    if json {
        let out: Vec<_> = specs
            .iter()
            .map(|t| {
                json!({
                    "tier": t.name,
                    "start": t.start.to_rfc3339(),
                    "end": t.end.to_rfc3339(),
                    "step": step_label(t.step),
                    "boundaries": t.boundaries().iter().map(|b| b.to_rfc3339()).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "now": now.to_rfc3339(), "tiers": out }))?
        );
        return Ok(());
    }

    println!("plan for now = {}", now.to_rfc3339());
    for t in &specs {
        let bounds = t.boundaries();
        println!(
            "tier {:8} [{} .. {}) step {}: {} boundary(ies)",
            t.name,
            t.start.to_rfc3339(),
            t.end.to_rfc3339(),
            step_label(t.step),
            bounds.len()
        );
        for b in bounds {
            println!("  {}", b.to_rfc3339());
        }
    }
    Ok(())
}
