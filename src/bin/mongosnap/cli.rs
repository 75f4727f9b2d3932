use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Offline planning CLI for mongosnap. The network-facing run is driven by
/// downstream integrations that inject the database/storage clients; these
/// subcommands exercise the retention engine without touching anything.
#[derive(Parser, Debug)]
#[command(name = "mongosnap", version, about = "mongosnap retention planner")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Print the allowed-timestamp grid (three tiers) for a given "now"
    Plan {
        /// RFC 3339 instant to plan for (default: current time)
        #[arg(long)]
        now: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Read backup records from a JSON file and print the deletion plan
    ///
    /// Input format (array of records):
    /// [
    ///   {"id":"snap-01","created_at":"2024-03-15T09:00:00Z","env":"prod","label":"mongosnap"}
    /// ]
    Classify {
        /// JSON file with the full backup list for one environment
        #[arg(long)]
        backups: PathBuf,
        /// RFC 3339 instant to classify against (default: current time)
        #[arg(long)]
        now: Option<String>,
        /// Snapshot id to preserve unconditionally (the just-created one)
        #[arg(long)]
        keep: Option<String>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}
