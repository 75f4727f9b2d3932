use anyhow::Result;
use clap::Parser;

mod cli;
mod cmd_classify;
mod cmd_plan;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Plan { now, json } => cmd_plan::exec(now, json),

        cli::Cmd::Classify {
            backups,
            now,
            keep,
            json,
        } => cmd_classify::exec(backups, now, keep, json),
    }
}
