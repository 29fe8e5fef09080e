//! Tally daemon: entry point for replaying command logs against an economy.

use anyhow::Context;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

use tally_runtime::{Applied, Command, Economy, EconomyConfig, EconomySnapshot, Outcome, Sequencer};
use tally_types::{SystemClock, Timestamp};

#[derive(Parser)]
#[command(name = "tally-daemon", about = "Tally token economy daemon")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Overrides the log level from the configuration file.
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(clap::Subcommand)]
enum Cmd {
    /// Apply a JSON array of timestamped commands and print one result per line.
    Replay {
        /// File holding `[{"at": <secs>, "command": {...}}, ...]`.
        #[arg(long)]
        commands: PathBuf,

        /// Restore this snapshot before replaying.
        #[arg(long)]
        snapshot_in: Option<PathBuf>,

        /// Write a snapshot of the final state here.
        #[arg(long)]
        snapshot_out: Option<PathBuf>,

        /// Genesis time for a fresh economy.
        #[arg(long, default_value_t = 0)]
        genesis: u64,
    },
    /// Print the default configuration as TOML.
    DefaultConfig,
}

#[derive(Deserialize)]
struct LogEntry {
    at: u64,
    command: Command,
}

#[derive(Serialize)]
struct ResultLine<'a> {
    sequence: u64,
    at: u64,
    op: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ok: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorLine>,
}

#[derive(Serialize)]
struct ErrorLine {
    kind: &'static str,
    message: String,
}

impl<'a> ResultLine<'a> {
    fn new(op: &'a str, applied: Applied) -> Self {
        let (ok, error) = match applied.result {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (
                None,
                Some(ErrorLine {
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            ),
        };
        Self {
            sequence: applied.sequence,
            at: applied.at.as_secs(),
            op,
            ok,
            error,
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<EconomyConfig> {
    match path {
        Some(path) => EconomyConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(EconomyConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Cmd::DefaultConfig => {
            print!("{}", EconomyConfig::default().to_toml_string()?);
            Ok(())
        }
        Cmd::Replay {
            commands,
            snapshot_in,
            snapshot_out,
            genesis,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
            tally_utils::init_logging(config.logging.format, level)?;

            let mut economy = Economy::new(&config, Timestamp::new(genesis))?;
            if let Some(path) = &snapshot_in {
                let snapshot = EconomySnapshot::read_from_file(path)
                    .with_context(|| format!("reading snapshot {}", path.display()))?;
                economy.restore(snapshot)?;
                tracing::info!("restored snapshot from {}", path.display());
            }

            let raw = std::fs::read_to_string(&commands)
                .with_context(|| format!("reading command log {}", commands.display()))?;
            let entries: Vec<LogEntry> =
                serde_json::from_str(&raw).context("parsing command log")?;
            tracing::info!(count = entries.len(), "replaying command log");

            let sequencer = Sequencer::new(economy, SystemClock);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut rejected = 0usize;
            for entry in entries {
                let op = entry.command.name();
                let applied = sequencer.submit_at(entry.command, Timestamp::new(entry.at));
                if applied.result.is_err() {
                    rejected += 1;
                }
                serde_json::to_writer(&mut out, &ResultLine::new(op, applied))?;
                writeln!(out)?;
            }
            tracing::info!(
                applied = sequencer.sequenced(),
                rejected,
                "replay finished"
            );

            if let Some(path) = snapshot_out {
                let economy = sequencer.into_economy();
                economy
                    .snapshot()
                    .write_to_file(&path)
                    .with_context(|| format!("writing snapshot {}", path.display()))?;
                tracing::info!("wrote snapshot to {}", path.display());
            }
            Ok(())
        }
    }
}
