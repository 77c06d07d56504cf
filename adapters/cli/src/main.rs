#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a recorded match through the duel engine.

mod match_script;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use torus_duel_system_decision::{DuelEngine, EngineConfig};
use tracing_subscriber::{filter::Directive, EnvFilter};

use crate::match_script::MatchScript;

/// Replays a match script and prints the engine's action for every turn.
#[derive(Debug, Parser)]
#[command(name = "torus-duel")]
#[command(about = "Replay a recorded match through the torus duel decision engine")]
struct Args {
    /// JSON match script holding one snapshot per turn.
    #[arg(long)]
    script: PathBuf,
    /// TOML engine configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Extra log filter directive, e.g. `debug` or `torus_duel_system_safety=trace`.
    #[arg(long)]
    log: Option<String>,
    /// Turns a power-up must be closer than a vantage point to win.
    #[arg(long)]
    margin: Option<u32>,
    /// Ignore opponent teleport landings when entering an engagement.
    #[arg(long)]
    no_teleport_risk: bool,
}

/// Entry point for the torus duel command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref())?;

    let config = resolve_config(&args)?;
    let script = MatchScript::load(&args.script)?;
    tracing::info!(
        turns = script.snapshots.len(),
        script = %args.script.display(),
        "match script loaded"
    );

    let mut engine = DuelEngine::new(config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for snapshot in &script.snapshots {
        let action = engine.decide(snapshot);
        writeln!(out, "turn {}: {action}", snapshot.turn).context("failed to write action")?;
    }

    let profile = engine.profile();
    tracing::info!(
        reactive_to_fire = profile.reactive_to_fire(),
        aggressive_while_shielded = profile.aggressive_while_shielded(),
        "match replayed"
    );
    Ok(())
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(directive) = directive {
        let parsed: Directive = directive
            .parse()
            .with_context(|| format!("invalid log filter `{directive}`"))?;
        filter = filter.add_directive(parsed);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn resolve_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    if let Some(margin) = args.margin {
        config.vantage_margin = margin;
    }
    if args.no_teleport_risk {
        config.teleport_risk_check = false;
    }
    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read engine config at {}", path.display()))?;
    EngineConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid engine config at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "torus-duel",
            "--script",
            "match.json",
            "--margin",
            "2",
            "--no-teleport-risk",
        ]);

        let config = resolve_config(&args).expect("config resolves");

        assert_eq!(config.vantage_margin, 2);
        assert!(!config.teleport_risk_check);
        assert_eq!(config.fire_range, EngineConfig::default().fire_range);
    }
}
