use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use torus_duel_core::Snapshot;

/// Script format understood by this adapter.
const SUPPORTED_SCRIPT_VERSION: u32 = 1;

/// Recorded match: one host snapshot per turn, in turn order.
#[derive(Debug, Deserialize)]
pub(crate) struct MatchScript {
    #[serde(default = "default_version")]
    version: u32,
    /// Snapshots replayed through the engine.
    pub(crate) snapshots: Vec<Snapshot>,
}

fn default_version() -> u32 {
    SUPPORTED_SCRIPT_VERSION
}

impl MatchScript {
    /// Reads and validates a script from disk.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read match script at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid match script at {}", path.display()))
    }

    /// Parses and validates a script from its JSON text.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let script: Self =
            serde_json::from_str(contents).context("failed to parse match script json")?;
        if script.version != SUPPORTED_SCRIPT_VERSION {
            bail!(
                "unsupported match script version {}; expected {}",
                script.version,
                SUPPORTED_SCRIPT_VERSION
            );
        }
        if script.snapshots.is_empty() {
            bail!("match script contains no snapshots");
        }
        for (index, snapshot) in script.snapshots.iter().enumerate() {
            snapshot.validate().with_context(|| {
                format!("snapshot {index} (turn {}) is malformed", snapshot.turn)
            })?;
        }
        Ok(script)
    }
}
