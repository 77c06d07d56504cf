//! Tunable engine parameters loaded from TOML.

use serde::Deserialize;
use thiserror::Error;

/// Tuning knobs for [`crate::DuelEngine`].
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Reach of turret and agent fire, in cells.
    pub fire_range: u32,
    /// Turns a power-up must be closer than a vantage point before it wins.
    pub vantage_margin: u32,
    /// Whether the opponent's teleport landings can veto an engagement.
    pub teleport_risk_check: bool,
    /// Consecutive turns of pre-emptive fire in a face-off.
    pub faceoff_fire_limit: u32,
    /// Turns ahead to follow projectiles when looking for crossfire.
    pub projectile_horizon: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fire_range: 4,
            vantage_margin: 1,
            teleport_risk_check: true,
            faceoff_fire_limit: 2,
            projectile_horizon: 3,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fire_range == 0 {
            return Err(ConfigError::ZeroFireRange);
        }
        if self.projectile_horizon == 0 {
            return Err(ConfigError::ZeroProjectileHorizon);
        }
        Ok(())
    }
}

/// Problems found while loading an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid TOML or has unexpected fields.
    #[error("failed to parse engine config")]
    Parse(#[from] toml::de::Error),
    /// `fire_range` was zero.
    #[error("fire_range must be at least 1")]
    ZeroFireRange,
    /// `projectile_horizon` was zero.
    #[error("projectile_horizon must be at least 1")]
    ZeroProjectileHorizon,
}
