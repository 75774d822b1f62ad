//! Combat tunables, loadable from TOML.

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// === Defaults ===

/// Radius (world units) within which a hostile starts tracking a target.
pub const DEFAULT_AGGRO_RADIUS: f32 = 160.0;

/// Leash radius as a multiple of the aggro radius.
pub const DEFAULT_LEASH_MULTIPLIER: f32 = 1.5;

/// Threat granted when a target is first detected by proximity.
pub const DEFAULT_BASE_THREAT: f32 = 10.0;

/// Threat lost per second by every tracked entry.
pub const DEFAULT_THREAT_DECAY_PER_SECOND: f32 = 1.0;

/// Radius within which AI allies notice enemies.
pub const DEFAULT_DETECTION_RADIUS: f32 = 140.0;

/// XP split among participants when a defeated unit carries no bounty.
pub const DEFAULT_BASE_XP_REWARD: u32 = 10;

/// Projectile travel speed (world units per second).
pub const DEFAULT_PROJECTILE_SPEED: f32 = 240.0;

// === Errors ===

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// === Config ===

/// Threat ledger tunables shared by every hostile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct ThreatConfig {
    pub aggro_radius: f32,
    pub leash_multiplier: f32,
    pub base_threat: f32,
    pub decay_per_second: f32,
    pub damage_multiplier: f32,
}

impl Default for ThreatConfig {
    fn default() -> Self {
        Self {
            aggro_radius: DEFAULT_AGGRO_RADIUS,
            leash_multiplier: DEFAULT_LEASH_MULTIPLIER,
            base_threat: DEFAULT_BASE_THREAT,
            decay_per_second: DEFAULT_THREAT_DECAY_PER_SECOND,
            damage_multiplier: 1.0,
        }
    }
}

impl ThreatConfig {
    #[must_use]
    pub fn leash_radius(&self) -> f32 {
        self.aggro_radius * self.leash_multiplier
    }
}

/// Global combat configuration. Missing TOML keys fall back to defaults.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[reflect(Resource)]
#[serde(default)]
pub struct CombatConfig {
    pub threat: ThreatConfig,
    pub detection_radius: f32,
    pub base_xp_reward: u32,
    pub projectile_speed: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            threat: ThreatConfig::default(),
            detection_radius: DEFAULT_DETECTION_RADIUS,
            base_xp_reward: DEFAULT_BASE_XP_REWARD,
            projectile_speed: DEFAULT_PROJECTILE_SPEED,
        }
    }
}

impl CombatConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("threat.aggro_radius", self.threat.aggro_radius)?;
        positive("detection_radius", self.detection_radius)?;
        positive("projectile_speed", self.projectile_speed)?;
        non_negative("threat.base_threat", self.threat.base_threat)?;
        non_negative("threat.decay_per_second", self.threat.decay_per_second)?;
        non_negative("threat.damage_multiplier", self.threat.damage_multiplier)?;
        if self.threat.leash_multiplier.is_nan() || self.threat.leash_multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                field: "threat.leash_multiplier",
                reason: format!("must be at least 1.0, got {}", self.threat.leash_multiplier),
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be zero or positive, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        assert!(CombatConfig::default().validate().is_ok());
    }

    #[test]
    fn leash_defaults_to_one_and_a_half_aggro() {
        let threat = ThreatConfig::default();
        assert!((threat.leash_radius() - 240.0).abs() < f32::EPSILON);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = CombatConfig::from_toml_str(
            r"
            base_xp_reward = 30

            [threat]
            aggro_radius = 200.0
            ",
        )
        .unwrap();

        assert_eq!(config.base_xp_reward, 30);
        assert_eq!(config.threat.aggro_radius, 200.0);
        assert_eq!(config.threat.base_threat, DEFAULT_BASE_THREAT);
        assert_eq!(config.projectile_speed, DEFAULT_PROJECTILE_SPEED);
    }

    #[test]
    fn rejects_leash_shorter_than_aggro() {
        let err = CombatConfig::from_toml_str("[threat]\nleash_multiplier = 0.5\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "threat.leash_multiplier",
                ..
            }
        ));
    }

    #[test]
    fn rejects_non_positive_radius() {
        let err = CombatConfig::from_toml_str("detection_radius = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "detection_radius",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = CombatConfig::from_toml_str("threat = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = CombatConfig::load("/nonexistent/skirmish.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
