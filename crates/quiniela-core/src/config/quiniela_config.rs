//! Top-level configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{DetectionConfig, EngineConfig, EnsembleConfig, StorageConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Explicit overrides (applied via `apply_overrides`)
/// 2. Environment variables (`QUINIELA_*`)
/// 3. Project config (`quiniela.toml` in the project root)
/// 4. User config (`~/.quiniela/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QuinielaConfig {
    pub detection: DetectionConfig,
    pub engine: EngineConfig,
    pub ensemble: EnsembleConfig,
    pub storage: StorageConfig,
}

/// Caller-supplied overrides that beat every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub staleness_hours: Option<u32>,
    pub default_window_days: Option<u32>,
}

impl QuinielaConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path, overrides: Option<&ConfigOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join("quiniela.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): explicit overrides
        if let Some(o) = overrides {
            Self::apply_overrides(&mut config, o);
        }

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &QuinielaConfig) -> Result<(), ConfigError> {
        if let Some(strength) = config.engine.min_pattern_strength {
            if !(0.0..=1.0).contains(&strength) {
                return Err(invalid("engine.min_pattern_strength", "must be between 0.0 and 1.0"));
            }
        }
        if config.engine.staleness_hours == Some(0) {
            return Err(invalid("engine.staleness_hours", "must be greater than 0"));
        }
        if config.engine.default_window_days == Some(0) {
            return Err(invalid("engine.default_window_days", "must be greater than 0"));
        }
        if let Some(smoothing) = config.detection.markov_smoothing {
            if smoothing <= 0.0 || !smoothing.is_finite() {
                return Err(invalid("detection.markov_smoothing", "must be a positive number"));
            }
        }
        if let Some(z) = config.detection.weekday_z_threshold {
            if z <= 0.0 || !z.is_finite() {
                return Err(invalid("detection.weekday_z_threshold", "must be a positive number"));
            }
        }
        if let Some(factor) = config.ensemble.relax_factor {
            if !(factor > 0.0 && factor <= 1.0) {
                return Err(invalid("ensemble.relax_factor", "must be in (0.0, 1.0]"));
            }
        }
        if let Some(floor) = config.ensemble.min_component_weight {
            if !(0.0..=0.25).contains(&floor) {
                return Err(invalid("ensemble.min_component_weight", "must be between 0.0 and 0.25"));
            }
        }
        if config.storage.read_pool_size == Some(0) {
            return Err(invalid("storage.read_pool_size", "must be greater than 0"));
        }
        Ok(())
    }

    /// Returns the user config path: `~/.quiniela/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".quiniela").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut QuinielaConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: QuinielaConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `Some` values in `other` win.
    fn merge(base: &mut QuinielaConfig, other: &QuinielaConfig) {
        macro_rules! take {
            ($section:ident . $field:ident) => {
                if other.$section.$field.is_some() {
                    base.$section.$field = other.$section.$field.clone();
                }
            };
        }

        // Detection
        take!(detection.sequential_min_draws);
        take!(detection.cyclical_min_draws);
        take!(detection.correlation_min_draws);
        take!(detection.markov_smoothing);
        take!(detection.context_days);
        take!(detection.weekday_z_threshold);
        take!(detection.min_pmi);
        take!(detection.min_joint_count);

        // Engine
        take!(engine.staleness_hours);
        take!(engine.aggregation_ttl_secs);
        take!(engine.min_pattern_strength);
        take!(engine.default_window_days);

        // Ensemble
        take!(ensemble.prediction_ttl_secs);
        take!(ensemble.relax_factor);
        take!(ensemble.min_component_weight);
        take!(ensemble.min_component_candidates);

        // Storage
        take!(storage.database_path);
        take!(storage.retention_days);
        take!(storage.read_pool_size);
    }

    /// Apply environment variable overrides.
    /// Pattern: `QUINIELA_DB_PATH`, `QUINIELA_STALENESS_HOURS`, etc.
    fn apply_env_overrides(config: &mut QuinielaConfig) {
        if let Ok(val) = std::env::var("QUINIELA_DB_PATH") {
            config.storage.database_path = Some(PathBuf::from(val));
        }
        if let Some(v) = env_parse::<u32>("QUINIELA_STALENESS_HOURS") {
            config.engine.staleness_hours = Some(v);
        }
        if let Some(v) = env_parse::<u64>("QUINIELA_AGGREGATION_TTL_SECS") {
            config.engine.aggregation_ttl_secs = Some(v);
        }
        if let Some(v) = env_parse::<f64>("QUINIELA_MIN_PATTERN_STRENGTH") {
            config.engine.min_pattern_strength = Some(v);
        }
        if let Some(v) = env_parse::<u64>("QUINIELA_PREDICTION_TTL_SECS") {
            config.ensemble.prediction_ttl_secs = Some(v);
        }
        if let Some(v) = env_parse::<u32>("QUINIELA_RETENTION_DAYS") {
            config.storage.retention_days = Some(v);
        }
    }

    /// Apply explicit overrides (highest priority).
    fn apply_overrides(config: &mut QuinielaConfig, overrides: &ConfigOverrides) {
        if let Some(ref path) = overrides.database_path {
            config.storage.database_path = Some(path.clone());
        }
        if let Some(v) = overrides.staleness_hours {
            config.engine.staleness_hours = Some(v);
        }
        if let Some(v) = overrides.default_window_days {
            config.engine.default_window_days = Some(v);
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
