//! Layered configuration resolution.

use std::path::PathBuf;
use std::sync::Mutex;

use quiniela_core::config::{ConfigOverrides, QuinielaConfig};
use quiniela_core::errors::{ConfigError, QuinielaErrorCode};

/// Serializes tests that touch environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn tempdir() -> tempfile::TempDir {
    tempfile::TempDir::new().unwrap()
}

fn clear_quiniela_env_vars() {
    for key in [
        "QUINIELA_DB_PATH",
        "QUINIELA_STALENESS_HOURS",
        "QUINIELA_AGGREGATION_TTL_SECS",
        "QUINIELA_MIN_PATTERN_STRENGTH",
        "QUINIELA_PREDICTION_TTL_SECS",
        "QUINIELA_RETENTION_DAYS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn overrides_beat_env_and_env_beats_project() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_quiniela_env_vars();

    let dir = tempdir();
    std::fs::write(
        dir.path().join("quiniela.toml"),
        r#"
[engine]
staleness_hours = 12
aggregation_ttl_secs = 600

[storage]
database_path = "project.db"
"#,
    )
    .unwrap();

    std::env::set_var("QUINIELA_STALENESS_HOURS", "6");
    std::env::set_var("QUINIELA_DB_PATH", "env.db");

    let overrides = ConfigOverrides {
        database_path: Some(PathBuf::from("override.db")),
        default_window_days: Some(730),
        ..Default::default()
    };
    let config = QuinielaConfig::load(dir.path(), Some(&overrides)).unwrap();

    assert_eq!(config.storage.database_path, Some(PathBuf::from("override.db")));
    assert_eq!(config.engine.staleness_hours, Some(6));
    assert_eq!(config.engine.aggregation_ttl_secs, Some(600));
    assert_eq!(config.engine.effective_default_window_days(), 730);

    clear_quiniela_env_vars();
}

#[test]
fn missing_project_file_falls_back_to_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_quiniela_env_vars();

    let dir = tempdir();
    let config = QuinielaConfig::load(dir.path(), None).unwrap();

    assert_eq!(config.engine.effective_staleness_hours(), 24);
    assert_eq!(config.engine.effective_aggregation_ttl_secs(), 3600);
    assert_eq!(config.ensemble.effective_prediction_ttl_secs(), 300);
    assert_eq!(config.detection.effective_correlation_min_draws(), 300);
    assert_eq!(config.engine.effective_default_window_days(), 1825);
    assert_eq!(config.storage.effective_retention_days(), 3650);
}

#[test]
fn malformed_project_file_is_a_parse_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_quiniela_env_vars();

    let dir = tempdir();
    std::fs::write(dir.path().join("quiniela.toml"), "[engine\nstaleness_hours = ").unwrap();

    let err = QuinielaConfig::load(dir.path(), None).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
    assert_eq!(err.error_code(), "CONFIG_ERROR");
}

#[test]
fn unparseable_env_value_is_ignored() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_quiniela_env_vars();

    std::env::set_var("QUINIELA_STALENESS_HOURS", "soon");
    let dir = tempdir();
    let config = QuinielaConfig::load(dir.path(), None).unwrap();
    assert_eq!(config.engine.effective_staleness_hours(), 24);

    clear_quiniela_env_vars();
}

#[test]
fn validation_rejects_out_of_range_values() {
    for toml in [
        "[engine]\nmin_pattern_strength = 1.5",
        "[engine]\nstaleness_hours = 0",
        "[detection]\nmarkov_smoothing = 0.0",
        "[ensemble]\nrelax_factor = 2.0",
        "[ensemble]\nmin_component_weight = 0.5",
        "[storage]\nread_pool_size = 0",
    ] {
        let err = QuinielaConfig::from_toml(toml).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationFailed { .. }),
            "expected validation failure for {toml:?}, got {err:?}"
        );
    }
}

#[test]
fn serialized_config_loads_back() {
    let config = QuinielaConfig::from_toml(
        "[detection]\nmin_pmi = 0.75\n\n[ensemble]\nmin_component_candidates = 20\n",
    )
    .unwrap();
    let text = config.to_toml().unwrap();
    let reloaded = QuinielaConfig::from_toml(&text).unwrap();

    assert_eq!(reloaded.detection.effective_min_pmi(), 0.75);
    assert_eq!(reloaded.ensemble.effective_min_component_candidates(), 20);
}
