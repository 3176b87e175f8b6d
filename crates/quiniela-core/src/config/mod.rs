//! Configuration system.
//! TOML-based, layered resolution: overrides > env > project > user > defaults.

pub mod detection_config;
pub mod engine_config;
pub mod ensemble_config;
pub mod quiniela_config;
pub mod storage_config;

pub use detection_config::DetectionConfig;
pub use engine_config::EngineConfig;
pub use ensemble_config::EnsembleConfig;
pub use quiniela_config::{ConfigOverrides, QuinielaConfig};
pub use storage_config::StorageConfig;
