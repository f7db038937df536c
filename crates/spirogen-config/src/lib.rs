//! Typed, validated configuration for chip and reticle builds.
//!
//! Structural checks (required keys, types) happen at deserialization;
//! `validate()` then cross-checks numeric invariants so the geometry stages
//! can assume a sane configuration.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

pub mod chip;
pub mod error;
pub mod reticle;

pub use chip::{
    ChipConfig, CpwTaperSpec, FiducialSpec, GroundSpec, IoConfig, IoMode, IoSpec, Justify,
    LabelSpec, LayerMap, PadSpec, ReversalMode, ReversalSpec, SpiralSpec, StepRun, StepSpec,
    TaperSpec, TlinSpec, MIN_IO_LINE_SEPARATION_UM,
};
pub use error::ConfigError;
pub use reticle::{ReticleConfig, ReticleMember};

/// Load and validate a chip config from a `.yaml`/`.yml`/`.json` file.
pub fn load_chip(path: &Path) -> Result<ChipConfig, ConfigError> {
    let config: ChipConfig = load_file(path)?;
    config.validate()?;
    info!(path = %path.display(), chip = %config.name, "loaded chip config");
    Ok(config)
}

/// Load and validate a reticle config from a `.yaml`/`.yml`/`.json` file.
pub fn load_reticle(path: &Path) -> Result<ReticleConfig, ConfigError> {
    let config: ReticleConfig = load_file(path)?;
    config.validate()?;
    info!(path = %path.display(), reticle = %config.name, "loaded reticle config");
    Ok(config)
}

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("json") => Ok(serde_json::from_str(&content)?),
        _ => Err(ConfigError::UnknownExtension {
            path: path.to_path_buf(),
        }),
    }
}
