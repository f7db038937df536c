use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// A multi-chip reticle: member chip configs plus their placements.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReticleConfig {
    pub name: String,
    pub members: Vec<ReticleMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReticleMember {
    /// Chip config path, resolved relative to the reticle file.
    pub config: PathBuf,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default)]
    pub translation_um: [f64; 2],
    /// Rotation pivot; defaults to the chip origin.
    #[serde(default)]
    pub pivot_um: Option<[f64; 2]>,
    /// Per-member nominal conductor width override.
    #[serde(default)]
    pub center_width_um: Option<f64>,
}

impl ReticleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.members.is_empty() {
            return Err(ConfigError::TooFewSamples {
                field: "members".into(),
                min: 1,
                value: 0,
            });
        }
        for m in &self.members {
            if let Some(w) = m.center_width_um {
                if w <= 0.0 {
                    return Err(ConfigError::NonPositive {
                        field: "members[].center_width_um".into(),
                        value: w,
                    });
                }
            }
        }
        Ok(())
    }
}
