use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported config extension for {path} (expected .yaml, .yml or .json)")]
    UnknownExtension { path: PathBuf },

    #[error("\"{field}\" must be positive (got {value})")]
    NonPositive { field: String, value: f64 },

    #[error("\"{field}\" must not be negative (got {value})")]
    Negative { field: String, value: f64 },

    #[error("spiral.num_rotations must be an even count of at least 2 windings (got {value})")]
    RotationCount { value: u32 },

    #[error("\"{field}\" needs at least {min} samples (got {value})")]
    TooFewSamples {
        field: String,
        min: usize,
        value: usize,
    },

    #[error("faux CPW taper width/length lists differ in length ({widths} vs {lengths})")]
    CpwListMismatch { widths: usize, lengths: usize },

    #[error(
        "same-side IO requires outer.y_line_offset_um ({outer}) below inner.y_line_offset_um ({inner})"
    )]
    IoLineOrder { outer: f64, inner: f64 },

    #[error(
        "steps.perturbation_um ({perturbation}) must be positive and smaller than the shortest section length ({shortest})"
    )]
    StepPerturbation { perturbation: f64, shortest: f64 },

    #[error("layer map is missing required role \"{role}\"")]
    MissingLayer { role: String },
}
