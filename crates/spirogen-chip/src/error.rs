use spirogen_config::ConfigError;
use spirogen_trace::TraceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChipError {
    #[error(transparent)]
    Trace(#[from] TraceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("conductor path cannot be stroked into a closed outline")]
    DegenerateStroke,
}
