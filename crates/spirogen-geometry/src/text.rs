use thiserror::Error;

use crate::Polyline;

#[derive(Debug, Error)]
pub enum TextShapeError {
    #[error("text shaping backend failure: {0}")]
    Backend(String),
}

/// Capability interface for turning a label string into mask geometry.
///
/// Implementations shape `text` at `size` (cap height, micrometers) into
/// closed outlines anchored baseline-left at the origin; callers place and
/// justify the result. Font handling stays behind this trait so any shaping
/// backend with polygon output can be substituted.
pub trait TextShaper {
    fn shape(&self, text: &str, size: f64) -> Result<Vec<Polyline<f64>>, TextShapeError>;
}
