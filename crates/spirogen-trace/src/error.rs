use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error(
        "spiral vertical extent {extent_um:.1} um exceeds the allowed clearance {allowed_um:.1} um"
    )]
    GeometricFit { extent_um: f64, allowed_um: f64 },

    #[error("IO bend radius {radius_um} um exceeds the line offset {offset_um} um")]
    BendRadius { radius_um: f64, offset_um: f64 },

    #[error("no usable travel direction within {lookback} samples of point {index}")]
    DirectionDetection { index: usize, lookback: usize },

    #[error("path with {points} points is too short to process")]
    DegeneratePath { points: usize },
}
