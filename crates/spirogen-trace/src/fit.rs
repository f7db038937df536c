use spirogen_config::{ChipConfig, IoMode};
use spirogen_core::{bounding_box, PathPoint};
use tracing::debug;

use crate::error::TraceError;

/// Checks the generated path against the chip envelope and computes its
/// vertical placement.
///
/// The clearance band runs from the inner IO line (plus the pad stack) up
/// to the chip top, less the configured buffers; in opposite-side mode the
/// outer IO line claims the top as well. The configured vertical stretch is
/// reserved here because stretching runs after placement.
pub struct FitValidator {
    upper_bound: f64,
    lower_bound: f64,
    spiral_io_buffer: f64,
    chip_edge_buffer: f64,
    vertical_reserve: f64,
}

impl FitValidator {
    #[must_use]
    pub fn from_config(config: &ChipConfig) -> Self {
        let half_height = config.chip_size_um[1] / 2.0;
        let upper_bound = match config.io.mode {
            IoMode::SameSide => half_height,
            IoMode::OppositeSide => half_height - config.io.outer.y_line_offset_um,
        };
        let lower_bound =
            -half_height + config.io.inner.y_line_offset_um + config.io.pad.height_um;
        Self {
            upper_bound,
            lower_bound,
            spiral_io_buffer: config.spiral_io_buffer_um,
            chip_edge_buffer: config.chip_edge_buffer_um,
            vertical_reserve: config.spiral.vert_stretch_um,
        }
    }

    #[must_use]
    pub fn allowed_size(&self) -> f64 {
        self.upper_bound - self.lower_bound - self.spiral_io_buffer - self.chip_edge_buffer
    }

    /// Validate the path's vertical extent and return the uniform vertical
    /// offset that centers it inside the clearance band.
    pub fn validate(&self, points: &[PathPoint]) -> Result<f64, TraceError> {
        let bbox = bounding_box(points).ok_or(TraceError::DegeneratePath { points: 0 })?;
        let extent = bbox.height() + self.vertical_reserve;
        let allowed = self.allowed_size();
        if extent > allowed {
            return Err(TraceError::GeometricFit {
                extent_um: extent,
                allowed_um: allowed,
            });
        }

        let band_bottom = self.lower_bound + self.spiral_io_buffer;
        let band_top = self.upper_bound - self.chip_edge_buffer;
        let offset = (band_bottom + band_top) / 2.0 - bbox.center().y;
        debug!(
            extent_um = extent,
            allowed_um = allowed,
            offset_um = offset,
            "spiral fits chip envelope"
        );
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use spirogen_core::translate_points;

    fn validator(upper: f64, lower: f64, io_buf: f64, edge_buf: f64) -> FitValidator {
        FitValidator {
            upper_bound: upper,
            lower_bound: lower,
            spiral_io_buffer: io_buf,
            chip_edge_buffer: edge_buf,
            vertical_reserve: 0.0,
        }
    }

    #[test]
    fn oversized_path_is_rejected() {
        let v = validator(1000.0, -1000.0, 100.0, 100.0);
        let pts = vec![PathPoint::new(0.0, -950.0), PathPoint::new(0.0, 950.0)];
        assert!(matches!(
            v.validate(&pts),
            Err(TraceError::GeometricFit { .. })
        ));
    }

    #[test]
    fn offset_centers_the_path_in_the_clearance_band() {
        let v = validator(1000.0, -600.0, 100.0, 50.0);
        // Band is [-500, 950]; its center sits at 225.
        let pts = vec![PathPoint::new(0.0, -200.0), PathPoint::new(0.0, 200.0)];
        let offset = v.validate(&pts).unwrap();
        assert_abs_diff_eq!(offset, 225.0, epsilon = 1e-9);

        let mut placed = pts.clone();
        translate_points(&mut placed, 0.0, offset);
        let bb = bounding_box(&placed).unwrap();
        assert!(bb.min.y >= -500.0 && bb.max.y <= 950.0);
    }

    #[test]
    fn vertical_reserve_counts_against_clearance() {
        let mut v = validator(500.0, -500.0, 0.0, 0.0);
        v.vertical_reserve = 400.0;
        let pts = vec![PathPoint::new(0.0, -350.0), PathPoint::new(0.0, 350.0)];
        assert!(matches!(
            v.validate(&pts),
            Err(TraceError::GeometricFit { .. })
        ));
    }
}
