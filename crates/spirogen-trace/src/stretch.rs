use spirogen_config::SpiralSpec;
use spirogen_core::PathPoint;
use tracing::debug;

use crate::error::TraceError;
use crate::{ReversalMarkers, DELTA_EPS, DIRECTION_LOOKBACK};

/// Adds horizontal/vertical extension by inserting a corner point at every
/// change of travel direction and shifting everything downstream of it.
///
/// The passes work orthogonally: horizontal extension cuts the path where
/// *vertical* travel reverses (the top/bottom turnarounds) and displaces the
/// suffix horizontally, so each turnaround gains a straight bridging
/// segment; vertical extension mirrors that at the left/right turnarounds.
pub struct SpiralStretchExpander {
    horiz_um: f64,
    vert_um: f64,
}

/// Axis the stretch displaces. Direction changes are detected on the other
/// axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftAxis {
    X,
    Y,
}

impl SpiralStretchExpander {
    #[must_use]
    pub fn new(spiral: &SpiralSpec) -> Self {
        Self {
            horiz_um: spiral.horiz_stretch_um,
            vert_um: spiral.vert_stretch_um,
        }
    }

    pub fn expand(
        &self,
        points: &mut Vec<PathPoint>,
        markers: &mut ReversalMarkers,
    ) -> Result<(), TraceError> {
        if self.horiz_um > 0.0 {
            let inserted = stretch_pass(points, markers, self.horiz_um, ShiftAxis::X)?;
            debug!(corners = inserted, amount_um = self.horiz_um, "horizontal stretch");
        }
        if self.vert_um > 0.0 {
            let inserted = stretch_pass(points, markers, self.vert_um, ShiftAxis::Y)?;
            debug!(corners = inserted, amount_um = self.vert_um, "vertical stretch");
        }
        Ok(())
    }
}

fn detect_delta(points: &[PathPoint], seg: usize, axis: ShiftAxis) -> f64 {
    match axis {
        ShiftAxis::X => points[seg + 1].y - points[seg].y,
        ShiftAxis::Y => points[seg + 1].x - points[seg].x,
    }
}

fn shift_delta(points: &[PathPoint], seg: usize, axis: ShiftAxis) -> f64 {
    match axis {
        ShiftAxis::X => points[seg + 1].x - points[seg].x,
        ShiftAxis::Y => points[seg + 1].y - points[seg].y,
    }
}

fn apply_shift(p: &mut PathPoint, axis: ShiftAxis, amount: f64) {
    match axis {
        ShiftAxis::X => p.x += amount,
        ShiftAxis::Y => p.y += amount,
    }
}

/// Sign of the delta at `seg`, falling back over up to `DIRECTION_LOOKBACK`
/// prior segments when the local delta is (near-)zero. The very first
/// segment has no history and resolves to "no sign yet"; anywhere else an
/// exhausted window means the path is degenerate.
fn resolved_sign(
    points: &[PathPoint],
    seg: usize,
    axis: ShiftAxis,
    delta: fn(&[PathPoint], usize, ShiftAxis) -> f64,
) -> Result<f64, TraceError> {
    let d = delta(points, seg, axis);
    if d.abs() > DELTA_EPS {
        return Ok(d.signum());
    }
    for k in 1..=DIRECTION_LOOKBACK {
        if seg < k {
            break;
        }
        let prior = delta(points, seg - k, axis);
        if prior.abs() > DELTA_EPS {
            return Ok(prior.signum());
        }
    }
    if seg == 0 {
        Ok(0.0)
    } else {
        Err(TraceError::DirectionDetection {
            index: seg,
            lookback: DIRECTION_LOOKBACK,
        })
    }
}

fn stretch_pass(
    points: &mut Vec<PathPoint>,
    markers: &mut ReversalMarkers,
    amount: f64,
    axis: ShiftAxis,
) -> Result<usize, TraceError> {
    let mut last_sign = 0.0;
    let mut inserted = 0usize;
    let mut i = 0usize;

    while i + 1 < points.len() {
        let sign = resolved_sign(points, i, axis, detect_delta)?;
        if sign != 0.0 && last_sign != 0.0 && sign != last_sign {
            // Travel reverses entering segment i; the corner is point i.
            // Displace the suffix along the incoming travel direction so
            // the bridging segment continues the conductor's motion.
            let travel = resolved_sign(points, i - 1, axis, shift_delta)?;
            if travel == 0.0 {
                return Err(TraceError::DirectionDetection {
                    index: i,
                    lookback: DIRECTION_LOOKBACK,
                });
            }
            let shift = travel * amount;
            let corner = points[i];
            points.insert(i + 1, corner);
            markers.bump_from(i + 1, 1);

            if i == markers.mid {
                // Keep the reversal seam centered: half the displacement
                // goes backward, half forward.
                for p in &mut points[..=i] {
                    apply_shift(p, axis, -shift / 2.0);
                }
                for p in &mut points[i + 1..] {
                    apply_shift(p, axis, shift / 2.0);
                }
            } else {
                for p in &mut points[i + 1..] {
                    apply_shift(p, axis, shift);
                }
            }

            inserted += 1;
            last_sign = sign;
            i += 2;
        } else {
            if sign != 0.0 {
                last_sign = sign;
            }
            i += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use spirogen_core::{bounding_box, path_length};

    fn markers() -> ReversalMarkers {
        ReversalMarkers {
            start: 0,
            mid: 0,
            end: 0,
        }
    }

    #[test]
    fn u_turn_gains_one_horizontal_bridge() {
        // Down, across, up: the vertical reversal at (10, -10) triggers a
        // horizontal corner in the direction of travel.
        let mut pts = vec![
            PathPoint::new(0.0, 0.0),
            PathPoint::new(0.0, -10.0),
            PathPoint::new(10.0, -10.0),
            PathPoint::new(10.0, 0.0),
        ];
        let before = path_length(&pts);
        let mut m = markers();
        stretch_pass(&mut pts, &mut m, 4.0, ShiftAxis::X).unwrap();

        assert_eq!(pts.len(), 5);
        assert_abs_diff_eq!(path_length(&pts), before + 4.0, epsilon = 1e-9);
        let bb = bounding_box(&pts).unwrap();
        assert_abs_diff_eq!(bb.width(), 14.0, epsilon = 1e-9);
        // Suffix moved along the incoming travel direction (+x).
        assert_abs_diff_eq!(pts[4].x, 14.0, epsilon = 1e-9);
    }

    #[test]
    fn sideways_u_turn_gains_one_vertical_bridge() {
        let mut pts = vec![
            PathPoint::new(0.0, 0.0),
            PathPoint::new(10.0, 0.0),
            PathPoint::new(10.0, 10.0),
            PathPoint::new(0.0, 10.0),
        ];
        let before = path_length(&pts);
        let mut m = markers();
        stretch_pass(&mut pts, &mut m, 6.0, ShiftAxis::Y).unwrap();

        assert_eq!(pts.len(), 5);
        assert_abs_diff_eq!(path_length(&pts), before + 6.0, epsilon = 1e-9);
        let bb = bounding_box(&pts).unwrap();
        assert_abs_diff_eq!(bb.height(), 16.0, epsilon = 1e-9);
    }

    #[test]
    fn corner_on_the_reversal_midpoint_splits_the_shift() {
        let mut pts = vec![
            PathPoint::new(0.0, 0.0),
            PathPoint::new(0.0, -10.0),
            PathPoint::new(10.0, -10.0),
            PathPoint::new(10.0, 0.0),
        ];
        let mut m = ReversalMarkers {
            start: 1,
            mid: 2,
            end: 3,
        };
        stretch_pass(&mut pts, &mut m, 4.0, ShiftAxis::X).unwrap();

        // Prefix moved back by half, suffix forward by half.
        assert_abs_diff_eq!(pts[0].x, -2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pts[2].x, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pts[3].x, 12.0, epsilon = 1e-9);
        // End marker tracked the insertion.
        assert_eq!(m.end, 4);
    }

    #[test]
    fn markers_reindex_for_insertions_before_them() {
        let mut pts = vec![
            PathPoint::new(0.0, 0.0),
            PathPoint::new(0.0, -10.0),
            PathPoint::new(10.0, -10.0),
            PathPoint::new(10.0, 0.0),
            PathPoint::new(10.0, 5.0),
        ];
        let mut m = ReversalMarkers {
            start: 3,
            mid: 3,
            end: 4,
        };
        stretch_pass(&mut pts, &mut m, 4.0, ShiftAxis::X).unwrap();
        assert_eq!((m.start, m.mid, m.end), (4, 4, 5));
    }

    #[test]
    fn degenerate_run_fails_direction_detection() {
        // Two consecutive segments with no horizontal travel exhaust the
        // lookback for the vertical pass.
        let mut pts = vec![
            PathPoint::new(0.0, 0.0),
            PathPoint::new(0.0, 5.0),
            PathPoint::new(0.0, 10.0),
            PathPoint::new(5.0, 10.0),
        ];
        let mut m = markers();
        let err = stretch_pass(&mut pts, &mut m, 2.0, ShiftAxis::Y);
        assert!(matches!(err, Err(TraceError::DirectionDetection { .. })));
    }

    #[test]
    fn monotone_paths_are_left_untouched() {
        let mut pts: Vec<PathPoint> = (0..20)
            .map(|i| PathPoint::new(f64::from(i), f64::from(i) * 0.5))
            .collect();
        let orig = pts.clone();
        let mut m = markers();
        stretch_pass(&mut pts, &mut m, 3.0, ShiftAxis::X).unwrap();
        assert_eq!(pts, orig);
    }
}
