use std::f64::consts::PI;

use spirogen_config::{IoMode, ReversalMode, ReversalSpec, SpiralSpec};
use spirogen_core::PathPoint;
use tracing::debug;

use crate::error::TraceError;
use crate::{ReversalMarkers, DELTA_EPS, DIRECTION_LOOKBACK};

/// Two counter-wound Archimedean arms joined by a center reversal, with
/// vertical tail segments at both ends.
#[derive(Debug, Clone)]
pub struct SpiralPath {
    pub points: Vec<PathPoint>,
    pub markers: ReversalMarkers,
}

pub struct SpiralPathBuilder<'a> {
    spiral: &'a SpiralSpec,
    reversal: &'a ReversalSpec,
    io_mode: IoMode,
}

impl<'a> SpiralPathBuilder<'a> {
    #[must_use]
    pub fn new(spiral: &'a SpiralSpec, reversal: &'a ReversalSpec, io_mode: IoMode) -> Self {
        Self {
            spiral,
            reversal,
            io_mode,
        }
    }

    /// Generate the full spiral path in conductor-travel order:
    /// tail, arm 1 reversed, reversal arcs, arm 2, tail.
    pub fn build(&self) -> Result<SpiralPath, TraceError> {
        let half_turns = f64::from(self.spiral.num_rotations) / 2.0;
        let b = self.spiral.spacing_um / PI;
        let rot_offset = PI;
        let diameter = self.reversal.diameter_um;

        let n1 = (self.spiral.num_points / 2).max(2);
        // The extra half turn puts both terminations on the same side.
        let arm2_turns = match self.io_mode {
            IoMode::SameSide => half_turns + 0.5,
            IoMode::OppositeSide => half_turns,
        };
        // Sample proportionally so angular density matches arm 1.
        let n2 = ((n1 as f64) * arm2_turns / half_turns).round() as usize;

        let mut arm1 = sample_arm(n1, half_turns, b, rot_offset, diameter, false);
        let mut arm2 = sample_arm(n2, arm2_turns, b, rot_offset, diameter, true);

        // Per-side reversal radii; `circle_smooth` trims each arm back to
        // its vertical-tangent point and matches the arc radius to it.
        let (d1, d2) = match self.reversal.mode {
            ReversalMode::Circle => (diameter, diameter),
            ReversalMode::CircleSmooth => {
                let d1 = trim_arm_to_vertical_tangent(&mut arm1)?;
                let d2 = trim_arm_to_vertical_tangent(&mut arm2)?;
                debug!(d1_um = d1, d2_um = d2, "smooth reversal trim radii");
                (d1, d2)
            }
        };

        let nc = (self.reversal.num_points / 2).max(2);
        // First arc sweeps the upper half plane from the arm-1 junction to
        // the origin; second arc mirrors it below toward arm 2.
        let mut circ1: Vec<PathPoint> = linspace(0.0, PI, nc)
            .map(|t| PathPoint::new(d1 / 2.0 * t.cos() - d1 / 2.0, d1 / 2.0 * t.sin()))
            .collect();
        circ1.reverse();
        let circ2: Vec<PathPoint> = linspace(PI, 2.0 * PI, nc)
            .map(|t| PathPoint::new(d2 / 2.0 * t.cos() + d2 / 2.0, d2 / 2.0 * t.sin()))
            .collect();

        arm1.reverse();

        let mut points: Vec<PathPoint> = Vec::with_capacity(n1 + n2 + 2 * nc + 2);
        extend_dedup(&mut points, arm1);
        let start = points.len().saturating_sub(1);
        extend_dedup(&mut points, circ1);
        let mid = points.len() - 1;
        extend_dedup(&mut points, circ2);
        let end = points.len() - 1;
        extend_dedup(&mut points, arm2);

        let mut markers = ReversalMarkers { start, mid, end };

        // Tail segments give the IO tapers a clean vertical seam to land on.
        let tail = self.spiral.tail_length_um;
        if tail > 0.0 {
            let (start_dir, end_dir) = match self.io_mode {
                IoMode::SameSide => (-1.0, -1.0),
                IoMode::OppositeSide => (-1.0, 1.0),
            };
            let first = points[0];
            let last = points[points.len() - 1];
            points.insert(0, PathPoint::new(first.x, first.y + start_dir * tail));
            markers.bump_from(0, 1);
            points.push(PathPoint::new(last.x, last.y + end_dir * tail));
        }

        debug!(
            points = points.len(),
            reversal_start = markers.start,
            reversal_mid = markers.mid,
            reversal_end = markers.end,
            "built spiral path"
        );

        Ok(SpiralPath { points, markers })
    }
}

fn linspace(a: f64, b: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = (b - a) / (n - 1) as f64;
    (0..n).map(move |i| a + step * i as f64)
}

/// Sample one polar arm, innermost point first. `mirror` rotates the arm by
/// a half turn so the two arms interleave.
fn sample_arm(
    n: usize,
    turns: f64,
    b: f64,
    rot_offset: f64,
    diameter: f64,
    mirror: bool,
) -> Vec<PathPoint> {
    let sign = if mirror { -1.0 } else { 1.0 };
    linspace(rot_offset, rot_offset + 2.0 * PI * turns, n)
        .map(|theta| {
            let r = (theta - rot_offset) * b + diameter;
            PathPoint::new(sign * r * theta.cos(), sign * r * theta.sin())
        })
        .collect()
}

/// Scan from the innermost point outward for the sample where horizontal
/// travel reverses sign (the tangent has passed vertical), drop everything
/// inside it, and bridge back to y = 0 with one vertical segment. Returns
/// the matched arc radius: the trim point's |x|.
fn trim_arm_to_vertical_tangent(arm: &mut Vec<PathPoint>) -> Result<f64, TraceError> {
    let mut init_sign = 0.0;
    for i in 0..DIRECTION_LOOKBACK.min(arm.len() - 1) {
        let dx = arm[i + 1].x - arm[i].x;
        if dx.abs() <= DELTA_EPS {
            continue;
        }
        let sign = dx.signum();
        if init_sign == 0.0 {
            init_sign = sign;
        } else if sign != init_sign {
            arm.drain(..i);
            let trim = arm[0];
            arm.insert(0, PathPoint::new(trim.x, 0.0));
            return Ok(trim.x.abs());
        }
    }
    Err(TraceError::DirectionDetection {
        index: 0,
        lookback: DIRECTION_LOOKBACK,
    })
}

fn extend_dedup(points: &mut Vec<PathPoint>, extra: Vec<PathPoint>) {
    for p in extra {
        if let Some(last) = points.last() {
            if last.distance_to(&p) < DELTA_EPS {
                continue;
            }
        }
        points.push(p);
    }
}
