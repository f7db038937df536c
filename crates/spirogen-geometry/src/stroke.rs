use spirogen_core::PathPoint;

use crate::{PlineVertex, Polyline};

// Consecutive points closer than this are treated as one vertex; the
// stepped-impedance transitions sit well above it.
const MERGE_EPS: f64 = 1e-9;

// Miter offsets are capped at 4x the half-width so near-reversals cannot
// throw outline vertices far from the path.
const MITER_LIMIT: f64 = 0.25;

/// Expand a centerline with per-point widths into a closed outline.
///
/// Offsets each vertex along the averaged segment normal, miter-corrected,
/// walking the left side forward and the right side back. Returns `None`
/// for paths with fewer than two distinct points.
pub fn stroke_path(points: &[PathPoint], widths: &[f64]) -> Option<Polyline<f64>> {
    assert_eq!(points.len(), widths.len(), "one width per path point");

    // Collapse coincident vertices, keeping the first width seen.
    let mut pts: Vec<PathPoint> = Vec::with_capacity(points.len());
    let mut ws: Vec<f64> = Vec::with_capacity(widths.len());
    for (p, w) in points.iter().zip(widths) {
        if let Some(last) = pts.last() {
            if last.distance_to(p) < MERGE_EPS {
                continue;
            }
        }
        pts.push(*p);
        ws.push(*w);
    }
    if pts.len() < 2 {
        return None;
    }

    let n = pts.len();
    let seg_dir = |i: usize| -> (f64, f64) {
        let a = pts[i];
        let b = pts[i + 1];
        let len = a.distance_to(&b);
        ((b.x - a.x) / len, (b.y - a.y) / len)
    };

    let mut left: Vec<(f64, f64)> = Vec::with_capacity(n);
    let mut right: Vec<(f64, f64)> = Vec::with_capacity(n);

    for i in 0..n {
        let dir = if i == 0 {
            seg_dir(0)
        } else if i == n - 1 {
            seg_dir(n - 2)
        } else {
            let (ax, ay) = seg_dir(i - 1);
            let (bx, by) = seg_dir(i);
            let (sx, sy) = (ax + bx, ay + by);
            let len = (sx * sx + sy * sy).sqrt();
            if len < MERGE_EPS {
                // Full reversal: fall back to the incoming direction.
                (ax, ay)
            } else {
                (sx / len, sy / len)
            }
        };
        let normal = (-dir.1, dir.0);

        // Miter compensation against the incoming segment normal.
        let scale = if i == 0 || i == n - 1 {
            1.0
        } else {
            let (ax, ay) = seg_dir(i - 1);
            let inc_normal = (-ay, ax);
            let cos_half = normal.0 * inc_normal.0 + normal.1 * inc_normal.1;
            1.0 / cos_half.max(MITER_LIMIT)
        };

        let half = ws[i] / 2.0 * scale;
        left.push((pts[i].x + normal.0 * half, pts[i].y + normal.1 * half));
        right.push((pts[i].x - normal.0 * half, pts[i].y - normal.1 * half));
    }

    let mut pl = Polyline::new_closed();
    for (x, y) in left {
        pl.vertex_data.push(PlineVertex::new(x, y, 0.0));
    }
    for (x, y) in right.into_iter().rev() {
        pl.vertex_data.push(PlineVertex::new(x, y, 0.0));
    }
    Some(pl)
}

/// Constant-width convenience form of [`stroke_path`].
pub fn stroke_path_const(points: &[PathPoint], width: f64) -> Option<Polyline<f64>> {
    stroke_path(points, &vec![width; points.len()])
}
