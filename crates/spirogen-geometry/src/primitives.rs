use cavalier_contours::polyline::PlineSource;
use spirogen_core::{BBox, PathPoint};

use crate::{PlineVertex, Polyline};

fn rotate_about(x: f64, y: f64, pivot: PathPoint, angle_rad: f64) -> (f64, f64) {
    let (s, c) = angle_rad.sin_cos();
    let dx = x - pivot.x;
    let dy = y - pivot.y;
    (pivot.x + dx * c - dy * s, pivot.y + dx * s + dy * c)
}

/// Axis-aligned rectangle as a CCW closed polyline.
pub fn rectangle(center: (f64, f64), size: (f64, f64)) -> Polyline<f64> {
    let (cx, cy) = center;
    let hw = size.0 / 2.0;
    let hh = size.1 / 2.0;

    let mut pl = Polyline::new_closed();
    for (x, y) in [
        (cx - hw, cy - hh),
        (cx + hw, cy - hh),
        (cx + hw, cy + hh),
        (cx - hw, cy + hh),
    ] {
        pl.vertex_data.push(PlineVertex::new(x, y, 0.0));
    }
    pl
}

/// Full circle as two 180-degree arc segments (bulge = 1).
pub fn circle(center: (f64, f64), radius: f64) -> Polyline<f64> {
    let (cx, cy) = center;
    let mut pl = Polyline::new_closed();
    pl.vertex_data.push(PlineVertex::new(cx - radius, cy, 1.0));
    pl.vertex_data.push(PlineVertex::new(cx + radius, cy, 1.0));
    pl
}

pub fn polygon(vertices: &[(f64, f64)]) -> Polyline<f64> {
    let mut pl = Polyline::new_closed();
    for &(x, y) in vertices {
        pl.vertex_data.push(PlineVertex::new(x, y, 0.0));
    }
    pl
}

pub fn is_valid_closed_polyline(pl: &Polyline<f64>) -> bool {
    pl.is_closed && pl.vertex_count() >= 2
}

/// Rotate every vertex about `pivot`. Bulge values are rotation-invariant.
pub fn rotate_polyline(pl: &mut Polyline<f64>, angle_rad: f64, pivot: PathPoint) {
    for v in &mut pl.vertex_data {
        let (x, y) = rotate_about(v.x, v.y, pivot, angle_rad);
        v.x = x;
        v.y = y;
    }
}

pub fn translate_polyline(pl: &mut Polyline<f64>, dx: f64, dy: f64) {
    for v in &mut pl.vertex_data {
        v.x += dx;
        v.y += dy;
    }
}

/// Vertex-sweep bounding box. Arc segments may bulge slightly past this.
pub fn polyline_bbox(pl: &Polyline<f64>) -> Option<BBox> {
    let first = pl.vertex_data.first()?;
    let mut min = PathPoint::new(first.x, first.y);
    let mut max = min;
    for v in &pl.vertex_data {
        min.x = min.x.min(v.x);
        min.y = min.y.min(v.y);
        max.x = max.x.max(v.x);
        max.y = max.y.max(v.y);
    }
    Some(BBox { min, max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cavalier_contours::polyline::PlineSource;

    #[test]
    fn rectangle_has_expected_area_and_bbox() {
        let r = rectangle((10.0, -5.0), (8.0, 2.0));
        assert_abs_diff_eq!(r.area(), 16.0, epsilon = 1e-9);
        let bb = polyline_bbox(&r).unwrap();
        assert_abs_diff_eq!(bb.min.x, 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(bb.max.y, -4.0, epsilon = 1e-12);
    }

    #[test]
    fn rotate_polyline_quarter_turn_swaps_extents() {
        let mut r = rectangle((0.0, 0.0), (10.0, 2.0));
        rotate_polyline(&mut r, std::f64::consts::FRAC_PI_2, PathPoint::new(0.0, 0.0));
        let bb = polyline_bbox(&r).unwrap();
        assert_abs_diff_eq!(bb.width(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bb.height(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn translate_polyline_is_exact_for_zero_shift() {
        let mut r = rectangle((1.0, 2.0), (3.0, 4.0));
        let before = r.vertex_data.clone();
        translate_polyline(&mut r, 0.0, 0.0);
        for (a, b) in before.iter().zip(&r.vertex_data) {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
        }
    }
}
