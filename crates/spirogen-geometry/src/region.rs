use cavalier_contours::core::math::Vector2;
use cavalier_contours::polyline::{
    BooleanOp, PlineOrientation, PlineSource, PlineSourceMut, Polyline,
};
use spirogen_core::{BBox, PathPoint};

use crate::primitives;

/// A planar region as a set of positive outlines plus a set of holes.
///
/// Boolean subtraction is modeled against the *set* of surviving outlines:
/// one difference can split a region into several pieces, and every later
/// cutter has to see all of them. `subtract` therefore accumulates a
/// replacement set per cutter rather than ever assuming a single polygon.
#[derive(Debug, Clone, Default)]
pub struct Region {
    pub pos: Vec<Polyline<f64>>,
    pub neg: Vec<Polyline<f64>>,
}

impl Region {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_outline(outline: Polyline<f64>) -> Self {
        Self {
            pos: vec![outline],
            neg: Vec::new(),
        }
    }

    pub fn from_rect(center: (f64, f64), size: (f64, f64)) -> Self {
        Self::from_outline(primitives::rectangle(center, size))
    }

    pub fn is_empty(&self) -> bool {
        self.pos.is_empty()
    }

    /// Remove `cutter` from the region.
    pub fn subtract(&mut self, cutter: &Polyline<f64>) {
        self.subtract_all(std::slice::from_ref(cutter));
    }

    /// Remove every cutter in turn, applying each against the full current
    /// surviving set.
    pub fn subtract_all(&mut self, cutters: &[Polyline<f64>]) {
        for c in cutters {
            if !primitives::is_valid_closed_polyline(c) {
                continue;
            }

            let mut next_pos: Vec<Polyline<f64>> = Vec::new();
            let mut next_neg: Vec<Polyline<f64>> = Vec::new();

            for p in std::mem::take(&mut self.pos) {
                let res = p.boolean(c, BooleanOp::Not);
                next_pos.extend(res.pos_plines.into_iter().map(|p| simplify(p.pline)));
                next_neg.extend(res.neg_plines.into_iter().map(|p| simplify(p.pline)));
            }

            self.pos = normalize_winding(next_pos, PlineOrientation::CounterClockwise);
            self.neg
                .extend(normalize_winding(next_neg, PlineOrientation::Clockwise));
        }
    }

    /// Net enclosed area: positive outlines minus holes.
    pub fn area(&self) -> f64 {
        let pos: f64 = self.pos.iter().map(|p| p.area().abs()).sum();
        let neg: f64 = self.neg.iter().map(|p| p.area().abs()).sum();
        pos - neg
    }

    /// True when `(x, y)` lies inside the region (holes excluded).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let pt = Vector2::new(x, y);
        let inside_pos = self.pos.iter().any(|p| p.winding_number(pt) != 0);
        let inside_neg = self.neg.iter().any(|p| p.winding_number(pt) != 0);
        inside_pos && !inside_neg
    }

    /// Vertex-sweep bounding box over all outlines.
    pub fn bounding_box(&self) -> Option<BBox> {
        let mut acc: Option<BBox> = None;
        for pl in &self.pos {
            if let Some(bb) = primitives::polyline_bbox(pl) {
                acc = Some(match acc {
                    None => bb,
                    Some(a) => BBox {
                        min: PathPoint::new(a.min.x.min(bb.min.x), a.min.y.min(bb.min.y)),
                        max: PathPoint::new(a.max.x.max(bb.max.x), a.max.y.max(bb.max.y)),
                    },
                });
            }
        }
        acc
    }

    /// All outlines, positives first, for emission.
    pub fn into_outlines(self) -> Vec<Polyline<f64>> {
        let mut out = self.pos;
        out.extend(self.neg);
        out
    }
}

fn normalize_winding(
    plines: Vec<Polyline<f64>>,
    desired: PlineOrientation,
) -> Vec<Polyline<f64>> {
    plines
        .into_iter()
        .map(|mut pl| {
            let orientation = pl.orientation();
            if orientation != PlineOrientation::Open && orientation != desired {
                pl.invert_direction_mut();
            }
            pl
        })
        .collect()
}

// Boolean results often carry collinear vertex runs; collapse them so later
// operations and emitted files stay small.
fn simplify(p: Polyline<f64>) -> Polyline<f64> {
    p.remove_redundant(1e-6).unwrap_or(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::rectangle;
    use approx::assert_abs_diff_eq;

    #[test]
    fn subtracting_contained_rect_leaves_hole() {
        let mut region = Region::from_rect((0.0, 0.0), (100.0, 100.0));
        region.subtract(&rectangle((0.0, 0.0), (10.0, 10.0)));
        assert_abs_diff_eq!(region.area(), 100.0 * 100.0 - 10.0 * 10.0, epsilon = 1e-6);
        assert!(!region.contains(0.0, 0.0));
        assert!(region.contains(40.0, 40.0));
    }

    #[test]
    fn later_cutters_see_split_fragments() {
        // A full-height slice splits the plane in two; the second cutter
        // must remove area from the right-hand fragment.
        let mut region = Region::from_rect((0.0, 0.0), (100.0, 100.0));
        region.subtract(&rectangle((0.0, 0.0), (10.0, 120.0)));
        assert!(region.pos.len() >= 2);
        region.subtract(&rectangle((30.0, 0.0), (10.0, 120.0)));
        assert_abs_diff_eq!(
            region.area(),
            100.0 * 100.0 - 2.0 * 10.0 * 100.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn subtracting_identical_outline_clears_region() {
        let rect = rectangle((0.0, 0.0), (25.0, 40.0));
        let mut region = Region::from_outline(rect.clone());
        region.subtract(&rect);
        assert!(region.is_empty());
    }
}
