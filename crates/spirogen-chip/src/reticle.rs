use spirogen_core::PathPoint;
use tracing::debug;

use crate::chip::ChipLayout;

/// Rigid-transform composition of chip layouts into one reticle.
///
/// Owns no geometry of its own: `add` transforms the child in place and
/// stores it, `flatten` hands every child's elements to the target in
/// insertion order. Children may overlap; composition is purely geometric.
#[derive(Debug, Clone, Default)]
pub struct ReticleLayout {
    children: Vec<ChipLayout>,
}

impl ReticleLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rotate `child` about `pivot`, then translate it, then append it.
    pub fn add(
        &mut self,
        mut child: ChipLayout,
        rotation_rad: f64,
        translation_um: (f64, f64),
        pivot: PathPoint,
    ) {
        child.rotate(rotation_rad, pivot);
        child.translate(translation_um.0, translation_um.1);
        debug!(
            chip = %child.name,
            rotation_rad,
            dx_um = translation_um.0,
            dy_um = translation_um.1,
            "placed chip on reticle"
        );
        self.children.push(child);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Copy every element of every child into `target`, in insertion order.
    pub fn flatten(self, target: &mut ChipLayout) {
        for child in self.children {
            target.merge_from(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use spirogen_core::{Layer, PathPoint};

    use crate::chip::PathElement;

    fn chip_with_trace(name: &str, x: f64) -> ChipLayout {
        let mut chip = ChipLayout::new(name);
        chip.traces.push(PathElement {
            points: vec![PathPoint::new(x, 0.0), PathPoint::new(x, 100.0)],
            widths: vec![2.0, 2.0],
            layer: Layer(10),
        });
        chip
    }

    #[test]
    fn add_rotates_about_pivot_then_translates() {
        let mut reticle = ReticleLayout::new();
        reticle.add(
            chip_with_trace("a", 0.0),
            std::f64::consts::FRAC_PI_2,
            (1000.0, 0.0),
            PathPoint::new(0.0, 0.0),
        );

        let mut flat = ChipLayout::new("flat");
        reticle.flatten(&mut flat);
        // (0, 100) rotates onto (-100, 0), then shifts to (900, 0).
        let p = flat.traces[0].points[1];
        assert_abs_diff_eq!(p.x, 900.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn flatten_preserves_insertion_order() {
        let mut reticle = ReticleLayout::new();
        reticle.add(
            chip_with_trace("first", 1.0),
            0.0,
            (0.0, 0.0),
            PathPoint::new(0.0, 0.0),
        );
        reticle.add(
            chip_with_trace("second", 2.0),
            0.0,
            (0.0, 0.0),
            PathPoint::new(0.0, 0.0),
        );
        assert_eq!(reticle.len(), 2);

        let mut flat = ChipLayout::new("flat");
        reticle.flatten(&mut flat);
        assert_eq!(flat.traces.len(), 2);
        assert_abs_diff_eq!(flat.traces[0].points[0].x, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(flat.traces[1].points[0].x, 2.0, epsilon = 1e-12);
    }
}
