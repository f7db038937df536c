use spirogen_core::PathPoint;
use spirogen_geometry::stroke::stroke_path_const;
use spirogen_geometry::{Polyline, Region};
use spirogen_trace::IoLine;
use tracing::debug;

/// Subtractive editor for the chip's ground plane.
///
/// The plane starts as the full chip-outline rectangle; pad keep-outs,
/// fiducials, labels and artwork are then cut out one at a time. Every cut
/// runs against the whole surviving region set, since a single difference
/// can split one region into several and later cutters must see all of the
/// fragments.
pub struct GroundPlaneEditor {
    region: Region,
}

impl GroundPlaneEditor {
    #[must_use]
    pub fn new(chip_size_um: [f64; 2]) -> Self {
        Self {
            region: Region::from_rect((0.0, 0.0), (chip_size_um[0], chip_size_um[1])),
        }
    }

    /// Cut the keep-out for one bond pad stack: a vertical stroke of
    /// pad-width plus twice the gap, following the pad centerline through
    /// the faux-CPW taper above it, with the gap extended past both ends.
    pub fn subtract_pad_keepout(&mut self, line: &IoLine, cpw_stack_um: f64, gap_um: f64) {
        let x = line.pad_center.x;
        // Pads sit on the bottom edge unless the layout mirrored them up.
        let s = if line.pad_center.y <= 0.0 { 1.0 } else { -1.0 };
        let near_y = if s > 0.0 {
            line.pad_bbox.min.y
        } else {
            line.pad_bbox.max.y
        };
        let far_y = near_y + s * (line.pad_size.1 + cpw_stack_um);

        let centerline = [
            PathPoint::new(x, near_y - s * gap_um),
            PathPoint::new(x, far_y + s * gap_um),
        ];
        if let Some(cutter) = stroke_path_const(&centerline, line.pad_size.0 + 2.0 * gap_um) {
            self.region.subtract(&cutter);
            debug!(x_um = x, "cut pad keep-out from ground plane");
        }
    }

    pub fn subtract_outline(&mut self, cutter: &Polyline<f64>) {
        self.region.subtract(cutter);
    }

    pub fn subtract_outlines(&mut self, cutters: &[Polyline<f64>]) {
        self.region.subtract_all(cutters);
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.region.area()
    }

    #[must_use]
    pub fn finish(self) -> Region {
        self.region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use spirogen_core::BBox;
    use spirogen_geometry::primitives::rectangle;

    fn pad_line(center_x: f64, center_y: f64, w: f64, h: f64) -> IoLine {
        IoLine {
            points: vec![],
            widths: vec![],
            pad_center: PathPoint::new(center_x, center_y),
            pad_size: (w, h),
            pad_bbox: BBox {
                min: PathPoint::new(center_x - w / 2.0, center_y - h / 2.0),
                max: PathPoint::new(center_x + w / 2.0, center_y + h / 2.0),
            },
        }
    }

    #[test]
    fn disjoint_cutters_remove_exactly_their_area() {
        let mut editor = GroundPlaneEditor::new([1000.0, 1000.0]);
        editor.subtract_outlines(&[
            rectangle((-200.0, 0.0), (50.0, 50.0)),
            rectangle((200.0, 0.0), (50.0, 50.0)),
            rectangle((0.0, 300.0), (20.0, 80.0)),
        ]);
        let expected = 1000.0 * 1000.0 - 2.0 * 50.0 * 50.0 - 20.0 * 80.0;
        assert_abs_diff_eq!(editor.area(), expected, epsilon = 1e-6);
    }

    #[test]
    fn pad_keepout_covers_pad_taper_and_gap() {
        let mut editor = GroundPlaneEditor::new([4000.0, 4000.0]);
        // Pad 200x100 near the bottom edge, 60 um of CPW stack, 20 um gap.
        let line = pad_line(-500.0, -1900.0, 200.0, 100.0);
        editor.subtract_pad_keepout(&line, 60.0, 20.0);

        let cut = (200.0 + 2.0 * 20.0) * (100.0 + 60.0 + 2.0 * 20.0);
        assert_abs_diff_eq!(editor.area(), 4000.0 * 4000.0 - cut, epsilon = 1e-6);
        // Keep-out clears the pad mouth and the taper above it.
        let region = editor.finish();
        assert!(!region.contains(-500.0, -1900.0));
        assert!(!region.contains(-500.0, -1810.0));
        assert!(region.contains(-500.0, -1700.0));
    }

    #[test]
    fn mirrored_pad_keepout_extends_downward() {
        let mut editor = GroundPlaneEditor::new([4000.0, 4000.0]);
        let line = pad_line(500.0, 1900.0, 200.0, 100.0);
        editor.subtract_pad_keepout(&line, 60.0, 20.0);

        let region = editor.finish();
        assert!(!region.contains(500.0, 1900.0));
        assert!(!region.contains(500.0, 1810.0));
        assert!(region.contains(500.0, 1700.0));
    }

    #[test]
    fn splitting_cut_leaves_later_cutters_effective() {
        let mut editor = GroundPlaneEditor::new([100.0, 100.0]);
        // First cut slices the plane in two; the second must still remove
        // area from the right-hand fragment.
        editor.subtract_outline(&rectangle((0.0, 0.0), (10.0, 200.0)));
        editor.subtract_outline(&rectangle((30.0, 0.0), (10.0, 200.0)));
        assert_abs_diff_eq!(
            editor.area(),
            100.0 * 100.0 - 2.0 * 10.0 * 100.0,
            epsilon = 1e-6
        );
    }
}
