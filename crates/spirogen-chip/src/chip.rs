use spirogen_config::{ChipConfig, FiducialSpec, IoMode, Justify, LabelSpec};
use spirogen_core::{
    path_length, rotate_points, translate_points, Layer, PathPoint, WidthProfile,
};
use spirogen_geometry::primitives::{
    polyline_bbox, rectangle, rotate_polyline, translate_polyline,
};
use spirogen_geometry::stroke::stroke_path;
use spirogen_geometry::{Polyline, Region, TextShaper};
use spirogen_trace::{
    FitValidator, ImpedanceStepInserter, IoTaperBuilder, SpiralPathBuilder,
    SpiralStretchExpander,
};
use tracing::{debug, info, warn};

use crate::error::ChipError;
use crate::ground::GroundPlaneEditor;

/// A conductor centerline with its parallel width list.
#[derive(Debug, Clone)]
pub struct PathElement {
    pub points: Vec<PathPoint>,
    pub widths: Vec<f64>,
    pub layer: Layer,
}

/// A closed outline on a mask layer.
#[derive(Debug, Clone)]
pub struct ShapeElement {
    pub outline: Polyline<f64>,
    pub layer: Layer,
}

/// The surviving ground-plane region set.
#[derive(Debug, Clone)]
pub struct GroundPlane {
    pub region: Region,
    pub layer: Layer,
}

/// One chip's owned, layer-tagged mask elements.
///
/// Created empty, populated by [`ChipBuilder`], optionally placed on a
/// [`crate::ReticleLayout`], and finally handed to the emission stage.
/// `rotate` and `translate` apply uniformly to every owned element; a
/// freshly built chip has one trace and one outline, a flattened reticle
/// accumulates several of each.
#[derive(Debug, Clone, Default)]
pub struct ChipLayout {
    pub name: String,
    pub traces: Vec<PathElement>,
    /// Etch-inverted conductor geometry; replaces `traces` on etch designs.
    pub trace_regions: Vec<ShapeElement>,
    pub outlines: Vec<ShapeElement>,
    pub pads: Vec<ShapeElement>,
    pub io_lines: Vec<PathElement>,
    pub grounds: Vec<GroundPlane>,
    pub fiducials: Vec<ShapeElement>,
    pub labels: Vec<ShapeElement>,
    pub artwork: Vec<ShapeElement>,
    pub etch_windows: Vec<ShapeElement>,
}

impl ChipLayout {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
            && self.trace_regions.is_empty()
            && self.outlines.is_empty()
            && self.pads.is_empty()
            && self.io_lines.is_empty()
            && self.grounds.is_empty()
            && self.fiducials.is_empty()
            && self.labels.is_empty()
            && self.artwork.is_empty()
            && self.etch_windows.is_empty()
    }

    fn shapes_mut(&mut self) -> impl Iterator<Item = &mut ShapeElement> {
        self.trace_regions
            .iter_mut()
            .chain(self.outlines.iter_mut())
            .chain(self.pads.iter_mut())
            .chain(self.fiducials.iter_mut())
            .chain(self.labels.iter_mut())
            .chain(self.artwork.iter_mut())
            .chain(self.etch_windows.iter_mut())
    }

    /// Rotate every owned element by `angle_rad` about `pivot`.
    pub fn rotate(&mut self, angle_rad: f64, pivot: PathPoint) {
        for trace in &mut self.traces {
            rotate_points(&mut trace.points, angle_rad, pivot);
        }
        for line in &mut self.io_lines {
            rotate_points(&mut line.points, angle_rad, pivot);
        }
        for shape in self.shapes_mut() {
            rotate_polyline(&mut shape.outline, angle_rad, pivot);
        }
        for ground in &mut self.grounds {
            for pl in ground
                .region
                .pos
                .iter_mut()
                .chain(ground.region.neg.iter_mut())
            {
                rotate_polyline(pl, angle_rad, pivot);
            }
        }
    }

    /// Shift every owned element by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        for trace in &mut self.traces {
            translate_points(&mut trace.points, dx, dy);
        }
        for line in &mut self.io_lines {
            translate_points(&mut line.points, dx, dy);
        }
        for shape in self.shapes_mut() {
            translate_polyline(&mut shape.outline, dx, dy);
        }
        for ground in &mut self.grounds {
            for pl in ground
                .region
                .pos
                .iter_mut()
                .chain(ground.region.neg.iter_mut())
            {
                translate_polyline(pl, dx, dy);
            }
        }
    }

    /// Take every element of `other`, preserving element order per kind.
    pub fn merge_from(&mut self, other: ChipLayout) {
        self.traces.extend(other.traces);
        self.trace_regions.extend(other.trace_regions);
        self.outlines.extend(other.outlines);
        self.pads.extend(other.pads);
        self.io_lines.extend(other.io_lines);
        self.grounds.extend(other.grounds);
        self.fiducials.extend(other.fiducials);
        self.labels.extend(other.labels);
        self.artwork.extend(other.artwork);
        self.etch_windows.extend(other.etch_windows);
    }

    /// Add pre-shaped closed outlines (logos or other marks) on `layer`,
    /// cutting each of them out of the ground plane as well.
    pub fn insert_artwork(&mut self, outlines: Vec<Polyline<f64>>, layer: Layer) {
        for ground in &mut self.grounds {
            ground.region.subtract_all(&outlines);
        }
        self.artwork.extend(
            outlines
                .into_iter()
                .map(|outline| ShapeElement { outline, layer }),
        );
    }
}

/// Totals reported by a chip build, for labels and logs.
#[derive(Debug, Clone, Copy)]
pub struct BuildReport {
    pub conductor_length_um: f64,
    pub low_impedance_sections: usize,
}

/// Runs the whole trace pipeline for one chip config and assembles the
/// resulting layout: spiral, fit, stretch, optional impedance steps, the
/// two IO tapers, ground plane, fiducials and labels.
pub struct ChipBuilder<'a> {
    config: ChipConfig,
    shaper: Option<&'a dyn TextShaper>,
}

impl<'a> ChipBuilder<'a> {
    #[must_use]
    pub fn new(config: &ChipConfig) -> Self {
        Self {
            config: config.clone(),
            shaper: None,
        }
    }

    /// Install the text-shaping backend used for chip labels. Without one,
    /// labels are skipped with a warning.
    #[must_use]
    pub fn with_shaper(mut self, shaper: &'a dyn TextShaper) -> Self {
        self.shaper = Some(shaper);
        self
    }

    /// Override the nominal conductor width, including the final faux-CPW
    /// stage, without touching the config file.
    #[must_use]
    pub fn with_center_width(mut self, width_um: f64) -> Self {
        self.config.tlin.center_width_um = width_um;
        if let Some(last) = self.config.io.pad.faux_cpw_taper.cpw_widths_um.last_mut() {
            *last = width_um;
        }
        self
    }

    pub fn build(&self) -> Result<(ChipLayout, BuildReport), ChipError> {
        let config = &self.config;
        let trace_layer = config.layers.require("trace")?;
        let outline_layer = config.layers.require("outline")?;
        let pads_layer = config.layers.require("pads")?;

        let spiral = SpiralPathBuilder::new(&config.spiral, &config.reversal, config.io.mode)
            .build()?;
        let offset = FitValidator::from_config(config).validate(&spiral.points)?;

        let mut points = spiral.points;
        let mut markers = spiral.markers;
        translate_points(&mut points, 0.0, offset);
        SpiralStretchExpander::new(&config.spiral).expand(&mut points, &mut markers)?;

        let nominal = config.tlin.center_width_um;
        let (points, widths, low_sections, total_length) = match &config.steps {
            Some(steps) => {
                let stepped = ImpedanceStepInserter::new(steps).insert(&points)?;
                (
                    stepped.points,
                    stepped.widths,
                    stepped.num_low_sections,
                    stepped.total_length_um,
                )
            }
            None => {
                let total = path_length(&points);
                let widths = WidthProfile::Constant(nominal).materialize(points.len());
                (points, widths, 0, total)
            }
        };

        // One IO structure per conductor end: the path starts on the inner
        // termination, ends on the outer one. In opposite-side mode the
        // outer conductor exits the top edge.
        let chip_height = config.chip_size_um[1];
        let inner_target = points[0];
        let outer_target = points[points.len() - 1];
        let inner_line =
            IoTaperBuilder::new(&config.io.inner, &config.io.pad, chip_height, nominal, false)
                .build(inner_target)?;
        let outer_line = IoTaperBuilder::new(
            &config.io.outer,
            &config.io.pad,
            chip_height,
            nominal,
            config.io.mode == IoMode::OppositeSide,
        )
        .build(outer_target)?;

        let mut layout = ChipLayout::new(&config.name);
        layout.outlines.push(ShapeElement {
            outline: rectangle((0.0, 0.0), (config.chip_size_um[0], config.chip_size_um[1])),
            layer: outline_layer,
        });
        for line in [&inner_line, &outer_line] {
            layout.pads.push(ShapeElement {
                outline: rectangle((line.pad_center.x, line.pad_center.y), line.pad_size),
                layer: pads_layer,
            });
        }

        let fiducial_outlines = match &config.fiducials {
            Some(spec) => fiducial_outlines(config.chip_size_um, spec),
            None => Vec::new(),
        };
        let label_outlines: Vec<Polyline<f64>> = config
            .labels
            .iter()
            .filter_map(|spec| self.place_label(spec))
            .flatten()
            .collect();

        if let Some(ground_spec) = &config.ground {
            let ground_layer = config.layers.require("ground")?;
            let cpw_stack: f64 = config.io.pad.faux_cpw_taper.cpw_lengths_um.iter().sum();
            let mut editor = GroundPlaneEditor::new(config.chip_size_um);
            editor.subtract_pad_keepout(&inner_line, cpw_stack, ground_spec.pad_gap_um);
            editor.subtract_pad_keepout(&outer_line, cpw_stack, ground_spec.pad_gap_um);
            editor.subtract_outlines(&fiducial_outlines);
            editor.subtract_outlines(&label_outlines);
            layout.grounds.push(GroundPlane {
                region: editor.finish(),
                layer: ground_layer,
            });
        }

        if !fiducial_outlines.is_empty() {
            let marks_layer = config.layers.require("marks")?;
            layout.fiducials.extend(
                fiducial_outlines
                    .into_iter()
                    .map(|outline| ShapeElement {
                        outline,
                        layer: marks_layer,
                    }),
            );
        }
        if !label_outlines.is_empty() {
            let labels_layer = config.layers.require("labels")?;
            layout.labels.extend(label_outlines.into_iter().map(|outline| ShapeElement {
                outline,
                layer: labels_layer,
            }));
        }

        if let Some(margin) = config.io.pad.etch_margin_um {
            let etch_layer = config.layers.require("pad_etch")?;
            for line in [&inner_line, &outer_line] {
                let bb = line.pad_bbox.inflate(margin);
                let center = bb.center();
                layout.etch_windows.push(ShapeElement {
                    outline: rectangle((center.x, center.y), (bb.width(), bb.height())),
                    layer: etch_layer,
                });
            }
        }

        if config.is_etch {
            // Etch designs describe material removal: the mask carries the
            // chip outline minus every stroked conductor, not centerlines.
            let mut etch = Region::from_rect(
                (0.0, 0.0),
                (config.chip_size_um[0], config.chip_size_um[1]),
            );
            let trace_stroke =
                stroke_path(&points, &widths).ok_or(ChipError::DegenerateStroke)?;
            etch.subtract(&trace_stroke);
            for line in [&inner_line, &outer_line] {
                let stroke = stroke_path(&line.points, &line.widths)
                    .ok_or(ChipError::DegenerateStroke)?;
                etch.subtract(&stroke);
                etch.subtract(&rectangle(
                    (line.pad_center.x, line.pad_center.y),
                    line.pad_size,
                ));
            }
            layout.trace_regions.extend(
                etch.into_outlines()
                    .into_iter()
                    .map(|outline| ShapeElement {
                        outline,
                        layer: trace_layer,
                    }),
            );
            debug!(regions = layout.trace_regions.len(), "etch-inverted conductor");
        } else {
            layout.traces.push(PathElement {
                points,
                widths,
                layer: trace_layer,
            });
            for line in [inner_line, outer_line] {
                layout.io_lines.push(PathElement {
                    points: line.points,
                    widths: line.widths,
                    layer: trace_layer,
                });
            }
        }

        let report = BuildReport {
            conductor_length_um: total_length,
            low_impedance_sections: low_sections,
        };
        info!(
            chip = %config.name,
            length_um = report.conductor_length_um,
            low_sections = report.low_impedance_sections,
            "chip layout built"
        );
        Ok((layout, report))
    }

    /// Shape one label through the installed backend and place it. Missing
    /// shaper or a shaping failure skips the label; the build continues.
    fn place_label(&self, spec: &LabelSpec) -> Option<Vec<Polyline<f64>>> {
        let Some(shaper) = self.shaper else {
            warn!(text = %spec.text, "no text shaper installed; skipping label");
            return None;
        };
        let mut outlines = match shaper.shape(&spec.text, spec.size_um) {
            Ok(outlines) => outlines,
            Err(err) => {
                warn!(text = %spec.text, %err, "text shaping failed; skipping label");
                return None;
            }
        };
        if outlines.is_empty() {
            return None;
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        for pl in &outlines {
            if let Some(bb) = polyline_bbox(pl) {
                min_x = min_x.min(bb.min.x);
                max_x = max_x.max(bb.max.x);
            }
        }
        let width = (max_x - min_x).max(0.0);
        let justify_dx = match spec.justify {
            Justify::Left => 0.0,
            Justify::Center => -width / 2.0,
            Justify::Right => -width,
        };
        for pl in &mut outlines {
            translate_polyline(pl, spec.position_um[0] + justify_dx, spec.position_um[1]);
        }
        Some(outlines)
    }
}

/// Square alignment marks inset from all four chip corners.
fn fiducial_outlines(chip_size_um: [f64; 2], spec: &FiducialSpec) -> Vec<Polyline<f64>> {
    let cx = chip_size_um[0] / 2.0 - spec.inset_um;
    let cy = chip_size_um[1] / 2.0 - spec.inset_um;
    [(-cx, -cy), (cx, -cy), (cx, cy), (-cx, cy)]
        .into_iter()
        .map(|center| rectangle(center, (spec.size_um, spec.size_um)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cavalier_contours::polyline::PlineSource;

    fn small_layout() -> ChipLayout {
        let mut layout = ChipLayout::new("unit");
        layout.traces.push(PathElement {
            points: vec![PathPoint::new(-10.0, 0.0), PathPoint::new(10.0, 0.0)],
            widths: vec![2.0, 2.0],
            layer: Layer(10),
        });
        layout.outlines.push(ShapeElement {
            outline: rectangle((0.0, 0.0), (100.0, 60.0)),
            layer: Layer(20),
        });
        let mut region = Region::from_rect((0.0, 0.0), (100.0, 60.0));
        region.subtract(&rectangle((0.0, 0.0), (10.0, 10.0)));
        layout.grounds.push(GroundPlane {
            region,
            layer: Layer(30),
        });
        layout
    }

    #[test]
    fn translate_zero_is_an_exact_no_op() {
        let mut layout = small_layout();
        let before = layout.clone();
        layout.translate(0.0, 0.0);

        assert_eq!(layout.traces[0].points, before.traces[0].points);
        for (a, b) in layout.outlines[0]
            .outline
            .vertex_data
            .iter()
            .zip(&before.outlines[0].outline.vertex_data)
        {
            assert_eq!(a.x, b.x);
            assert_eq!(a.y, b.y);
        }
    }

    #[test]
    fn rotate_then_unrotate_restores_every_element() {
        let mut layout = small_layout();
        let before = layout.clone();
        let pivot = PathPoint::new(7.0, -3.0);
        layout.rotate(0.6, pivot);
        layout.rotate(-0.6, pivot);

        for (a, b) in layout.traces[0]
            .points
            .iter()
            .zip(&before.traces[0].points)
        {
            assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-6);
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-6);
        }
        for (pl_a, pl_b) in layout.grounds[0]
            .region
            .pos
            .iter()
            .zip(&before.grounds[0].region.pos)
        {
            for (a, b) in pl_a.vertex_data.iter().zip(&pl_b.vertex_data) {
                assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-6);
                assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn rotation_preserves_ground_area() {
        let mut layout = small_layout();
        let before = layout.grounds[0].region.area();
        layout.rotate(1.1, PathPoint::new(0.0, 0.0));
        assert_abs_diff_eq!(layout.grounds[0].region.area(), before, epsilon = 1e-6);
    }

    #[test]
    fn artwork_is_cut_from_the_ground_plane() {
        let mut layout = small_layout();
        let before = layout.grounds[0].region.area();
        layout.insert_artwork(vec![rectangle((30.0, 20.0), (8.0, 4.0))], Layer(90));

        assert_eq!(layout.artwork.len(), 1);
        assert_abs_diff_eq!(
            layout.grounds[0].region.area(),
            before - 8.0 * 4.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn merge_keeps_both_sides_elements() {
        let mut a = small_layout();
        let b = small_layout();
        a.merge_from(b);
        assert_eq!(a.traces.len(), 2);
        assert_eq!(a.outlines.len(), 2);
        assert_eq!(a.grounds.len(), 2);
    }

    #[test]
    fn fiducials_sit_inset_from_all_four_corners() {
        let spec = FiducialSpec {
            size_um: 20.0,
            inset_um: 100.0,
        };
        let marks = fiducial_outlines([1000.0, 2000.0], &spec);
        assert_eq!(marks.len(), 4);
        for pl in &marks {
            assert_abs_diff_eq!(pl.area(), 400.0, epsilon = 1e-9);
        }
        let bb = polyline_bbox(&marks[2]).unwrap();
        assert_abs_diff_eq!(bb.center().x, 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bb.center().y, 900.0, epsilon = 1e-9);
    }
}
