use std::f64::consts::PI;

use spirogen_config::{IoSpec, PadSpec};
use spirogen_core::{BBox, PathPoint};
use tracing::{debug, warn};

use crate::error::TraceError;

/// Gap between the paired points of a faux-CPW width step.
const CPW_STEP_GAP_UM: f64 = 0.01;

/// The bend/taper state machine walks from the top of the bond-pad taper to
/// the spiral tail in three legs, with a precomputed quarter-circle bend
/// emitted in one shot at each leg change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IoState {
    VerticalFromPad,
    Horizontal,
    VerticalToSpiral,
}

/// One conductor-side IO structure: the connecting line with its widths,
/// plus the bond pad it starts from.
#[derive(Debug, Clone)]
pub struct IoLine {
    pub points: Vec<PathPoint>,
    pub widths: Vec<f64>,
    pub pad_center: PathPoint,
    pub pad_size: (f64, f64),
    /// Recorded for ground-plane keep-outs and pad etch windows.
    pub pad_bbox: BBox,
}

pub struct IoTaperBuilder<'a> {
    io: &'a IoSpec,
    pad: &'a PadSpec,
    chip_height_um: f64,
    nominal_width_um: f64,
    /// Mirror every vertical convention for conductors exiting the top edge.
    use_alt_side: bool,
    warned_unknown_taper: bool,
}

impl<'a> IoTaperBuilder<'a> {
    #[must_use]
    pub fn new(
        io: &'a IoSpec,
        pad: &'a PadSpec,
        chip_height_um: f64,
        nominal_width_um: f64,
        use_alt_side: bool,
    ) -> Self {
        Self {
            io,
            pad,
            chip_height_um,
            nominal_width_um,
            use_alt_side,
            warned_unknown_taper: false,
        }
    }

    /// Build the pad, the faux-CPW taper above it, and the bend/taper line
    /// to `target` (the spiral tail point), landing on it exactly.
    pub fn build(&mut self, target: PathPoint) -> Result<IoLine, TraceError> {
        if self.io.curve_radius_um > self.io.y_line_offset_um {
            return Err(TraceError::BendRadius {
                radius_um: self.io.curve_radius_um,
                offset_um: self.io.y_line_offset_um,
            });
        }

        // All vertical conventions hang off this sign.
        let s = if self.use_alt_side { -1.0 } else { 1.0 };
        let edge_y = -s * self.chip_height_um / 2.0;

        let pad_base_y = edge_y + s * self.pad.edge_gap_um;
        let pad_center = PathPoint::new(
            self.io.x_pad_offset_um,
            pad_base_y + s * self.pad.height_um / 2.0,
        );
        let pad_bbox = BBox {
            min: PathPoint::new(
                pad_center.x - self.pad.width_um / 2.0,
                pad_center.y - self.pad.height_um / 2.0,
            ),
            max: PathPoint::new(
                pad_center.x + self.pad.width_um / 2.0,
                pad_center.y + self.pad.height_um / 2.0,
            ),
        };

        let mut points: Vec<PathPoint> = Vec::new();
        let mut widths: Vec<f64> = Vec::new();

        // Faux-CPW taper: stepped constant-width segments stacked on the
        // pad mouth.
        let x0 = self.io.x_pad_offset_um;
        let mut y = pad_base_y + s * self.pad.height_um;
        let cpw = &self.pad.faux_cpw_taper;
        let mut exit_width = self.pad.width_um;
        for (i, (&w, &l)) in cpw
            .cpw_widths_um
            .iter()
            .zip(&cpw.cpw_lengths_um)
            .enumerate()
        {
            if i == 0 {
                points.push(PathPoint::new(x0, y));
                widths.push(w);
            } else {
                points.push(PathPoint::new(x0, y + s * CPW_STEP_GAP_UM));
                widths.push(w);
            }
            y += s * l;
            points.push(PathPoint::new(x0, y));
            widths.push(w);
            exit_width = w;
        }
        if points.is_empty() {
            points.push(PathPoint::new(x0, y));
            widths.push(exit_width);
        }

        let y_line = edge_y + s * self.io.y_line_offset_um;
        let radius = self.io.curve_radius_um;
        let seg = self.io.taper.segment_length_um;
        let dir_x = if target.x >= x0 { 1.0 } else { -1.0 };
        let bend1_trigger_y = y_line - s * radius;
        let bend2_trigger_x = target.x - dir_x * radius;

        if s * (bend1_trigger_y - y) < 0.0 {
            warn!(
                pad_stack_top_um = y,
                trigger_um = bend1_trigger_y,
                "pad taper stack reaches past the first bend trigger"
            );
        }

        let mut z = 0.0;
        let mut x = x0;
        let mut state = IoState::VerticalFromPad;
        loop {
            match state {
                IoState::VerticalFromPad => {
                    let ny = y + s * seg;
                    if s * ny < s * bend1_trigger_y {
                        y = ny;
                        z += seg;
                        let w = self.taper_width(z, exit_width);
                        points.push(PathPoint::new(x, y));
                        widths.push(w);
                    } else {
                        // Pad-side quarter bend, emitted in one shot.
                        let center = PathPoint::new(x0 + dir_x * radius, bend1_trigger_y);
                        let phi0 = if dir_x > 0.0 { PI } else { 0.0 };
                        let phi1 = s * PI / 2.0;
                        self.emit_bend(
                            center, radius, phi0, phi1, exit_width, &mut z, &mut points,
                            &mut widths,
                        );
                        x = x0 + dir_x * radius;
                        y = y_line;
                        state = IoState::Horizontal;
                    }
                }
                IoState::Horizontal => {
                    let nx = x + dir_x * seg;
                    if dir_x * nx < dir_x * bend2_trigger_x {
                        x = nx;
                        z += seg;
                        let w = self.taper_width(z, exit_width);
                        points.push(PathPoint::new(x, y_line));
                        widths.push(w);
                    } else {
                        // Spiral-side quarter bend.
                        let center = PathPoint::new(bend2_trigger_x, y_line + s * radius);
                        let phi0 = -s * PI / 2.0;
                        let phi1 = if dir_x > 0.0 { 0.0 } else { PI };
                        self.emit_bend(
                            center, radius, phi0, phi1, exit_width, &mut z, &mut points,
                            &mut widths,
                        );
                        x = target.x;
                        y = y_line + s * radius;
                        state = IoState::VerticalToSpiral;
                    }
                }
                IoState::VerticalToSpiral => {
                    // Width is pinned to nominal for the final run.
                    if s * (target.y - y) > seg {
                        y += s * seg;
                        points.push(PathPoint::new(target.x, y));
                        widths.push(self.nominal_width_um);
                    } else {
                        // Snap exactly onto the spiral tail; no
                        // floating-point gap at the seam.
                        points.push(target);
                        widths.push(self.nominal_width_um);
                        break;
                    }
                }
            }
        }

        debug!(
            points = points.len(),
            alt_side = self.use_alt_side,
            "built IO taper line"
        );

        Ok(IoLine {
            points,
            widths,
            pad_center,
            pad_size: (self.pad.width_um, self.pad.height_um),
            pad_bbox,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_bend(
        &mut self,
        center: PathPoint,
        radius: f64,
        phi0: f64,
        phi1: f64,
        exit_width: f64,
        z: &mut f64,
        points: &mut Vec<PathPoint>,
        widths: &mut Vec<f64>,
    ) {
        let mut dphi = phi1 - phi0;
        while dphi > PI {
            dphi -= 2.0 * PI;
        }
        while dphi <= -PI {
            dphi += 2.0 * PI;
        }

        let n = self.io.bend_points.max(2);
        let mut prev = points.last().copied();
        for k in 0..=n {
            let phi = phi0 + dphi * k as f64 / n as f64;
            let p = PathPoint::new(center.x + radius * phi.cos(), center.y + radius * phi.sin());
            if let Some(q) = prev {
                *z += q.distance_to(&p);
            }
            let w = self.taper_width(*z, exit_width);
            points.push(p);
            widths.push(w);
            prev = Some(p);
        }
    }

    /// Taper law: width as a function of distance along this component.
    fn taper_width(&mut self, z: f64, exit_width: f64) -> f64 {
        match self.io.taper.kind.as_str() {
            "none" => self.nominal_width_um,
            "linear" => {
                let length = self.io.taper.length_um;
                if length <= 0.0 {
                    return self.nominal_width_um;
                }
                let t = (z / length).min(1.0);
                exit_width + (self.nominal_width_um - exit_width) * t
            }
            other => {
                if !self.warned_unknown_taper {
                    warn!(
                        taper_type = other,
                        "unrecognized taper type; falling back to nominal width"
                    );
                    self.warned_unknown_taper = true;
                }
                self.nominal_width_um
            }
        }
    }
}
