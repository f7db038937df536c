use indexmap::IndexMap;
use serde::Deserialize;
use spirogen_core::Layer;
use tracing::warn;

use crate::error::ConfigError;

/// Same-side IO lines closer than this are accepted with a warning.
pub const MIN_IO_LINE_SEPARATION_UM: f64 = 50.0;

/// One chip design, fully typed and validated once at load time.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChipConfig {
    pub name: String,
    pub chip_size_um: [f64; 2],
    pub chip_edge_buffer_um: f64,
    pub spiral_io_buffer_um: f64,
    pub spiral: SpiralSpec,
    pub reversal: ReversalSpec,
    pub tlin: TlinSpec,
    pub io: IoConfig,
    #[serde(default)]
    pub steps: Option<StepSpec>,
    #[serde(default)]
    pub fiducials: Option<FiducialSpec>,
    #[serde(default)]
    pub ground: Option<GroundSpec>,
    #[serde(default)]
    pub labels: Vec<LabelSpec>,
    #[serde(default)]
    pub is_etch: bool,
    pub layers: LayerMap,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpiralSpec {
    /// Total windings over both arms; must be even so the arms pair up.
    pub num_rotations: u32,
    /// Pitch between adjacent conductors of the interleaved arms.
    pub spacing_um: f64,
    /// Angular samples over the whole spiral.
    pub num_points: usize,
    /// Vertical seam extension at both path ends.
    pub tail_length_um: f64,
    #[serde(default)]
    pub horiz_stretch_um: f64,
    #[serde(default)]
    pub vert_stretch_um: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReversalSpec {
    pub mode: ReversalMode,
    pub diameter_um: f64,
    pub num_points: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReversalMode {
    Circle,
    CircleSmooth,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlinSpec {
    pub center_width_um: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoConfig {
    #[serde(default)]
    pub mode: IoMode,
    pub inner: IoSpec,
    pub outer: IoSpec,
    pub pad: PadSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoMode {
    #[default]
    SameSide,
    OppositeSide,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IoSpec {
    /// Bond pad center, absolute chip x.
    pub x_pad_offset_um: f64,
    /// Height of the horizontal run above this conductor's chip edge.
    pub y_line_offset_um: f64,
    pub curve_radius_um: f64,
    #[serde(default = "default_bend_points")]
    pub bend_points: usize,
    pub taper: TaperSpec,
}

fn default_bend_points() -> usize {
    40
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaperSpec {
    /// Taper law name; unknown names fall back to the nominal width at
    /// build time with a warning rather than failing here.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub length_um: f64,
    pub segment_length_um: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PadSpec {
    pub width_um: f64,
    pub height_um: f64,
    /// Gap between the chip edge and the pad's outer edge.
    pub edge_gap_um: f64,
    #[serde(default)]
    pub etch_margin_um: Option<f64>,
    pub faux_cpw_taper: CpwTaperSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CpwTaperSpec {
    pub cpw_widths_um: Vec<f64>,
    pub cpw_lengths_um: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    pub low: StepRun,
    pub high: StepRun,
    #[serde(default = "default_perturbation")]
    pub perturbation_um: f64,
}

fn default_perturbation() -> f64 {
    0.01
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepRun {
    pub width_um: f64,
    pub length_um: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FiducialSpec {
    pub size_um: f64,
    pub inset_um: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroundSpec {
    /// Clearance around each pad stack kept free of ground metal.
    pub pad_gap_um: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelSpec {
    pub text: String,
    pub position_um: [f64; 2],
    pub size_um: f64,
    #[serde(default)]
    pub justify: Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Justify {
    #[default]
    Left,
    Center,
    Right,
}

/// Role name to mask layer number, in file order.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct LayerMap(pub IndexMap<String, u16>);

impl LayerMap {
    #[must_use]
    pub fn get(&self, role: &str) -> Option<Layer> {
        self.0.get(role).copied().map(Layer)
    }

    pub fn require(&self, role: &str) -> Result<Layer, ConfigError> {
        self.get(role).ok_or_else(|| ConfigError::MissingLayer {
            role: role.to_string(),
        })
    }
}

impl ChipConfig {
    /// Cross-field validation; runs once right after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("chip_size_um[0]", self.chip_size_um[0])?;
        positive("chip_size_um[1]", self.chip_size_um[1])?;
        non_negative("chip_edge_buffer_um", self.chip_edge_buffer_um)?;
        non_negative("spiral_io_buffer_um", self.spiral_io_buffer_um)?;

        let s = &self.spiral;
        if s.num_rotations < 2 || s.num_rotations % 2 != 0 {
            return Err(ConfigError::RotationCount {
                value: s.num_rotations,
            });
        }
        positive("spiral.spacing_um", s.spacing_um)?;
        if s.num_points < 8 {
            return Err(ConfigError::TooFewSamples {
                field: "spiral.num_points".into(),
                min: 8,
                value: s.num_points,
            });
        }
        non_negative("spiral.tail_length_um", s.tail_length_um)?;
        non_negative("spiral.horiz_stretch_um", s.horiz_stretch_um)?;
        non_negative("spiral.vert_stretch_um", s.vert_stretch_um)?;

        positive("reversal.diameter_um", self.reversal.diameter_um)?;
        if self.reversal.num_points < 4 {
            return Err(ConfigError::TooFewSamples {
                field: "reversal.num_points".into(),
                min: 4,
                value: self.reversal.num_points,
            });
        }

        positive("tlin.center_width_um", self.tlin.center_width_um)?;

        validate_io_side("io.inner", &self.io.inner)?;
        validate_io_side("io.outer", &self.io.outer)?;
        if self.io.mode == IoMode::SameSide {
            let outer = self.io.outer.y_line_offset_um;
            let inner = self.io.inner.y_line_offset_um;
            if outer >= inner {
                return Err(ConfigError::IoLineOrder { outer, inner });
            }
            if inner - outer < MIN_IO_LINE_SEPARATION_UM {
                warn!(
                    outer_um = outer,
                    inner_um = inner,
                    "same-side IO lines are within {MIN_IO_LINE_SEPARATION_UM} um of each other"
                );
            }
        }

        let pad = &self.io.pad;
        positive("io.pad.width_um", pad.width_um)?;
        positive("io.pad.height_um", pad.height_um)?;
        non_negative("io.pad.edge_gap_um", pad.edge_gap_um)?;
        if let Some(margin) = pad.etch_margin_um {
            non_negative("io.pad.etch_margin_um", margin)?;
        }
        let cpw = &pad.faux_cpw_taper;
        if cpw.cpw_widths_um.len() != cpw.cpw_lengths_um.len() {
            return Err(ConfigError::CpwListMismatch {
                widths: cpw.cpw_widths_um.len(),
                lengths: cpw.cpw_lengths_um.len(),
            });
        }
        for &w in &cpw.cpw_widths_um {
            positive("io.pad.faux_cpw_taper.cpw_widths_um", w)?;
        }
        for &l in &cpw.cpw_lengths_um {
            positive("io.pad.faux_cpw_taper.cpw_lengths_um", l)?;
        }

        if let Some(steps) = &self.steps {
            positive("steps.low.width_um", steps.low.width_um)?;
            positive("steps.low.length_um", steps.low.length_um)?;
            positive("steps.high.width_um", steps.high.width_um)?;
            positive("steps.high.length_um", steps.high.length_um)?;
            let shortest = steps.low.length_um.min(steps.high.length_um);
            if steps.perturbation_um <= 0.0 || steps.perturbation_um >= shortest {
                return Err(ConfigError::StepPerturbation {
                    perturbation: steps.perturbation_um,
                    shortest,
                });
            }
        }

        if let Some(fid) = &self.fiducials {
            positive("fiducials.size_um", fid.size_um)?;
            non_negative("fiducials.inset_um", fid.inset_um)?;
        }
        if let Some(ground) = &self.ground {
            positive("ground.pad_gap_um", ground.pad_gap_um)?;
        }
        for label in &self.labels {
            positive("labels[].size_um", label.size_um)?;
        }

        self.layers.require("trace")?;
        self.layers.require("outline")?;
        self.layers.require("pads")?;
        if self.ground.is_some() {
            self.layers.require("ground")?;
        }
        if self.fiducials.is_some() {
            self.layers.require("marks")?;
        }
        if !self.labels.is_empty() {
            self.layers.require("labels")?;
        }
        if pad.etch_margin_um.is_some() {
            self.layers.require("pad_etch")?;
        }

        Ok(())
    }
}

fn validate_io_side(prefix: &str, io: &IoSpec) -> Result<(), ConfigError> {
    positive(format!("{prefix}.y_line_offset_um"), io.y_line_offset_um)?;
    positive(format!("{prefix}.curve_radius_um"), io.curve_radius_um)?;
    if io.bend_points < 2 {
        return Err(ConfigError::TooFewSamples {
            field: format!("{prefix}.bend_points"),
            min: 2,
            value: io.bend_points,
        });
    }
    positive(
        format!("{prefix}.taper.segment_length_um"),
        io.taper.segment_length_um,
    )?;
    non_negative(format!("{prefix}.taper.length_um"), io.taper.length_um)?;
    Ok(())
}

fn positive(field: impl Into<String>, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive {
            field: field.into(),
            value,
        })
    }
}

fn non_negative(field: impl Into<String>, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            field: field.into(),
            value,
        })
    }
}
