//! Chip-level layout assembly: runs the trace pipeline for one config,
//! owns the resulting layer-tagged elements, edits the ground plane, and
//! composes finished chips into reticles.

pub mod chip;
pub mod error;
pub mod ground;
pub mod reticle;

pub use chip::{BuildReport, ChipBuilder, ChipLayout, GroundPlane, PathElement, ShapeElement};
pub use error::ChipError;
pub use ground::GroundPlaneEditor;
pub use reticle::ReticleLayout;
