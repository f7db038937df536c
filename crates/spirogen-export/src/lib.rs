//! Flattened-layout snapshot for the mask-emission collaborator, plus an
//! SVG preview writer.

pub mod error;
pub mod snapshot;
pub mod svg;

pub use error::ExportError;
pub use snapshot::{write_snapshot, LayoutSnapshot, SnapshotElement};
pub use svg::{svg_from_snapshot, write_svg};
