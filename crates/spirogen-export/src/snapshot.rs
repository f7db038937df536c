use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spirogen_chip::ChipLayout;
use spirogen_core::Layer;
use spirogen_geometry::Polyline;

use crate::error::ExportError;

/// Flattened, serializable view of a finished layout.
///
/// This is the handover format for the mask-emission collaborator: every
/// element carries its opaque layer number, paths keep their parallel width
/// lists, and shape vertices keep their bulge values so arcs stay exact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub name: String,
    pub elements: Vec<SnapshotElement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotElement {
    /// Conductor centerline with one target width per point.
    Path {
        layer: u16,
        points: Vec<[f64; 2]>,
        widths: Vec<f64>,
    },
    /// Closed outline; each vertex is `[x, y, bulge]`.
    Shape { layer: u16, vertices: Vec<[f64; 3]> },
}

impl LayoutSnapshot {
    /// Flatten a layout's element groups in emission order.
    #[must_use]
    pub fn from_layout(layout: &ChipLayout) -> Self {
        let mut elements: Vec<SnapshotElement> = Vec::new();

        for trace in layout.traces.iter().chain(&layout.io_lines) {
            elements.push(SnapshotElement::Path {
                layer: trace.layer.0,
                points: trace.points.iter().map(|p| [p.x, p.y]).collect(),
                widths: trace.widths.clone(),
            });
        }
        for shape in layout
            .trace_regions
            .iter()
            .chain(&layout.outlines)
            .chain(&layout.pads)
        {
            elements.push(shape_element(&shape.outline, shape.layer));
        }
        for ground in &layout.grounds {
            for pl in ground.region.pos.iter().chain(&ground.region.neg) {
                elements.push(shape_element(pl, ground.layer));
            }
        }
        for shape in layout
            .fiducials
            .iter()
            .chain(&layout.labels)
            .chain(&layout.artwork)
            .chain(&layout.etch_windows)
        {
            elements.push(shape_element(&shape.outline, shape.layer));
        }

        Self {
            name: layout.name.clone(),
            elements,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

fn shape_element(pl: &Polyline<f64>, layer: Layer) -> SnapshotElement {
    SnapshotElement::Shape {
        layer: layer.0,
        vertices: pl
            .vertex_data
            .iter()
            .map(|v| [v.x, v.y, v.bulge])
            .collect(),
    }
}

/// Write the snapshot as pretty-printed JSON.
pub fn write_snapshot(path: &Path, snapshot: &LayoutSnapshot) -> Result<(), ExportError> {
    if snapshot.is_empty() {
        return Err(ExportError::Empty {
            name: snapshot.name.clone(),
        });
    }
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), snapshot)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirogen_chip::{GroundPlane, PathElement, ShapeElement};
    use spirogen_core::PathPoint;
    use spirogen_geometry::primitives::{circle, rectangle};
    use spirogen_geometry::Region;

    fn layout() -> ChipLayout {
        let mut layout = ChipLayout::new("snap");
        layout.traces.push(PathElement {
            points: vec![PathPoint::new(0.0, 0.0), PathPoint::new(50.0, 0.0)],
            widths: vec![3.3, 3.3],
            layer: Layer(10),
        });
        layout.outlines.push(ShapeElement {
            outline: rectangle((0.0, 0.0), (200.0, 100.0)),
            layer: Layer(20),
        });
        layout.fiducials.push(ShapeElement {
            outline: circle((-80.0, 40.0), 5.0),
            layer: Layer(40),
        });
        let mut region = Region::from_rect((0.0, 0.0), (200.0, 100.0));
        region.subtract(&rectangle((0.0, 0.0), (20.0, 20.0)));
        layout.grounds.push(GroundPlane {
            region,
            layer: Layer(30),
        });
        layout
    }

    #[test]
    fn snapshot_flattens_every_element_group() {
        let snapshot = LayoutSnapshot::from_layout(&layout());
        // Trace, outline, fiducial, plus the ground outline and its hole.
        assert_eq!(snapshot.elements.len(), 5);

        let paths = snapshot
            .elements
            .iter()
            .filter(|e| matches!(e, SnapshotElement::Path { .. }))
            .count();
        assert_eq!(paths, 1);
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let snapshot = LayoutSnapshot::from_layout(&layout());
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: LayoutSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back.name, "snap");
        assert_eq!(back.elements.len(), snapshot.elements.len());
        match (&back.elements[0], &snapshot.elements[0]) {
            (
                SnapshotElement::Path { widths: a, .. },
                SnapshotElement::Path { widths: b, .. },
            ) => assert_eq!(a, b),
            other => panic!("expected path elements, got {other:?}"),
        }
    }

    #[test]
    fn arc_vertices_keep_their_bulge() {
        let snapshot = LayoutSnapshot::from_layout(&layout());
        let arcs = snapshot.elements.iter().any(|e| match e {
            SnapshotElement::Shape { vertices, .. } => {
                vertices.iter().any(|v| v[2] != 0.0)
            }
            SnapshotElement::Path { .. } => false,
        });
        assert!(arcs, "circle fiducial should carry bulge arcs");
    }

    #[test]
    fn empty_snapshot_is_rejected_at_write_time() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = LayoutSnapshot::from_layout(&ChipLayout::new("void"));
        let err = write_snapshot(&dir.path().join("void.json"), &snapshot);
        assert!(matches!(err, Err(ExportError::Empty { .. })));
    }

    #[test]
    fn written_snapshot_parses_back_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let snapshot = LayoutSnapshot::from_layout(&layout());
        write_snapshot(&path, &snapshot).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: LayoutSnapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.elements.len(), snapshot.elements.len());
    }
}
