use std::path::Path;

use crate::error::ExportError;
use crate::snapshot::{LayoutSnapshot, SnapshotElement};

/// Intermediate samples per bulge arc in the preview.
const ARC_SAMPLES: usize = 16;

/// Render a quick-look SVG of the snapshot: shapes as closed outlines,
/// conductor paths as stroked centerlines. Arc segments are sampled; the
/// snapshot itself stays exact.
pub fn svg_from_snapshot(snapshot: &LayoutSnapshot) -> Result<String, ExportError> {
    if snapshot.is_empty() {
        return Err(ExportError::Empty {
            name: snapshot.name.clone(),
        });
    }

    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    let mut sampled: Vec<(Vec<(f64, f64)>, bool, f64)> = Vec::new();

    for element in &snapshot.elements {
        let (pts, closed, stroke) = match element {
            SnapshotElement::Path { points, widths, .. } => {
                let pts: Vec<(f64, f64)> = points.iter().map(|p| (p[0], p[1])).collect();
                let stroke = if widths.is_empty() {
                    1.0
                } else {
                    widths.iter().sum::<f64>() / widths.len() as f64
                };
                (pts, false, stroke)
            }
            SnapshotElement::Shape { vertices, .. } => {
                (sample_shape(vertices), true, 0.0)
            }
        };
        for &(x, y) in &pts {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        sampled.push((pts, closed, stroke));
    }

    let width = max_x - min_x;
    let height = max_y - min_y;

    let mut body = String::new();
    for (pts, closed, stroke) in &sampled {
        if pts.len() < 2 {
            continue;
        }
        let mut d = String::new();
        for (i, &(x, y)) in pts.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            d.push_str(&format!(
                "{cmd} {} {} ",
                fmt_num(x - min_x),
                fmt_num(max_y - y)
            ));
        }
        if *closed {
            d.push('Z');
            body.push_str(&format!("<path d=\"{}\"/>", d.trim_end()));
        } else {
            body.push_str(&format!(
                "<path d=\"{}\" stroke-width=\"{}\"/>",
                d.trim_end(),
                fmt_num(stroke.max(0.1))
            ));
        }
    }

    Ok(format!(
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" xmlns=\"http://www.w3.org/2000/svg\"><g stroke=\"#000\" stroke-width=\"1\" fill=\"none\" stroke-linecap=\"round\">{body}</g></svg>",
        w = fmt_num(width),
        h = fmt_num(height),
    ))
}

pub fn write_svg(path: &Path, snapshot: &LayoutSnapshot) -> Result<(), ExportError> {
    let svg = svg_from_snapshot(snapshot)?;
    std::fs::write(path, svg).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Expand a closed vertex loop into straight samples, splitting each bulge
/// arc into `ARC_SAMPLES` chords.
fn sample_shape(vertices: &[[f64; 3]]) -> Vec<(f64, f64)> {
    let n = vertices.len();
    let mut out: Vec<(f64, f64)> = Vec::new();
    for i in 0..n {
        let v0 = vertices[i];
        let v1 = vertices[(i + 1) % n];
        out.push((v0[0], v0[1]));
        if v0[2].abs() > 1e-12 {
            sample_arc((v0[0], v0[1]), (v1[0], v1[1]), v0[2], &mut out);
        }
    }
    out
}

/// Intermediate points of the arc from `p0` to `p1` with the given bulge
/// (tangent of a quarter of the included angle, positive = counterclockwise).
fn sample_arc(p0: (f64, f64), p1: (f64, f64), bulge: f64, out: &mut Vec<(f64, f64)>) {
    let dx = p1.0 - p0.0;
    let dy = p1.1 - p0.1;
    let chord = (dx * dx + dy * dy).sqrt();
    if chord < 1e-12 {
        return;
    }

    let sweep = 4.0 * bulge.atan();
    let half = chord / 2.0;
    let sagitta = bulge * half;
    let radius = (half * half + sagitta * sagitta) / (2.0 * sagitta);

    // Center sits on the chord normal, offset so the sagitta comes out on
    // the bulge side.
    let mx = (p0.0 + p1.0) / 2.0;
    let my = (p0.1 + p1.1) / 2.0;
    let (nx, ny) = (-dy / chord, dx / chord);
    let cx = mx + nx * (radius - sagitta);
    let cy = my + ny * (radius - sagitta);

    let r = radius.abs();
    let a0 = (p0.1 - cy).atan2(p0.0 - cx);
    for k in 1..ARC_SAMPLES {
        let a = a0 + sweep * k as f64 / ARC_SAMPLES as f64;
        out.push((cx + r * a.cos(), cy + r * a.sin()));
    }
}

fn fmt_num(v: f64) -> String {
    let v = if v.abs() < 1e-9 { 0.0 } else { v };
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    s.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn snapshot() -> LayoutSnapshot {
        LayoutSnapshot {
            name: "svg".into(),
            elements: vec![
                SnapshotElement::Shape {
                    layer: 20,
                    vertices: vec![
                        [-50.0, -25.0, 0.0],
                        [50.0, -25.0, 0.0],
                        [50.0, 25.0, 0.0],
                        [-50.0, 25.0, 0.0],
                    ],
                },
                SnapshotElement::Path {
                    layer: 10,
                    points: vec![[-40.0, 0.0], [40.0, 0.0]],
                    widths: vec![2.0, 4.0],
                },
            ],
        }
    }

    #[test]
    fn svg_contains_one_path_per_element() {
        let svg = svg_from_snapshot(&snapshot()).unwrap();
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("viewBox=\"0 0 100 50\""));
        // Open centerlines carry their averaged conductor width.
        assert!(svg.contains("stroke-width=\"3\""));
    }

    #[test]
    fn empty_snapshot_is_an_error() {
        let empty = LayoutSnapshot {
            name: "void".into(),
            elements: vec![],
        };
        assert!(matches!(
            svg_from_snapshot(&empty),
            Err(ExportError::Empty { .. })
        ));
    }

    #[test]
    fn arc_sampling_stays_on_the_circle() {
        // Full circle of radius 10 as two semicircular bulge-1 segments.
        let mut out: Vec<(f64, f64)> = Vec::new();
        sample_arc((-10.0, 0.0), (10.0, 0.0), 1.0, &mut out);
        assert_eq!(out.len(), ARC_SAMPLES - 1);
        for (x, y) in out {
            assert_abs_diff_eq!((x * x + y * y).sqrt(), 10.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn negative_bulge_bends_the_other_way() {
        // Positive bulge sweeps counterclockwise, which for +x travel dips
        // below the chord.
        let mut pos: Vec<(f64, f64)> = Vec::new();
        let mut neg: Vec<(f64, f64)> = Vec::new();
        sample_arc((0.0, 0.0), (10.0, 0.0), 0.5, &mut pos);
        sample_arc((0.0, 0.0), (10.0, 0.0), -0.5, &mut neg);
        assert!(pos.iter().all(|&(_, y)| y < 0.0));
        assert!(neg.iter().all(|&(_, y)| y > 0.0));
    }
}
