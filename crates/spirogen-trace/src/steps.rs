use spirogen_config::StepSpec;
use spirogen_core::{path_length, PathPoint};
use tracing::debug;

use crate::error::TraceError;

/// Output of stepped-impedance insertion: the expanded point list with its
/// parallel width list, plus the totals reported to labels and logs.
#[derive(Debug, Clone)]
pub struct SteppedTrace {
    pub points: Vec<PathPoint>,
    pub widths: Vec<f64>,
    pub num_low_sections: usize,
    pub total_length_um: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Low,
    High,
}

impl Section {
    fn toggled(self) -> Self {
        match self {
            Section::Low => Section::High,
            Section::High => Section::Low,
        }
    }
}

/// Walks a path alternating fixed-length high- and low-impedance width
/// runs, splitting segments at the section boundaries.
pub struct ImpedanceStepInserter<'a> {
    spec: &'a StepSpec,
}

impl<'a> ImpedanceStepInserter<'a> {
    #[must_use]
    pub fn new(spec: &'a StepSpec) -> Self {
        Self { spec }
    }

    fn width(&self, section: Section) -> f64 {
        match section {
            Section::Low => self.spec.low.width_um,
            Section::High => self.spec.high.width_um,
        }
    }

    fn length(&self, section: Section) -> f64 {
        match section {
            Section::Low => self.spec.low.length_um,
            Section::High => self.spec.high.length_um,
        }
    }

    /// Subdivide `path` into alternating width runs, starting with the
    /// high-impedance section.
    ///
    /// Each boundary emits two points a perturbation apart along the
    /// segment direction, the first carrying the outgoing width and the
    /// second the incoming one, so transitions are sharp without creating
    /// zero-length duplicates. The walk stays on the current source segment
    /// until its length is exhausted, so one segment can absorb several
    /// boundaries.
    pub fn insert(&self, path: &[PathPoint]) -> Result<SteppedTrace, TraceError> {
        if path.len() < 2 {
            return Err(TraceError::DegeneratePath { points: path.len() });
        }

        let mut points: Vec<PathPoint> = Vec::with_capacity(path.len());
        let mut widths: Vec<f64> = Vec::with_capacity(path.len());

        let mut section = Section::High;
        let mut remaining = self.length(section);
        let mut num_low = 0usize;

        let mut cur = path[0];
        push_dedup(&mut points, &mut widths, cur, self.width(section));

        let mut idx = 0usize;
        while idx + 1 < path.len() {
            let next = path[idx + 1];
            let seg = cur.distance_to(&next);
            if seg < 1e-12 {
                idx += 1;
                continue;
            }

            if seg <= remaining {
                remaining -= seg;
                cur = next;
                push_dedup(&mut points, &mut widths, cur, self.width(section));
                idx += 1;
                continue;
            }

            // Section boundary inside this segment.
            let dir = ((next.x - cur.x) / seg, (next.y - cur.y) / seg);
            let cross = PathPoint::new(cur.x + dir.0 * remaining, cur.y + dir.1 * remaining);
            push_dedup(&mut points, &mut widths, cross, self.width(section));

            section = section.toggled();
            if section == Section::Low {
                num_low += 1;
            }

            // The perturbed twin stays on the current segment even when the
            // boundary lands within a perturbation of its end.
            let pert = self.spec.perturbation_um.min(seg - remaining);
            let twin = PathPoint::new(cross.x + dir.0 * pert, cross.y + dir.1 * pert);
            push_dedup(&mut points, &mut widths, twin, self.width(section));

            remaining = (self.length(section) - pert).max(0.0);
            cur = twin;
        }

        let total_length_um = path_length(&points);
        debug!(
            low_sections = num_low,
            total_length_um, "inserted impedance steps"
        );

        Ok(SteppedTrace {
            points,
            widths,
            num_low_sections: num_low,
            total_length_um,
        })
    }
}

fn push_dedup(points: &mut Vec<PathPoint>, widths: &mut Vec<f64>, p: PathPoint, w: f64) {
    if let Some(last) = points.last() {
        if last.distance_to(&p) < 1e-12 {
            return;
        }
    }
    points.push(p);
    widths.push(w);
}
