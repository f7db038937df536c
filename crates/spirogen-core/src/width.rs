use serde::{Deserialize, Serialize};

/// Target conductor width along a path.
///
/// `PerPoint` carries one width per path point; stepped-impedance traces
/// always use this form. `Constant` is the unstepped case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WidthProfile {
    Constant(f64),
    PerPoint(Vec<f64>),
}

impl WidthProfile {
    /// Width at a given point index.
    #[must_use]
    pub fn at(&self, index: usize) -> f64 {
        match self {
            WidthProfile::Constant(w) => *w,
            WidthProfile::PerPoint(ws) => ws[index],
        }
    }

    /// One width per point, for a path of `n` points.
    #[must_use]
    pub fn materialize(&self, n: usize) -> Vec<f64> {
        match self {
            WidthProfile::Constant(w) => vec![*w; n],
            WidthProfile::PerPoint(ws) => ws.clone(),
        }
    }
}
