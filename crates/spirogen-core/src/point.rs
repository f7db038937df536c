use serde::{Deserialize, Serialize};

/// A vertex of a conductor centerline, in micrometers.
///
/// Ordered sequences of path points form a polyline whose ordering is the
/// direction of conductor travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
}

impl PathPoint {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn distance_to(&self, other: &PathPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Shift this point by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.x += dx;
        self.y += dy;
        self
    }

    /// Rotate this point by `angle_rad` about `pivot`.
    pub fn rotate(&mut self, angle_rad: f64, pivot: PathPoint) -> &mut Self {
        let (s, c) = angle_rad.sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        self.x = pivot.x + dx * c - dy * s;
        self.y = pivot.y + dx * s + dy * c;
        self
    }
}

/// Axis-aligned bounding box over path points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min: PathPoint,
    pub max: PathPoint,
}

impl BBox {
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn center(&self) -> PathPoint {
        PathPoint::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Grow the box outward by `margin` on every side.
    #[must_use]
    pub fn inflate(&self, margin: f64) -> BBox {
        BBox {
            min: PathPoint::new(self.min.x - margin, self.min.y - margin),
            max: PathPoint::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

/// Sum of consecutive Euclidean point-to-point distances.
#[must_use]
pub fn path_length(points: &[PathPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| w[0].distance_to(&w[1]))
        .sum()
}

#[must_use]
pub fn bounding_box(points: &[PathPoint]) -> Option<BBox> {
    let first = points.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some(BBox { min, max })
}

pub fn translate_points(points: &mut [PathPoint], dx: f64, dy: f64) {
    for p in points {
        p.translate(dx, dy);
    }
}

pub fn rotate_points(points: &mut [PathPoint], angle_rad: f64, pivot: PathPoint) {
    for p in points {
        p.rotate(angle_rad, pivot);
    }
}
