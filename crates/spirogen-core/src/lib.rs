//! Basic geometric vocabulary shared by every spirogen stage.

pub mod layer;
pub mod point;
pub mod width;

pub use layer::Layer;
pub use point::{bounding_box, path_length, rotate_points, translate_points, BBox, PathPoint};
pub use width::WidthProfile;
