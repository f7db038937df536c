use serde::{Deserialize, Serialize};

/// Opaque mask layer tag carried by every emitted element.
///
/// The number maps straight onto the persisted layout file's layer field;
/// spirogen attaches no stack-up meaning to it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Layer(pub u16);

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
