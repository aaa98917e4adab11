pub mod projector;
mod settings;

pub use projector::{project, ButtonFace};
pub use settings::{ButtonIdentity, ButtonSettings};
