mod backend;
pub mod backends;
pub mod labels;
mod loader;
pub mod nms;
mod result;

pub use backend::{Detector, ModelLibrary};
pub use backends::{SceneDetector, ScriptStep, ScriptedDetector, SyntheticLibrary};
pub use loader::{library_for, ModelLoader, ModelState};
pub use result::{BBox, Detection};

pub(crate) use result::to_percent;
