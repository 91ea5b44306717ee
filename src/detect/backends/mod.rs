pub mod stub;

#[cfg(feature = "backend-tract")]
pub mod tract;

pub use stub::{SceneDetector, ScriptStep, ScriptedDetector, SyntheticLibrary};

#[cfg(feature = "backend-tract")]
pub use tract::{TractLibrary, TractSsdDetector};
