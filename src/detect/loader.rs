use anyhow::{Context, Result};

use crate::config::ModelSettings;
use crate::detect::backend::{Detector, ModelLibrary};
use crate::detect::backends::SyntheticLibrary;
use crate::error::DemoError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Ready,
    Failed,
}

/// Holds the session's single detector instance.
///
/// Loading is attempted at most once. A failed load is final for the session.
pub struct ModelLoader {
    state: ModelState,
    detector: Option<Box<dyn Detector>>,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self {
            state: ModelState::Unloaded,
            detector: None,
        }
    }

    /// A loader that already holds a ready detector.
    pub fn with_detector(detector: Box<dyn Detector>) -> Self {
        Self {
            state: ModelState::Ready,
            detector: Some(detector),
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ModelState::Ready
    }

    pub fn detector_mut(&mut self) -> Option<&mut (dyn Detector + 'static)> {
        self.detector.as_deref_mut()
    }

    pub fn load(&mut self, library: &dyn ModelLibrary) -> Result<(), DemoError> {
        if self.state != ModelState::Unloaded {
            return Err(DemoError::ModelAlreadyRequested);
        }

        log::info!("loading model {}", library.describe());
        let loaded = library.load().and_then(|mut detector| {
            detector.warm_up().context("model warm-up failed")?;
            Ok(detector)
        });

        match loaded {
            Ok(detector) => {
                log::info!("model loaded ({} backend)", detector.name());
                self.detector = Some(detector);
                self.state = ModelState::Ready;
                Ok(())
            }
            Err(err) => {
                log::error!("error loading model: {:#}", err);
                self.state = ModelState::Failed;
                Err(DemoError::ModelLoad(err))
            }
        }
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the model library for a configured model path.
///
/// `stub://<scene>` selects the synthetic library; anything else is an ONNX file and
/// needs the `backend-tract` feature.
pub fn library_for(settings: &ModelSettings) -> Result<Box<dyn ModelLibrary>> {
    if let Some(scene) = settings.path.strip_prefix("stub://") {
        return Ok(Box::new(SyntheticLibrary::new(scene)));
    }
    #[cfg(feature = "backend-tract")]
    {
        Ok(Box::new(crate::detect::backends::TractLibrary::new(
            settings.clone(),
        )))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow::anyhow!(
            "model {} requires the backend-tract feature",
            settings.path
        ))
    }
}
