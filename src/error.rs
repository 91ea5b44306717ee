use thiserror::Error;

/// Errors surfaced by the detection controller.
///
/// Only `ModelLoad` is fatal to a session: the detector is never retried and start keeps
/// failing with `ModelUnavailable`. Camera errors leave the controller idle so start can
/// be retried. Detection errors are transient and never stop the loop.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error("failed to load detection model")]
    ModelLoad(#[source] anyhow::Error),

    #[error("model load was already attempted")]
    ModelAlreadyRequested,

    #[error("model is still loading")]
    NotReady,

    #[error("model failed to load; restart to retry")]
    ModelUnavailable,

    #[error("camera access denied or not available")]
    CameraAccess(#[source] anyhow::Error),

    #[error("detection failed")]
    Detection(#[source] anyhow::Error),
}

impl DemoError {
    /// True for errors after which the same command may succeed later.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DemoError::NotReady | DemoError::CameraAccess(_) | DemoError::Detection(_)
        )
    }
}
