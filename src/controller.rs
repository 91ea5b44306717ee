//! Start/stop handling and the per-frame detection loop.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::camera::CameraManager;
use crate::config::DisplaySettings;
use crate::detect::{ModelLibrary, ModelLoader, ModelState};
use crate::error::DemoError;
use crate::fps::FpsMeter;
use crate::frame::VideoFrame;
use crate::render::{draw_detections, write_snapshot, OverlayCanvas, Surface};
use crate::schedule::FrameScheduler;
use crate::tally::ObjectTally;
use crate::ui::{format_fps, format_object_count, Controls, Frontend, StatusKind};

pub const STATUS_LOADING_MODEL: &str = "Loading AI model...";
pub const STATUS_MODEL_READY: &str = "Model loaded! Start the camera to begin";
pub const STATUS_MODEL_ERROR: &str = "Error loading model. Restart to retry.";
pub const STATUS_STARTING_CAMERA: &str = "Starting camera...";
pub const STATUS_DETECTING: &str = "Detecting objects...";
pub const STATUS_CAMERA_ERROR: &str = "Camera access denied or not available";
pub const STATUS_STOPPED: &str = "Camera stopped. Start the camera to resume";
pub const ALERT_MODEL_NOT_READY: &str = "Model is still loading. Please wait...";

/// Stops a running loop from another thread or a signal handler.
#[derive(Clone, Debug)]
pub struct StopHandle {
    detecting: Arc<AtomicBool>,
    hidden: Arc<AtomicBool>,
}

impl StopHandle {
    /// Clear the detecting flag. The loop exits before its next step, and a frame still
    /// in inference is discarded.
    pub fn request_stop(&self) {
        if self.detecting.swap(false, Ordering::SeqCst) {
            log::info!("stop requested");
        }
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting.load(Ordering::SeqCst)
    }

    /// Report whether the view is hidden.
    pub fn set_hidden(&self, hidden: bool) {
        set_visibility(&self.hidden, hidden, self.is_detecting());
    }
}

fn set_visibility(flag: &AtomicBool, hidden: bool, detecting: bool) {
    let was_hidden = flag.swap(hidden, Ordering::SeqCst);
    if hidden && !was_hidden && detecting {
        log::info!("view hidden; detection continues");
    } else if !hidden && was_hidden {
        log::info!("view visible");
    }
}

/// What one loop iteration did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Detection is not running.
    Idle,
    /// Skipped because the view is hidden and pausing is enabled.
    Paused,
    /// Stopped during inference; nothing was drawn.
    Discarded,
    /// Frame grab or inference failed.
    Failed,
    Rendered { objects: usize },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames_rendered: u64,
    pub frames_discarded: u64,
    pub detection_errors: u64,
}

/// Owns the session: model, camera, overlay and frontend.
pub struct DetectionController<S: Surface = OverlayCanvas> {
    model: ModelLoader,
    camera: CameraManager,
    surface: S,
    frontend: Box<dyn Frontend>,
    fps: FpsMeter,
    detecting: Arc<AtomicBool>,
    hidden: Arc<AtomicBool>,
    pause_when_hidden: bool,
    snapshot_path: Option<PathBuf>,
    stats: LoopStats,
}

impl<S: Surface> DetectionController<S> {
    pub fn new(camera: CameraManager, surface: S, frontend: Box<dyn Frontend>) -> Self {
        Self {
            model: ModelLoader::new(),
            camera,
            surface,
            frontend,
            fps: FpsMeter::new(Instant::now()),
            detecting: Arc::new(AtomicBool::new(false)),
            hidden: Arc::new(AtomicBool::new(false)),
            pause_when_hidden: false,
            snapshot_path: None,
            stats: LoopStats::default(),
        }
    }

    /// Use an already prepared model loader.
    pub fn with_model(mut self, model: ModelLoader) -> Self {
        self.model = model;
        self
    }

    pub fn with_display_settings(mut self, display: &DisplaySettings) -> Self {
        self.pause_when_hidden = display.pause_when_hidden;
        self.snapshot_path = display.snapshot_path.clone();
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            detecting: Arc::clone(&self.detecting),
            hidden: Arc::clone(&self.hidden),
        }
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting.load(Ordering::SeqCst)
    }

    pub fn model_state(&self) -> ModelState {
        self.model.state()
    }

    pub fn camera_active(&self) -> bool {
        self.camera.is_active()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Load the detector once and report the outcome on the status line.
    pub fn load_model(&mut self, library: &dyn ModelLibrary) -> Result<(), DemoError> {
        if self.model.state() != ModelState::Unloaded {
            return Err(DemoError::ModelAlreadyRequested);
        }
        self.frontend
            .set_status(STATUS_LOADING_MODEL, StatusKind::Loading);
        match self.model.load(library) {
            Ok(()) => {
                self.frontend.set_status(STATUS_MODEL_READY, StatusKind::Ready);
                Ok(())
            }
            Err(err) => {
                self.frontend.set_status(STATUS_MODEL_ERROR, StatusKind::Error);
                Err(err)
            }
        }
    }

    /// Acquire the camera and begin detecting.
    ///
    /// Starting while already running does nothing.
    pub fn on_start(&mut self) -> Result<(), DemoError> {
        match self.model.state() {
            ModelState::Ready => {}
            state => {
                self.frontend.alert(ALERT_MODEL_NOT_READY);
                return Err(if state == ModelState::Failed {
                    DemoError::ModelUnavailable
                } else {
                    DemoError::NotReady
                });
            }
        }
        if self.is_detecting() {
            log::debug!("start ignored: detection already running");
            return Ok(());
        }

        self.frontend
            .set_status(STATUS_STARTING_CAMERA, StatusKind::Loading);
        let dimensions = match self.camera.start() {
            Ok(dimensions) => dimensions,
            Err(err) => {
                self.frontend
                    .set_status(STATUS_CAMERA_ERROR, StatusKind::Error);
                return Err(err);
            }
        };

        self.surface.resize(dimensions.width, dimensions.height);
        self.frontend.set_controls(Controls::running());
        self.frontend.set_status(STATUS_DETECTING, StatusKind::Ready);
        self.fps.reset(Instant::now());
        self.detecting.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Halt detection, release the camera and reset the UI. Safe before any start.
    pub fn on_stop(&mut self) {
        self.detecting.store(false, Ordering::SeqCst);
        self.camera.stop();
        self.surface.clear();

        self.frontend.set_controls(Controls::idle());
        self.frontend.set_status(STATUS_STOPPED, StatusKind::Neutral);
        self.frontend.set_tally(&ObjectTally::default());
        self.frontend.set_object_count(&format_object_count(0));
        self.frontend.set_fps(&format_fps(0));
        self.fps.reset(Instant::now());
    }

    pub fn on_visibility_change(&mut self, hidden: bool) {
        set_visibility(&self.hidden, hidden, self.is_detecting());
    }

    /// Run one iteration of the detection loop.
    pub fn step(&mut self) -> StepOutcome {
        if !self.is_detecting() {
            return StepOutcome::Idle;
        }
        if self.pause_when_hidden && self.hidden.load(Ordering::SeqCst) {
            return StepOutcome::Paused;
        }

        let frame = match self.camera.current_frame() {
            Ok(frame) => frame,
            Err(err) => return self.record_failure(err.context("grab camera frame")),
        };
        let result = match self.model.detector_mut() {
            Some(detector) => detector.detect(&frame),
            None => Err(anyhow!("no detector loaded")),
        };
        let detections = match result {
            Ok(detections) => detections,
            Err(err) => return self.record_failure(err),
        };

        if !self.is_detecting() {
            log::debug!("frame {} discarded: stopped during inference", frame.sequence);
            self.stats.frames_discarded += 1;
            return StepOutcome::Discarded;
        }

        self.surface.clear();
        draw_detections(&mut self.surface, &detections);
        self.frontend
            .set_tally(&ObjectTally::from_detections(&detections));
        self.frontend
            .set_object_count(&format_object_count(detections.len()));
        if let Some(fps) = self.fps.tick(Instant::now()) {
            self.frontend.set_fps(&format_fps(fps));
            self.save_snapshot(&frame);
        }

        self.stats.frames_rendered += 1;
        StepOutcome::Rendered {
            objects: detections.len(),
        }
    }

    /// Step once per scheduler slot until detection stops, then complete the stop.
    pub fn run(&mut self, scheduler: &mut dyn FrameScheduler) -> Result<()> {
        while self.is_detecting() {
            if let Err(err) = scheduler.wait_for_slot() {
                log::error!("frame scheduler failed: {:#}", err);
                self.on_stop();
                return Err(err);
            }
            self.step();
        }
        if self.camera.is_active() {
            self.on_stop();
        }
        log::info!(
            "detection stopped ({} frames rendered, {} discarded, {} errors)",
            self.stats.frames_rendered,
            self.stats.frames_discarded,
            self.stats.detection_errors
        );
        Ok(())
    }

    fn record_failure(&mut self, err: anyhow::Error) -> StepOutcome {
        log::error!("{:#}", anyhow::Error::from(DemoError::Detection(err)));
        self.stats.detection_errors += 1;
        StepOutcome::Failed
    }

    fn save_snapshot(&self, frame: &VideoFrame) {
        let (Some(path), Some(overlay)) = (&self.snapshot_path, self.surface.overlay_image())
        else {
            return;
        };
        if let Err(err) = write_snapshot(path, frame, overlay) {
            log::warn!("failed to write snapshot: {:#}", err);
        }
    }
}

impl<S: Surface> Drop for DetectionController<S> {
    fn drop(&mut self) {
        self.detecting.store(false, Ordering::SeqCst);
        self.camera.stop();
    }
}
