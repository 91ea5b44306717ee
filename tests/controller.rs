use anyhow::Result;
use std::time::Duration;

use live_detect::camera::{CameraManager, StreamConstraints, SyntheticCamera};
use live_detect::config::{CameraSettings, DisplaySettings};
use live_detect::controller::{
    DetectionController, StepOutcome, StopHandle, ALERT_MODEL_NOT_READY, STATUS_CAMERA_ERROR,
    STATUS_DETECTING, STATUS_LOADING_MODEL, STATUS_MODEL_ERROR, STATUS_MODEL_READY,
    STATUS_STOPPED,
};
use live_detect::detect::{
    BBox, Detection, Detector, ModelLoader, ModelState, ScriptStep, ScriptedDetector,
    SyntheticLibrary,
};
use live_detect::render::{OverlayCanvas, Surface};
use live_detect::schedule::ImmediateScheduler;
use live_detect::ui::{Controls, MemoryFrontend, StatusKind};
use live_detect::{DemoError, VideoFrame};

struct Harness {
    controller: DetectionController,
    camera: SyntheticCamera,
    frontend: MemoryFrontend,
}

fn controller_for(device: &str) -> Harness {
    let camera = SyntheticCamera::new();
    let frontend = MemoryFrontend::new();
    let settings = CameraSettings {
        device: device.to_string(),
        ideal_width: 64,
        ideal_height: 48,
        ..CameraSettings::default()
    };
    let manager = CameraManager::new(
        Box::new(camera.clone()),
        StreamConstraints::from_settings(&settings),
    );
    let controller = DetectionController::new(
        manager,
        OverlayCanvas::default(),
        Box::new(frontend.clone()),
    );
    Harness {
        controller,
        camera,
        frontend,
    }
}

fn with_detector(detector: impl Detector + 'static) -> Harness {
    let Harness {
        controller,
        camera,
        frontend,
    } = controller_for("stub://webcam");
    Harness {
        controller: controller.with_model(ModelLoader::with_detector(Box::new(detector))),
        camera,
        frontend,
    }
}

fn det(class: &str, score: f32, x: f32, y: f32) -> Detection {
    Detection::new(class, score, BBox::new(x, y, 12.0, 10.0))
}

/// Requests a stop from inside `detect`, the way Ctrl-C can land mid-inference.
struct StopsDuringInference {
    handle: StopHandle,
    after_calls: usize,
    calls: usize,
}

impl Detector for StopsDuringInference {
    fn name(&self) -> &'static str {
        "stops-during-inference"
    }

    fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<Detection>> {
        self.calls += 1;
        if self.calls >= self.after_calls {
            self.handle.request_stop();
        }
        Ok(vec![det("person", 0.9, 20.0, 30.0)])
    }
}

fn stopping_harness(after_calls: usize) -> Harness {
    let Harness {
        controller,
        camera,
        frontend,
    } = controller_for("stub://webcam");
    let detector = StopsDuringInference {
        handle: controller.stop_handle(),
        after_calls,
        calls: 0,
    };
    Harness {
        controller: controller.with_model(ModelLoader::with_detector(Box::new(detector))),
        camera,
        frontend,
    }
}

#[test]
fn model_load_reports_loading_then_ready() -> Result<()> {
    let mut h = controller_for("stub://webcam");
    h.controller.load_model(&SyntheticLibrary::new("desk"))?;

    let state = h.frontend.snapshot();
    assert_eq!(
        state.status_history,
        vec![STATUS_LOADING_MODEL.to_string(), STATUS_MODEL_READY.to_string()]
    );
    assert_eq!(state.status_kind, StatusKind::Ready);
    assert!(matches!(
        h.controller.load_model(&SyntheticLibrary::new("desk")),
        Err(DemoError::ModelAlreadyRequested)
    ));
    Ok(())
}

#[test]
fn failed_model_load_never_reaches_running() {
    let mut h = controller_for("stub://webcam");
    let err = h
        .controller
        .load_model(&SyntheticLibrary::new("fail"))
        .unwrap_err();
    assert!(matches!(err, DemoError::ModelLoad(_)));
    assert_eq!(h.controller.model_state(), ModelState::Failed);
    assert_eq!(h.frontend.snapshot().status, STATUS_MODEL_ERROR);

    for _ in 0..3 {
        let err = h.controller.on_start().unwrap_err();
        assert!(matches!(err, DemoError::ModelUnavailable));
        assert!(!h.controller.is_detecting());
    }
    assert_eq!(h.camera.grants(), 0);
    assert_eq!(h.frontend.snapshot().status_kind, StatusKind::Error);
}

#[test]
fn start_before_model_is_ready_alerts() {
    let mut h = controller_for("stub://webcam");
    let err = h.controller.on_start().unwrap_err();
    assert!(matches!(err, DemoError::NotReady));
    assert_eq!(h.frontend.snapshot().alerts, vec![ALERT_MODEL_NOT_READY]);
    assert!(!h.controller.camera_active());
}

#[test]
fn start_sizes_overlay_and_enables_stop() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::default());
    h.controller.on_start()?;

    assert!(h.controller.is_detecting());
    assert_eq!(
        (h.controller.surface().width(), h.controller.surface().height()),
        (64, 48)
    );
    let state = h.frontend.snapshot();
    assert_eq!(state.status, STATUS_DETECTING);
    assert_eq!(state.controls, Controls::running());
    Ok(())
}

#[test]
fn starting_twice_keeps_one_stream() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::default());
    h.controller.on_start()?;
    h.controller.on_start()?;
    assert_eq!(h.camera.open_streams(), 1);
    assert_eq!(h.camera.grants(), 1);
    Ok(())
}

#[test]
fn denied_camera_leaves_controller_idle() {
    let Harness {
        controller,
        camera,
        frontend,
    } = controller_for("stub://denied");
    let mut controller =
        controller.with_model(ModelLoader::with_detector(Box::new(ScriptedDetector::default())));

    let err = controller.on_start().unwrap_err();
    assert!(matches!(err, DemoError::CameraAccess(_)));
    assert!(err.is_recoverable());
    assert!(!controller.is_detecting());
    assert_eq!(camera.open_streams(), 0);

    let state = frontend.snapshot();
    assert_eq!(state.status, STATUS_CAMERA_ERROR);
    assert_eq!(state.status_kind, StatusKind::Error);
    assert_eq!(state.controls, Controls::idle());
}

#[test]
fn zero_detections_show_empty_tally() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::default());
    h.controller.on_start()?;
    assert_eq!(h.controller.step(), StepOutcome::Rendered { objects: 0 });

    let state = h.frontend.snapshot();
    assert_eq!(state.object_count, "Objects: 0");
    assert!(state.tally.is_empty());
    assert!(h.controller.surface().is_blank());
    Ok(())
}

#[test]
fn same_class_detections_merge_in_tally() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::repeating(vec![
        det("cup", 0.7, 5.0, 35.0),
        det("cup", 0.9, 30.0, 35.0),
    ]));
    h.controller.on_start()?;
    assert_eq!(h.controller.step(), StepOutcome::Rendered { objects: 2 });

    let state = h.frontend.snapshot();
    assert_eq!(state.object_count, "Objects: 2");
    assert_eq!(state.tally.len(), 1);
    assert_eq!(state.tally[0].class, "cup");
    assert_eq!(state.tally[0].count, 2);
    assert_eq!(state.tally[0].summary(), "Count: 2 | 90%");
    assert!(!h.controller.surface().is_blank());
    Ok(())
}

#[test]
fn stop_before_start_only_resets_ui() {
    let mut h = with_detector(ScriptedDetector::default());
    h.controller.on_stop();
    h.controller.on_stop();

    assert_eq!(h.camera.grants(), 0);
    assert!(!h.controller.camera_active());
    let state = h.frontend.snapshot();
    assert_eq!(state.status, STATUS_STOPPED);
    assert_eq!(state.controls, Controls::idle());
}

#[test]
fn stop_clears_overlay_and_resets_counters() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::repeating(vec![det(
        "dog", 0.8, 10.0, 35.0,
    )]));
    h.controller.on_start()?;
    h.controller.step();
    assert!(!h.controller.surface().is_blank());

    h.controller.on_stop();
    assert!(h.controller.surface().is_blank());
    assert!(!h.controller.is_detecting());
    assert_eq!(h.camera.open_streams(), 0);

    let state = h.frontend.snapshot();
    assert_eq!(state.status, STATUS_STOPPED);
    assert_eq!(state.status_kind, StatusKind::Neutral);
    assert_eq!(state.object_count, "Objects: 0");
    assert_eq!(state.fps, "FPS: 0");
    assert!(state.tally.is_empty());
    assert_eq!(h.controller.step(), StepOutcome::Idle);
    Ok(())
}

#[test]
fn stop_during_inference_discards_frame() -> Result<()> {
    let mut h = stopping_harness(1);
    h.controller.on_start()?;

    assert_eq!(h.controller.step(), StepOutcome::Discarded);
    assert!(h.controller.surface().is_blank());
    let state = h.frontend.snapshot();
    assert_eq!(state.object_count, "Objects: 0");
    assert!(state.tally.is_empty());
    assert_eq!(h.controller.stats().frames_discarded, 1);
    Ok(())
}

#[test]
fn run_completes_stop_after_handle_request() -> Result<()> {
    let mut h = stopping_harness(3);
    h.controller.on_start()?;
    h.controller.run(&mut ImmediateScheduler)?;

    let stats = h.controller.stats();
    assert_eq!(stats.frames_rendered, 2);
    assert_eq!(stats.frames_discarded, 1);
    assert_eq!(h.camera.open_streams(), 0);
    assert!(h.controller.surface().is_blank());
    assert_eq!(h.frontend.snapshot().status, STATUS_STOPPED);
    Ok(())
}

#[test]
fn detection_errors_do_not_stop_the_loop() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::from_steps(vec![
        ScriptStep::Fail("backend hiccup".into()),
        ScriptStep::Detections(vec![det("person", 0.66, 4.0, 40.0)]),
    ]));
    h.controller.on_start()?;

    assert_eq!(h.controller.step(), StepOutcome::Failed);
    assert!(h.controller.is_detecting());
    assert_eq!(h.controller.step(), StepOutcome::Rendered { objects: 1 });
    assert_eq!(h.controller.stats().detection_errors, 1);
    Ok(())
}

#[test]
fn hidden_view_pauses_only_when_configured() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::default());
    h.controller.on_start()?;
    h.controller.on_visibility_change(true);
    assert_eq!(h.controller.step(), StepOutcome::Rendered { objects: 0 });

    let Harness {
        controller,
        frontend: _,
        camera: _,
    } = with_detector(ScriptedDetector::default());
    let mut controller = controller.with_display_settings(&DisplaySettings {
        pause_when_hidden: true,
        ..DisplaySettings::default()
    });
    controller.on_start()?;
    controller.stop_handle().set_hidden(true);
    assert_eq!(controller.step(), StepOutcome::Paused);
    controller.on_visibility_change(false);
    assert_eq!(controller.step(), StepOutcome::Rendered { objects: 0 });
    Ok(())
}

#[test]
fn dropping_controller_releases_camera() -> Result<()> {
    let mut h = with_detector(ScriptedDetector::default());
    h.controller.on_start()?;
    assert_eq!(h.camera.open_streams(), 1);
    drop(h.controller);
    assert_eq!(h.camera.open_streams(), 0);
    Ok(())
}

#[test]
fn fps_sample_writes_snapshot() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("latest.jpg");
    let Harness {
        controller,
        camera: _,
        frontend,
    } = with_detector(ScriptedDetector::repeating(vec![det(
        "cat", 0.75, 8.0, 32.0,
    )]));
    let mut controller = controller.with_display_settings(&DisplaySettings {
        snapshot_path: Some(path.clone()),
        ..DisplaySettings::default()
    });
    controller.on_start()?;

    controller.step();
    assert!(!path.exists());
    assert_eq!(frontend.snapshot().fps, "FPS: 0");

    std::thread::sleep(Duration::from_millis(1050));
    controller.step();
    assert!(path.exists());
    assert_ne!(frontend.snapshot().fps, "FPS: 0");
    Ok(())
}
