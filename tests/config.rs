use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::NamedTempFile;

use live_detect::config::{FacingMode, LiveDetectConfig};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "LIVE_DETECT_CONFIG",
        "LIVE_DETECT_CAMERA",
        "LIVE_DETECT_MODEL",
        "LIVE_DETECT_REFRESH_HZ",
        "LIVE_DETECT_SNAPSHOT",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(suffix: &str, body: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    std::io::Write::write_all(&mut file, body.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_defaults_without_config() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = LiveDetectConfig::load().expect("load config");
    assert_eq!(cfg, LiveDetectConfig::default());
    assert_eq!(cfg.camera.device, "stub://webcam");
    assert_eq!(cfg.camera.facing, FacingMode::User);
    assert_eq!(cfg.model.path, "stub://coco-ssd");
    assert_eq!(cfg.display.snapshot_path, None);
}

#[test]
fn loads_toml_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".toml",
        r#"
        [camera]
        device = "/dev/video1"
        ideal_width = 640
        ideal_height = 480

        [model]
        path = "models/ssd_mobilenet_v2.onnx"
        max_detections = 10

        [display]
        refresh_hz = 30
        pause_when_hidden = true
        "#,
    );
    std::env::set_var("LIVE_DETECT_CONFIG", file.path());
    std::env::set_var("LIVE_DETECT_MODEL", "stub://desk");
    std::env::set_var("LIVE_DETECT_SNAPSHOT", "/tmp/live.jpg");

    let cfg = LiveDetectConfig::load().expect("load config");
    assert_eq!(cfg.camera.device, "/dev/video1");
    assert_eq!((cfg.camera.ideal_width, cfg.camera.ideal_height), (640, 480));
    assert_eq!(cfg.model.path, "stub://desk");
    assert_eq!(cfg.model.max_detections, 10);
    assert_eq!(cfg.model.min_score, 0.5);
    assert_eq!(cfg.display.refresh_hz, 30);
    assert!(cfg.display.pause_when_hidden);
    assert_eq!(cfg.display.snapshot_path, Some(PathBuf::from("/tmp/live.jpg")));

    clear_env();
}

#[test]
fn loads_json_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        ".json",
        r#"{
            "camera": { "device": "stub://lab", "facing": "environment" },
            "model": { "min_score": 0.4, "iou_threshold": 0.6 }
        }"#,
    );
    std::env::set_var("LIVE_DETECT_CONFIG", file.path());
    std::env::set_var("LIVE_DETECT_REFRESH_HZ", "24");

    let cfg = LiveDetectConfig::load().expect("load config");
    assert_eq!(cfg.camera.device, "stub://lab");
    assert_eq!(cfg.camera.facing, FacingMode::Environment);
    assert_eq!(cfg.model.min_score, 0.4);
    assert_eq!(cfg.model.iou_threshold, 0.6);
    assert_eq!(cfg.display.refresh_hz, 24);

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("LIVE_DETECT_REFRESH_HZ", "fast");
    assert!(LiveDetectConfig::load().is_err());

    std::env::set_var("LIVE_DETECT_REFRESH_HZ", "0");
    assert!(LiveDetectConfig::load().is_err());
    std::env::remove_var("LIVE_DETECT_REFRESH_HZ");

    let file = write_config(".toml", "[model]\nmin_score = 2.0\n");
    std::env::set_var("LIVE_DETECT_CONFIG", file.path());
    assert!(LiveDetectConfig::load().is_err());

    let file = write_config(".toml", "[camera\n");
    std::env::set_var("LIVE_DETECT_CONFIG", file.path());
    assert!(LiveDetectConfig::load().is_err());

    clear_env();
}
