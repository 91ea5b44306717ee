use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CAMERA_DEVICE: &str = "stub://webcam";
const DEFAULT_IDEAL_WIDTH: u32 = 1280;
const DEFAULT_IDEAL_HEIGHT: u32 = 720;
const DEFAULT_MODEL_PATH: &str = "stub://coco-ssd";
const DEFAULT_MODEL_INPUT: u32 = 300;
const DEFAULT_MIN_SCORE: f32 = 0.5;
const DEFAULT_MAX_DETECTIONS: usize = 20;
const DEFAULT_IOU_THRESHOLD: f32 = 0.5;
const DEFAULT_REFRESH_HZ: u32 = 60;

#[derive(Debug, Deserialize, Default)]
struct LiveDetectConfigFile {
    camera: Option<CameraConfigFile>,
    model: Option<ModelConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    ideal_width: Option<u32>,
    ideal_height: Option<u32>,
    facing: Option<FacingMode>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<String>,
    input_width: Option<u32>,
    input_height: Option<u32>,
    min_score: Option<f32>,
    max_detections: Option<usize>,
    iou_threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    refresh_hz: Option<u32>,
    pause_when_hidden: Option<bool>,
    snapshot_path: Option<PathBuf>,
}

/// Which way the requested camera should face.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    User,
    Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiveDetectConfig {
    pub camera: CameraSettings,
    pub model: ModelSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSettings {
    pub device: String,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub facing: FacingMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub path: String,
    pub input_width: u32,
    pub input_height: u32,
    pub min_score: f32,
    pub max_detections: usize,
    pub iou_threshold: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplaySettings {
    pub refresh_hz: u32,
    pub pause_when_hidden: bool,
    pub snapshot_path: Option<PathBuf>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device: DEFAULT_CAMERA_DEVICE.to_string(),
            ideal_width: DEFAULT_IDEAL_WIDTH,
            ideal_height: DEFAULT_IDEAL_HEIGHT,
            facing: FacingMode::User,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: DEFAULT_MODEL_PATH.to_string(),
            input_width: DEFAULT_MODEL_INPUT,
            input_height: DEFAULT_MODEL_INPUT,
            min_score: DEFAULT_MIN_SCORE,
            max_detections: DEFAULT_MAX_DETECTIONS,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            refresh_hz: DEFAULT_REFRESH_HZ,
            pause_when_hidden: false,
            snapshot_path: None,
        }
    }
}

impl Default for LiveDetectConfig {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            model: ModelSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

impl LiveDetectConfig {
    /// Load from `LIVE_DETECT_CONFIG` (if set), then apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("LIVE_DETECT_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: LiveDetectConfigFile) -> Self {
        let camera = file.camera.unwrap_or_default();
        let model = file.model.unwrap_or_default();
        let display = file.display.unwrap_or_default();
        Self {
            camera: CameraSettings {
                device: camera
                    .device
                    .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
                ideal_width: camera.ideal_width.unwrap_or(DEFAULT_IDEAL_WIDTH),
                ideal_height: camera.ideal_height.unwrap_or(DEFAULT_IDEAL_HEIGHT),
                facing: camera.facing.unwrap_or_default(),
            },
            model: ModelSettings {
                path: model
                    .path
                    .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
                input_width: model.input_width.unwrap_or(DEFAULT_MODEL_INPUT),
                input_height: model.input_height.unwrap_or(DEFAULT_MODEL_INPUT),
                min_score: model.min_score.unwrap_or(DEFAULT_MIN_SCORE),
                max_detections: model.max_detections.unwrap_or(DEFAULT_MAX_DETECTIONS),
                iou_threshold: model.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
            },
            display: DisplaySettings {
                refresh_hz: display.refresh_hz.unwrap_or(DEFAULT_REFRESH_HZ),
                pause_when_hidden: display.pause_when_hidden.unwrap_or(false),
                snapshot_path: display.snapshot_path,
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("LIVE_DETECT_CAMERA") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(path) = std::env::var("LIVE_DETECT_MODEL") {
            if !path.trim().is_empty() {
                self.model.path = path;
            }
        }
        if let Ok(hz) = std::env::var("LIVE_DETECT_REFRESH_HZ") {
            self.display.refresh_hz = hz
                .trim()
                .parse()
                .map_err(|_| anyhow!("LIVE_DETECT_REFRESH_HZ must be an integer rate in Hz"))?;
        }
        if let Ok(path) = std::env::var("LIVE_DETECT_SNAPSHOT") {
            if !path.trim().is_empty() {
                self.display.snapshot_path = Some(PathBuf::from(path));
            }
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.camera.device.trim().is_empty() {
            return Err(anyhow!("camera device must not be empty"));
        }
        if self.camera.ideal_width == 0 || self.camera.ideal_height == 0 {
            return Err(anyhow!("camera resolution must be greater than zero"));
        }
        if self.model.path.trim().is_empty() {
            return Err(anyhow!("model path must not be empty"));
        }
        if self.model.input_width == 0 || self.model.input_height == 0 {
            return Err(anyhow!("model input size must be greater than zero"));
        }
        if !(0.0..=1.0).contains(&self.model.min_score) {
            return Err(anyhow!("min_score must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.model.iou_threshold) {
            return Err(anyhow!("iou_threshold must be within 0..=1"));
        }
        if self.model.max_detections == 0 {
            return Err(anyhow!("max_detections must be at least 1"));
        }
        if self.display.refresh_hz == 0 {
            return Err(anyhow!("refresh_hz must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<LiveDetectConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let cfg = if is_json {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        toml::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}
