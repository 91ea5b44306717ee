use anyhow::{anyhow, Result};

use crate::detect::backend::{Detector, ModelLibrary};
use crate::detect::result::{BBox, Detection};
use crate::frame::VideoFrame;

/// One scripted inference outcome.
#[derive(Clone, Debug)]
pub enum ScriptStep {
    Detections(Vec<Detection>),
    Fail(String),
}

/// Detector that replays a fixed script, cycling when it runs out.
///
/// An empty script yields no detections.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDetector {
    steps: Vec<ScriptStep>,
    cursor: usize,
}

impl ScriptedDetector {
    pub fn from_steps(steps: Vec<ScriptStep>) -> Self {
        Self { steps, cursor: 0 }
    }

    pub fn new(frames: Vec<Vec<Detection>>) -> Self {
        Self::from_steps(frames.into_iter().map(ScriptStep::Detections).collect())
    }

    /// Return the same detections for every frame.
    pub fn repeating(detections: Vec<Detection>) -> Self {
        Self::new(vec![detections])
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _frame: &VideoFrame) -> Result<Vec<Detection>> {
        if self.steps.is_empty() {
            self.cursor += 1;
            return Ok(Vec::new());
        }
        let step = self.steps[self.cursor % self.steps.len()].clone();
        self.cursor += 1;
        match step {
            ScriptStep::Detections(detections) => Ok(detections),
            ScriptStep::Fail(reason) => Err(anyhow!(reason)),
        }
    }
}

/// Synthetic scene: a person walking across the frame, a cup and two bottles on a desk.
///
/// Geometry is derived from the frame size and sequence number so the overlay moves.
#[derive(Default)]
pub struct SceneDetector;

impl Detector for SceneDetector {
    fn name(&self) -> &'static str {
        "scene"
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>> {
        let w = frame.width as f32;
        let h = frame.height as f32;
        let period = 240u64;
        let phase = (frame.sequence % period) as f32 / period as f32;

        let person_w = w * 0.25;
        let person = BBox::new((w - person_w) * phase, h * 0.15, person_w, h * 0.8);
        let wobble = ((frame.sequence % 20) as f32) / 200.0;

        Ok(vec![
            Detection::new("person", 0.86 + wobble, person),
            Detection::new("cup", 0.71, BBox::new(w * 0.70, h * 0.62, w * 0.06, h * 0.12)),
            Detection::new(
                "bottle",
                0.64 + wobble,
                BBox::new(w * 0.80, h * 0.50, w * 0.05, h * 0.24),
            ),
            Detection::new("bottle", 0.58, BBox::new(w * 0.88, h * 0.52, w * 0.05, h * 0.22)),
        ])
    }
}

/// Model library for `stub://<scene>` model paths.
///
/// `stub://fail` refuses to load, `stub://empty` never detects anything, any other scene
/// name yields [`SceneDetector`].
pub struct SyntheticLibrary {
    scene: String,
}

impl SyntheticLibrary {
    pub fn new(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
        }
    }
}

impl ModelLibrary for SyntheticLibrary {
    fn describe(&self) -> String {
        format!("stub://{}", self.scene)
    }

    fn load(&self) -> Result<Box<dyn Detector>> {
        match self.scene.as_str() {
            "fail" => Err(anyhow!("synthetic model '{}' refused to load", self.scene)),
            "empty" => Ok(Box::new(ScriptedDetector::default())),
            _ => Ok(Box::new(SceneDetector)),
        }
    }
}
