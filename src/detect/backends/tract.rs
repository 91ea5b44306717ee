#![cfg(feature = "backend-tract")]

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::config::ModelSettings;
use crate::detect::backend::{Detector, ModelLibrary};
use crate::detect::labels::coco_label;
use crate::detect::nms::suppress;
use crate::detect::result::{BBox, Detection};
use crate::frame::VideoFrame;

/// Output slots of an SSD detection head, resolved by tensor name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct SsdOutputs {
    boxes: usize,
    classes: usize,
    scores: usize,
    count: Option<usize>,
}

impl SsdOutputs {
    /// Match output names the way TF object-detection exports name them, falling back to
    /// the exporter's default order (boxes, classes, scores, num_detections).
    fn resolve(names: &[String]) -> Result<Self> {
        let find = |needle: &str| {
            names
                .iter()
                .position(|name| name.to_ascii_lowercase().contains(needle))
        };
        match (find("boxes"), find("classes"), find("scores")) {
            (Some(boxes), Some(classes), Some(scores)) => Ok(Self {
                boxes,
                classes,
                scores,
                count: find("num_detections"),
            }),
            _ if names.len() >= 3 => Ok(Self {
                boxes: 0,
                classes: 1,
                scores: 2,
                count: if names.len() >= 4 { Some(3) } else { None },
            }),
            _ => Err(anyhow!(
                "model outputs {:?} do not look like an SSD detection head",
                names
            )),
        }
    }
}

/// SSD-style ONNX detector run with tract.
///
/// The model takes a `1×H×W×3` u8 image and returns normalized
/// `[ymin, xmin, ymax, xmax]` boxes with COCO class ids and scores.
pub struct TractSsdDetector {
    plan: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
    outputs: SsdOutputs,
    settings: ModelSettings,
}

impl TractSsdDetector {
    pub fn load(settings: ModelSettings) -> Result<Self> {
        let path = PathBuf::from(&settings.path);
        let optimized = tract_onnx::onnx()
            .model_for_path(&path)
            .with_context(|| format!("failed to load ONNX model from {}", path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    u8::datum_type(),
                    tvec!(
                        1,
                        settings.input_height as usize,
                        settings.input_width as usize,
                        3
                    ),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?;

        let names = optimized
            .output_outlets()?
            .iter()
            .map(|outlet| {
                optimized
                    .outlet_label(*outlet)
                    .map(str::to_string)
                    .unwrap_or_else(|| optimized.node(outlet.node).name.clone())
            })
            .collect::<Vec<_>>();
        let outputs = SsdOutputs::resolve(&names)?;
        log::debug!("ssd outputs {:?} resolved as {:?}", names, outputs);

        let plan = optimized
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            plan,
            outputs,
            settings,
        })
    }

    fn build_input(&self, frame: &VideoFrame) -> Result<Tensor> {
        let (w, h) = (self.settings.input_width, self.settings.input_height);
        let rgb = frame.to_rgb_image()?;
        let resized = if rgb.dimensions() == (w, h) {
            rgb
        } else {
            imageops::resize(&rgb, w, h, FilterType::Triangle)
        };
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, h as usize, w as usize, 3),
            |(_, y, x, channel)| resized.get_pixel(x as u32, y as u32).0[channel],
        );
        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>, frame: &VideoFrame) -> Result<Vec<Detection>> {
        let slot = |idx: usize| {
            outputs
                .get(idx)
                .ok_or_else(|| anyhow!("model produced no output #{}", idx))
        };
        let boxes = slot(self.outputs.boxes)?
            .to_array_view::<f32>()
            .context("box tensor was not f32")?;
        let classes = slot(self.outputs.classes)?
            .to_array_view::<f32>()
            .context("class tensor was not f32")?;
        let scores = slot(self.outputs.scores)?
            .to_array_view::<f32>()
            .context("score tensor was not f32")?;

        let boxes = boxes.iter().copied().collect::<Vec<f32>>();
        let classes = classes.iter().copied().collect::<Vec<f32>>();
        let scores = scores.iter().copied().collect::<Vec<f32>>();

        let mut n = scores.len().min(classes.len()).min(boxes.len() / 4);
        if let Some(count) = self.outputs.count {
            let reported = slot(count)?
                .to_array_view::<f32>()
                .context("count tensor was not f32")?
                .iter()
                .next()
                .copied()
                .unwrap_or(0.0);
            n = n.min(reported.max(0.0) as usize);
        }

        let (fw, fh) = (frame.width as f32, frame.height as f32);
        let candidates = (0..n)
            .map(|i| {
                let (ymin, xmin, ymax, xmax) =
                    (boxes[i * 4], boxes[i * 4 + 1], boxes[i * 4 + 2], boxes[i * 4 + 3]);
                let id = classes[i].round().max(0.0) as u32;
                let class = coco_label(id)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("class {}", id));
                Detection::new(
                    class,
                    scores[i],
                    BBox::new(xmin * fw, ymin * fh, (xmax - xmin) * fw, (ymax - ymin) * fh),
                )
            })
            .collect();

        Ok(suppress(
            candidates,
            self.settings.iou_threshold,
            self.settings.min_score,
            self.settings.max_detections,
        ))
    }
}

impl Detector for TractSsdDetector {
    fn name(&self) -> &'static str {
        "tract-ssd"
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Vec<Detection>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        let (w, h) = (self.settings.input_width, self.settings.input_height);
        let blank = VideoFrame::from_rgb(vec![0u8; (w * h * 3) as usize], w, h, 0)?;
        self.detect(&blank).map(|_| ())
    }
}

/// Model library backed by a local ONNX file.
pub struct TractLibrary {
    settings: ModelSettings,
}

impl TractLibrary {
    pub fn new(settings: ModelSettings) -> Self {
        Self { settings }
    }
}

impl ModelLibrary for TractLibrary {
    fn describe(&self) -> String {
        format!(
            "{} ({}x{} input)",
            self.settings.path, self.settings.input_width, self.settings.input_height
        )
    }

    fn load(&self) -> Result<Box<dyn Detector>> {
        Ok(Box::new(TractSsdDetector::load(self.settings.clone())?))
    }
}
