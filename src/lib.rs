//! Live object detection over a webcam feed.
//!
//! Frames are pulled from a camera, passed to a pretrained detector, and the results
//! are drawn as boxes and labels on a transparent overlay sized to the stream. A
//! per-frame tally, object count and once-per-second FPS reading are published to a
//! frontend alongside a status line.
//!
//! # Module Structure
//!
//! - `camera`: camera access (synthetic `stub://` devices, V4L2)
//! - `detect`: detector and model library traits, backends, NMS, COCO labels
//! - `render`: overlay surface, box/label renderer, snapshots
//! - `controller`: start/stop handling and the detection loop
//! - `tally`, `fps`, `schedule`, `ui`: per-frame statistics, pacing and frontends

pub mod camera;
pub mod config;
pub mod controller;
pub mod detect;
pub mod error;
pub mod fps;
pub mod frame;
pub mod render;
pub mod schedule;
pub mod tally;
pub mod ui;

pub use config::LiveDetectConfig;
pub use controller::{DetectionController, StepOutcome, StopHandle};
pub use detect::{BBox, Detection, Detector, ModelLibrary};
pub use error::DemoError;
pub use frame::{VideoDimensions, VideoFrame};
