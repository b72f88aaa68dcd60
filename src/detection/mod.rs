mod nms;
mod preprocess;
pub mod types;
mod yolo;

pub use nms::{iou, non_max_suppression, Candidate};
pub use preprocess::Preprocessor;
pub use types::{DetectionParams, Detector};
pub use yolo::{decode_predictions, YoloDetector};

use crate::error::Result;
use std::path::Path;

/// Create the default detector (ONNX YOLO) from a verified weights file
pub fn create_default_detector(weights_path: &Path, input_size: u32) -> Result<Box<dyn Detector>> {
    let detector = YoloDetector::new(weights_path, input_size)?;
    Ok(Box::new(detector))
}
