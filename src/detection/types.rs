use crate::dataset::BoundingBox;
use crate::error::{LensError, Result};
use image::RgbImage;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;
pub const DEFAULT_OVERLAP_THRESHOLD: f32 = 0.3;

/// The two knobs exposed to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Minimum score a detection must reach to be kept
    pub confidence_threshold: f32,
    /// IoU above which the weaker of two same-label boxes is suppressed
    pub overlap_threshold: f32,
}

impl DetectionParams {
    pub fn new(confidence_threshold: f32, overlap_threshold: f32) -> Result<Self> {
        check_unit("confidence_threshold", confidence_threshold)?;
        check_unit("overlap_threshold", overlap_threshold)?;
        Ok(Self {
            confidence_threshold,
            overlap_threshold,
        })
    }
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

fn check_unit(name: &'static str, value: f32) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(LensError::InvalidThreshold { name, value })
    }
}

/// Trait for object detectors
/// Allows swapping the model backend without touching the pipeline
pub trait Detector {
    /// Detect objects in a frame
    ///
    /// # Returns
    /// * Boxes in the frame's pixel coordinates, labelled with the dataset's label names
    fn detect(&mut self, image: &RgbImage, params: &DetectionParams) -> Result<Vec<BoundingBox>>;

    /// Get the model's input dimensions
    ///
    /// Returns (width, height)
    fn input_size(&self) -> (u32, u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_must_be_in_unit_range() {
        assert!(DetectionParams::new(0.0, 1.0).is_ok());
        assert!(matches!(
            DetectionParams::new(1.01, 0.3),
            Err(LensError::InvalidThreshold { name: "confidence_threshold", .. })
        ));
        assert!(matches!(
            DetectionParams::new(0.5, -0.1),
            Err(LensError::InvalidThreshold { name: "overlap_threshold", .. })
        ));
        assert!(DetectionParams::new(f32::NAN, 0.3).is_err());
    }
}
