mod png_dir;

pub use png_dir::PngDirOutput;

use crate::error::Result;
use image::RgbImage;

/// Trait for render destinations
pub trait OutputSink {
    /// Hand over one finished image
    ///
    /// # Arguments
    /// * `frame` - Dataset frame the image belongs to
    /// * `name` - Short kind of image, e.g. "ground-truth" or "detection"
    /// * `caption` - Human-readable heading for the image
    fn write_image(&mut self, frame: &str, name: &str, caption: &str, image: &RgbImage) -> Result<()>;
}
