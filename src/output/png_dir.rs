use super::OutputSink;
use crate::error::Result;
use image::{ImageFormat, RgbImage};
use std::path::{Path, PathBuf};

/// Writes every image as `<frame stem>-<name>.png` into one directory.
pub struct PngDirOutput {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl PngDirOutput {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        tracing::info!("Writing rendered frames to {}", dir.display());
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    /// Paths written so far, oldest first.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn path_for(&self, frame: &str, name: &str) -> PathBuf {
        let stem = Path::new(frame)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(frame);
        self.dir.join(format!("{}-{}.png", stem, name))
    }
}

impl OutputSink for PngDirOutput {
    fn write_image(&mut self, frame: &str, name: &str, caption: &str, image: &RgbImage) -> Result<()> {
        let path = self.path_for(frame, name);
        image.save_with_format(&path, ImageFormat::Png)?;
        tracing::info!("{} -> {}", caption, path.display());
        self.written.push(path);
        Ok(())
    }
}
