use super::Summary;
use crate::error::{LensError, Result};

/// Frames whose count of one label falls in an inclusive range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSelection {
    pub label: String,
    pub min_elts: u32,
    pub max_elts: u32,
    /// Qualifying frames, in summary row order.
    pub frames: Vec<String>,
    /// Label count of each entry in `frames`.
    pub counts: Vec<u32>,
}

impl FrameSelection {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Clamp a requested index into `0..len`. Callers must check `is_empty` first.
    pub fn clamp_index(&self, index: usize) -> usize {
        index.min(self.frames.len().saturating_sub(1))
    }

    pub fn frame(&self, index: usize) -> Option<&str> {
        self.frames.get(index).map(String::as_str)
    }
}

impl Summary {
    /// Select frames with `min_elts <= count(label) <= max_elts`.
    ///
    /// An inverted range yields an empty selection rather than an error.
    pub fn select(&self, label: &str, min_elts: u32, max_elts: u32) -> Result<FrameSelection> {
        let column = self
            .column(label)
            .ok_or_else(|| LensError::UnknownLabel(label.to_string()))?;

        let (frames, counts): (Vec<String>, Vec<u32>) = self
            .frames()
            .iter()
            .zip(column.iter())
            .filter(|(_, count)| (min_elts..=max_elts).contains(*count))
            .map(|(frame, count)| (frame.clone(), *count))
            .unzip();

        Ok(FrameSelection {
            label: label.to_string(),
            min_elts,
            max_elts,
            frames,
            counts,
        })
    }
}
