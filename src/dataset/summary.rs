use super::Metadata;
use ndarray::{Array2, ArrayView1, Axis};
use std::collections::BTreeMap;

/// Per-frame object counts: one row per distinct frame, one column per label.
///
/// Rows and columns are both sorted ascending, so the table is a pure
/// function of the annotation rows it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    frames: Vec<String>,
    labels: Vec<String>,
    counts: Array2<u32>,
}

impl Summary {
    /// One-hot encode the label column, group by frame and sum.
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let _span = tracing::debug_span!("create_summary").entered();

        let mut frame_index: BTreeMap<&str, usize> = BTreeMap::new();
        let mut label_index: BTreeMap<&str, usize> = BTreeMap::new();
        for row in metadata.rows() {
            frame_index.insert(&row.frame, 0);
            label_index.insert(&row.label, 0);
        }
        for (i, slot) in frame_index.values_mut().enumerate() {
            *slot = i;
        }
        for (i, slot) in label_index.values_mut().enumerate() {
            *slot = i;
        }

        let mut counts = Array2::<u32>::zeros((frame_index.len(), label_index.len()));
        for row in metadata.rows() {
            let f = frame_index[row.frame.as_str()];
            let l = label_index[row.label.as_str()];
            counts[[f, l]] += 1;
        }

        tracing::debug!(
            "Summary has {} frames x {} labels",
            frame_index.len(),
            label_index.len()
        );

        Self {
            frames: frame_index.keys().map(|f| f.to_string()).collect(),
            labels: label_index.keys().map(|l| l.to_string()).collect(),
            counts,
        }
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Count column of `label`, aligned with `frames()`.
    pub fn column(&self, label: &str) -> Option<ArrayView1<'_, u32>> {
        self.label_index(label)
            .map(|index| self.counts.index_axis(Axis(1), index))
    }

    pub fn count(&self, frame: &str, label: &str) -> Option<u32> {
        let row = self.frames.iter().position(|f| f == frame)?;
        let col = self.label_index(label)?;
        Some(self.counts[[row, col]])
    }

    /// Total objects of each label across the whole dataset.
    pub fn totals(&self) -> Vec<(&str, u32)> {
        self.labels
            .iter()
            .zip(self.counts.sum_axis(Axis(0)).iter())
            .map(|(label, total)| (label.as_str(), *total))
            .collect()
    }
}
