use crate::config::AppConfig;
use crate::dataset::{BoundingBox, FrameSelection, Metadata, Summary};
use crate::detection::{self, DetectionParams, Detector};
use crate::error::Result;
use crate::imaging::{load_image, BoxOverlay};
use crate::memo::MemoCache;
use crate::output::OutputSink;
use crate::remote::RemoteSource;
use crate::weights::{Progress, WeightsProvisioner};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

pub const NO_FRAMES_MESSAGE: &str =
    "No frames fit the criteria. Please select different label or number.";

/// Bounds of the object-count range control.
pub const COUNT_RANGE: (u32, u32) = (0, 25);

/// Everything the user can change between renders.
#[derive(Debug, Clone, PartialEq)]
pub struct Controls {
    /// Summary column to filter on; `None` picks the first one.
    pub label: Option<String>,
    pub min_elts: u32,
    pub max_elts: u32,
    /// Index into the selected frames, clamped to the selection.
    pub frame_index: usize,
    /// Run the detector when set.
    pub detection: Option<DetectionParams>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            label: None,
            min_elts: 10,
            max_elts: 20,
            frame_index: 0,
            detection: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The selection was empty; nothing past the selector ran.
    NoFrames { label: String, message: &'static str },
    Rendered(RenderReport),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub label: String,
    pub frame: String,
    pub index: usize,
    pub total: usize,
    pub ground_truth: Vec<BoundingBox>,
    pub detections: Option<Vec<BoundingBox>>,
}

/// Runs the whole browse flow for one set of controls, memoizing the pure steps.
pub struct Pipeline {
    config: AppConfig,
    source: Box<dyn RemoteSource>,
    metadata: MemoCache<Metadata>,
    summaries: MemoCache<Summary>,
    selections: MemoCache<FrameSelection>,
    detector: Option<Box<dyn Detector>>,
}

impl Pipeline {
    pub fn new(config: AppConfig, source: Box<dyn RemoteSource>) -> Self {
        Self {
            config,
            source,
            metadata: MemoCache::new(),
            summaries: MemoCache::new(),
            selections: MemoCache::new(),
            detector: None,
        }
    }

    /// Use an already-built detector instead of provisioning weights on first use.
    pub fn with_detector(mut self, detector: Box<dyn Detector>) -> Self {
        self.detector = Some(detector);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn source(&self) -> &dyn RemoteSource {
        self.source.as_ref()
    }

    pub fn metadata(&mut self) -> Result<Arc<Metadata>> {
        let url = self.config.data.labels_url();
        let source = self.source.as_ref();
        self.metadata
            .get_or_try_insert_with("load_metadata", &url, || Metadata::load(source, &url))
    }

    pub fn summary(&mut self) -> Result<Arc<Summary>> {
        let metadata = self.metadata()?;
        let url = self.config.data.labels_url();
        self.summaries
            .get_or_try_insert_with("create_summary", &url, || {
                Ok(Summary::from_metadata(&metadata))
            })
    }

    pub fn select(&mut self, label: &str, min_elts: u32, max_elts: u32) -> Result<Arc<FrameSelection>> {
        let summary = self.summary()?;
        let key = (self.config.data.labels_url(), label, min_elts, max_elts);
        self.selections
            .get_or_try_insert_with("get_selected_frames", &key, || {
                summary.select(label, min_elts, max_elts)
            })
    }

    /// Forget every memoized result, e.g. after the labels file changed upstream.
    pub fn invalidate(&mut self) {
        self.metadata.clear();
        self.summaries.clear();
        self.selections.clear();
    }

    /// One top-to-bottom pass: select, load, overlay ground truth, optionally detect.
    pub fn render(
        &mut self,
        controls: &Controls,
        output: &mut dyn OutputSink,
        progress: &mut dyn FnMut(Progress),
        cancel: &CancellationToken,
    ) -> Result<RenderOutcome> {
        let start = Instant::now();
        let summary = self.summary()?;

        let label = match &controls.label {
            Some(label) => label.clone(),
            None => match summary.labels().first() {
                Some(first) => first.clone(),
                None => {
                    return Ok(RenderOutcome::NoFrames {
                        label: String::new(),
                        message: NO_FRAMES_MESSAGE,
                    })
                }
            },
        };

        let selection = self.select(&label, controls.min_elts, controls.max_elts)?;
        if selection.is_empty() {
            tracing::info!(
                "No frames with {}..={} x {}",
                controls.min_elts,
                controls.max_elts,
                label
            );
            return Ok(RenderOutcome::NoFrames {
                label,
                message: NO_FRAMES_MESSAGE,
            });
        }

        let index = selection.clamp_index(controls.frame_index);
        let frame = selection.frames[index].clone();
        let image = load_image(self.source.as_ref(), &self.config.data.frame_url(&frame))?;

        let metadata = self.metadata()?;
        let ground_truth = metadata.boxes_for_frame(&frame);

        let caption = format!("Ground Truth {}/{} : {}", index, selection.len(), frame);
        let tinted = BoxOverlay::new(&self.config.palette).apply(&image, &ground_truth);
        output.write_image(&frame, "ground-truth", &caption, &tinted)?;

        let detections = match &controls.detection {
            Some(params) => {
                let boxes = self.detector(progress, cancel)?.detect(&image, params)?;
                let caption = format!(
                    "YOLO Detection (overlap {:3.1}) (confidence {:3.1})",
                    params.overlap_threshold, params.confidence_threshold
                );
                let tinted = BoxOverlay::new(&self.config.palette).apply(&image, &boxes);
                output.write_image(&frame, "detection", &caption, &tinted)?;
                Some(boxes)
            }
            None => {
                tracing::info!("Detection is off; enable it to compare with ground truth");
                None
            }
        };

        tracing::debug!("Rendered {} in {:.1}ms", frame, start.elapsed().as_secs_f64() * 1000.0);

        Ok(RenderOutcome::Rendered(RenderReport {
            label,
            frame,
            index,
            total: selection.len(),
            ground_truth,
            detections,
        }))
    }

    fn detector(
        &mut self,
        progress: &mut dyn FnMut(Progress),
        cancel: &CancellationToken,
    ) -> Result<&mut Box<dyn Detector>> {
        let detector = match self.detector.take() {
            Some(detector) => detector,
            None => {
                let weights = WeightsProvisioner::new(&self.config.weights, self.source.as_ref())
                    .ensure(progress, cancel)?;
                let detector =
                    detection::create_default_detector(&weights, self.config.detector.input_size)?;
                let (w, h) = detector.input_size();
                tracing::info!("Detector ready ({}x{} input)", w, h);
                detector
            }
        };
        Ok(self.detector.insert(detector))
    }
}
