use super::nms::{non_max_suppression, Candidate};
use super::preprocess::Preprocessor;
use super::types::{DetectionParams, Detector};
use crate::dataset::BoundingBox;
use crate::error::{LensError, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

/// Box geometry (`cx, cy, w, h`) leads every prediction row.
const BOX_FIELDS: usize = 4;

/// COCO class ids that correspond to a dataset label.
const COCO_TO_LABEL: [(usize, &str); 5] = [
    (0, "pedestrian"),
    (1, "biker"),
    (2, "car"),
    (7, "truck"),
    (9, "trafficLight"),
];

/// YOLO detector running on ONNX Runtime
///
/// Expects a single `[1, 3, H, W]` input. The output is either the v3/v5
/// `[1, N, 5 + classes]` layout of `cx, cy, w, h, objectness, class scores...`
/// or the v8 `[1, 4 + classes, N]` layout, which has no objectness column.
/// Coordinates are in input-pixel units.
pub struct YoloDetector {
    session: Session,
    preprocessor: Preprocessor,
}

impl YoloDetector {
    /// Load the model from an ONNX file
    ///
    /// # Arguments
    /// * `weights_path` - Path to a checksum-verified ONNX file
    /// * `input_size` - Square input edge the model was exported with (e.g. 416)
    pub fn new<P: AsRef<Path>>(weights_path: P, input_size: u32) -> Result<Self> {
        let path = weights_path.as_ref();

        tracing::info!("Loading YOLO model from {}", path.display());

        let session = Session::builder()
            .map_err(model_err)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(model_err)?
            .with_intra_threads(4)
            .map_err(model_err)?
            .commit_from_file(path)
            .map_err(|e| LensError::Model(format!("failed to load {}: {}", path.display(), e)))?;

        tracing::info!("YOLO model loaded successfully");

        Ok(Self {
            session,
            preprocessor: Preprocessor::new(input_size, input_size),
        })
    }
}

impl Detector for YoloDetector {
    fn detect(&mut self, image: &RgbImage, params: &DetectionParams) -> Result<Vec<BoundingBox>> {
        let _span = tracing::debug_span!("yolo_detect").entered();

        let input = self.preprocessor.preprocess(image);
        let scale = self.preprocessor.scale_to(image);

        let _infer_span = tracing::debug_span!("inference").entered();
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view()).map_err(model_err)?])
            .map_err(model_err)?;
        drop(_infer_span);

        let (shape, data) = outputs[0].try_extract_tensor::<f32>().map_err(model_err)?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let candidates = decode_predictions(&dims, data, params.confidence_threshold, scale)?;
        let before = candidates.len();
        let kept = non_max_suppression(candidates, params.overlap_threshold);

        tracing::debug!("{} candidates, {} after NMS", before, kept.len());

        let (width, height) = image.dimensions();
        Ok(kept
            .into_iter()
            .map(|c| to_bounding_box(&c, width, height))
            .collect())
    }

    fn input_size(&self) -> (u32, u32) {
        self.preprocessor.target_size()
    }
}

/// Turn raw prediction rows into scored, labelled candidates in image coordinates.
///
/// `dims` is the output shape. `[1, rows, features]` rows carry objectness after
/// the box; `[1, features, rows]` (the smaller trailing axis is features) goes
/// straight to class scores and the score is the best class score alone.
/// Rows whose best class has no dataset label, or whose score is below
/// `confidence`, are dropped.
pub fn decode_predictions(
    dims: &[i64],
    data: &[f32],
    confidence: f32,
    scale: (f32, f32),
) -> Result<Vec<Candidate>> {
    let &[batch, a, b] = dims else {
        return Err(LensError::ModelOutput(format!(
            "expected a 3D output, got shape {:?}",
            dims
        )));
    };
    if batch != 1 || a <= 0 || b <= 0 {
        return Err(LensError::ModelOutput(format!("unsupported output shape {:?}", dims)));
    }

    let (a, b) = (a as usize, b as usize);
    let transposed = a < b;
    let (rows, features) = if transposed { (b, a) } else { (a, b) };
    let class_start = if transposed { BOX_FIELDS } else { BOX_FIELDS + 1 };
    if features <= class_start {
        return Err(LensError::ModelOutput(format!(
            "output has {} features, need more than {}",
            features, class_start
        )));
    }
    if data.len() != rows * features {
        return Err(LensError::ModelOutput(format!(
            "output holds {} values, shape {:?} needs {}",
            data.len(),
            dims,
            rows * features
        )));
    }

    let at = |row: usize, feature: usize| {
        if transposed {
            data[feature * rows + row]
        } else {
            data[row * features + feature]
        }
    };

    let (sx, sy) = scale;
    let mut candidates = Vec::new();
    for row in 0..rows {
        let objectness = if transposed { 1.0 } else { at(row, BOX_FIELDS) };
        if objectness < confidence {
            continue;
        }

        let (class_id, class_score) = (class_start..features)
            .map(|f| (f - class_start, at(row, f)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        let score = objectness * class_score;
        if score < confidence {
            continue;
        }

        let Some(label) = label_for_class(class_id) else {
            continue;
        };

        let (cx, cy, w, h) = (at(row, 0), at(row, 1), at(row, 2), at(row, 3));
        candidates.push(Candidate {
            bbox: [
                (cx - w / 2.0) * sx,
                (cy - h / 2.0) * sy,
                (cx + w / 2.0) * sx,
                (cy + h / 2.0) * sy,
            ],
            score,
            label,
        });
    }

    Ok(candidates)
}

fn label_for_class(class_id: usize) -> Option<&'static str> {
    COCO_TO_LABEL
        .iter()
        .find(|(id, _)| *id == class_id)
        .map(|(_, label)| *label)
}

fn to_bounding_box(candidate: &Candidate, width: u32, height: u32) -> BoundingBox {
    let clamp = |v: f32, max: u32| (v.round() as i64).clamp(0, max as i64);
    BoundingBox {
        xmin: clamp(candidate.bbox[0], width),
        ymin: clamp(candidate.bbox[1], height),
        xmax: clamp(candidate.bbox[2], width),
        ymax: clamp(candidate.bbox[3], height),
        label: candidate.label.to_string(),
    }
}

fn model_err(e: impl std::fmt::Display) -> LensError {
    LensError::Model(e.to_string())
}
