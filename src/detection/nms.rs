use std::cmp::Ordering;

/// A scored box in image coordinates, before suppression.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// [x1, y1, x2, y2]
    pub bbox: [f32; 4],
    pub score: f32,
    pub label: &'static str,
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes.
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = ix * iy;

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// Greedy per-label NMS: highest score first, drop same-label boxes with IoU above `overlap`.
///
/// Survivors come back sorted by descending score.
pub fn non_max_suppression(mut candidates: Vec<Candidate>, overlap: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        let suppressed = kept
            .iter()
            .any(|k| k.label == candidate.label && iou(&k.bbox, &candidate.bbox) > overlap);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(bbox: [f32; 4], score: f32, label: &'static str) -> Candidate {
        Candidate { bbox, score, label }
    }

    #[test]
    fn iou_of_identical_and_disjoint_boxes() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
        assert_eq!(iou(&a, &[20.0, 20.0, 30.0, 30.0]), 0.0);
        // half overlap: 50 / 150
        assert!((iou(&a, &[5.0, 0.0, 15.0, 10.0]) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn keeps_highest_scoring_of_overlapping_boxes() {
        let kept = non_max_suppression(
            vec![
                cand([0.0, 0.0, 10.0, 10.0], 0.6, "car"),
                cand([1.0, 1.0, 11.0, 11.0], 0.9, "car"),
                cand([50.0, 50.0, 60.0, 60.0], 0.7, "car"),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 0.9);
        assert_eq!(kept[1].score, 0.7);
    }

    #[test]
    fn different_labels_never_suppress_each_other() {
        let kept = non_max_suppression(
            vec![
                cand([0.0, 0.0, 10.0, 10.0], 0.9, "car"),
                cand([0.0, 0.0, 10.0, 10.0], 0.8, "truck"),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn overlap_one_keeps_everything() {
        let boxes = vec![
            cand([0.0, 0.0, 10.0, 10.0], 0.9, "car"),
            cand([0.0, 0.0, 10.0, 10.0], 0.8, "car"),
        ];
        assert_eq!(non_max_suppression(boxes, 1.0).len(), 2);
    }
}
