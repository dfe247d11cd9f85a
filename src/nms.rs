//! Greedy non-max suppression over corner-form boxes.

use crate::types::{BoundingBox, DetectionCandidate};

const IOU_EPSILON: f32 = 1e-6;

/// Intersection-over-union of two corner-form boxes.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let xi1 = a.x1.max(b.x1);
    let yi1 = a.y1.max(b.y1);
    let xi2 = a.x2.min(b.x2);
    let yi2 = a.y2.min(b.y2);
    let inter = (xi2 - xi1).max(0.0) * (yi2 - yi1).max(0.0);
    inter / (a.area() + b.area() - inter + IOU_EPSILON)
}

/// Standard greedy NMS.
///
/// Returns indices into `candidates` of the survivors, highest score
/// first. The sort is stable, so ties keep their original order and the
/// result is deterministic for identical input.
pub fn non_max_suppression(candidates: &[DetectionCandidate], iou_threshold: f32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .score
            .partial_cmp(&candidates[a].score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    while let Some(current) = order.first().copied() {
        keep.push(current);
        order.retain(|&i| {
            i != current && iou(&candidates[current].bbox, &candidates[i].bbox) < iou_threshold
        });
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ClassId;

    fn candidate(x1: f32, y1: f32, x2: f32, y2: f32, score: f32) -> DetectionCandidate {
        DetectionCandidate {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            score,
            class_id: ClassId::DocumentFront,
        }
    }

    #[test]
    fn test_iou_identical_boxes() {
        let b = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        assert!((iou(&b, &b) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_iou_disjoint_boxes() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_overlapping_duplicates_suppressed() {
        let cands = vec![
            candidate(0.0, 0.0, 100.0, 100.0, 0.9),
            candidate(5.0, 5.0, 105.0, 105.0, 0.8),
            candidate(300.0, 300.0, 400.0, 400.0, 0.7),
        ];
        let keep = non_max_suppression(&cands, 0.45);
        assert_eq!(keep, vec![0, 2]);
    }

    #[test]
    fn test_survivor_has_highest_score() {
        let cands = vec![
            candidate(5.0, 5.0, 105.0, 105.0, 0.6),
            candidate(0.0, 0.0, 100.0, 100.0, 0.95),
        ];
        let keep = non_max_suppression(&cands, 0.45);
        assert_eq!(keep, vec![1]);
    }

    #[test]
    fn test_ties_keep_original_order() {
        let cands = vec![
            candidate(0.0, 0.0, 10.0, 10.0, 0.5),
            candidate(50.0, 50.0, 60.0, 60.0, 0.5),
        ];
        let keep = non_max_suppression(&cands, 0.45);
        assert_eq!(keep, vec![0, 1]);
    }
}
