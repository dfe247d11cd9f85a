//! Property tests for the geometric core of the pipeline.
//!
//! These provide fuzz-like coverage of the letterbox mapping, IoU, NMS,
//! and the decoder without requiring nightly Rust or cargo-fuzz.
//! Run with: cargo test --test pipeline_props

use proptest::prelude::*;

use idcapture::decode::decode;
use idcapture::letterbox::{letterbox, to_model_space, unletterbox};
use idcapture::nms::{iou, non_max_suppression};
use idcapture::testing::synthetic::{attr_major_output, detection_row, flat_frame, row_major_output};
use idcapture::types::{BoundingBox, ClassId, DetectionCandidate};

fn arb_box(max_w: f32, max_h: f32) -> impl Strategy<Value = BoundingBox> {
    (0.0f32..max_w, 0.0f32..max_h, 1.0f32..max_w, 1.0f32..max_h).prop_map(
        move |(x, y, w, h)| {
            let x2 = (x + w).min(max_w);
            let y2 = (y + h).min(max_h);
            BoundingBox::new(x, y, x2, y2)
        },
    )
}

proptest! {
    /// Mapping a frame box into model space and back loses at most one
    /// pixel, for any frame geometry.
    #[test]
    fn letterbox_round_trip_within_one_pixel(
        frame_w in 16u32..1920,
        frame_h in 16u32..1080,
        bx in 0.0f32..1.0,
        by in 0.0f32..1.0,
        bw in 0.05f32..1.0,
        bh in 0.05f32..1.0,
    ) {
        let frame = flat_frame(frame_w, frame_h, 90);
        let (_, meta) = letterbox(&frame, 640);

        let fw = frame_w as f32;
        let fh = frame_h as f32;
        let original = BoundingBox::new(
            bx * fw * 0.5,
            by * fh * 0.5,
            (bx * 0.5 + bw * 0.5) * fw,
            (by * 0.5 + bh * 0.5) * fh,
        ).clamped(fw, fh);

        let back = unletterbox(&to_model_space(&original, &meta), &meta, true);
        prop_assert!((back.x1 - original.x1).abs() <= 1.0);
        prop_assert!((back.y1 - original.y1).abs() <= 1.0);
        prop_assert!((back.x2 - original.x2).abs() <= 1.0);
        prop_assert!((back.y2 - original.y2).abs() <= 1.0);
    }

    /// The scaled content always fits the square and padding centers it.
    #[test]
    fn letterbox_content_fits_square(
        frame_w in 1u32..2048,
        frame_h in 1u32..2048,
    ) {
        let frame = flat_frame(frame_w, frame_h, 10);
        let (canvas, meta) = letterbox(&frame, 320);
        prop_assert_eq!(canvas.len(), 320 * 320 * 3);
        prop_assert!(meta.new_w <= 320);
        prop_assert!(meta.new_h <= 320);
        prop_assert!(meta.pad_x + meta.new_w <= 320);
        prop_assert!(meta.pad_y + meta.new_h <= 320);
        // At least one axis fills the square (up to rounding).
        prop_assert!(meta.new_w >= 319 || meta.new_h >= 319);
    }

    /// IoU is symmetric and bounded in [0, 1].
    #[test]
    fn iou_symmetric_and_bounded(
        a in arb_box(1000.0, 1000.0),
        b in arb_box(1000.0, 1000.0),
    ) {
        let ab = iou(&a, &b);
        let ba = iou(&b, &a);
        prop_assert!((ab - ba).abs() < 1e-5);
        prop_assert!((0.0..=1.0).contains(&ab));
    }

    /// No two NMS survivors overlap at or above the threshold, and the
    /// survivor list is ordered by descending score.
    #[test]
    fn nms_survivors_are_disjoint_and_ordered(
        boxes in prop::collection::vec(
            (arb_box(640.0, 640.0), 0.01f32..1.0),
            0..40,
        ),
        threshold in 0.1f32..0.9,
    ) {
        let candidates: Vec<DetectionCandidate> = boxes
            .into_iter()
            .map(|(bbox, score)| DetectionCandidate {
                bbox,
                score,
                class_id: ClassId::DocumentFront,
            })
            .collect();

        let keep = non_max_suppression(&candidates, threshold);
        for (rank, &i) in keep.iter().enumerate() {
            for &j in &keep[rank + 1..] {
                prop_assert!(iou(&candidates[i].bbox, &candidates[j].bbox) < threshold);
                prop_assert!(candidates[i].score >= candidates[j].score);
            }
        }
    }

    /// Row-major and transposed detector exports decode identically.
    #[test]
    fn decoder_is_layout_invariant(
        rows in prop::collection::vec(
            (0.0f32..1.0, 0.0f32..1.0, 0.01f32..1.0, 0.01f32..1.0, 0usize..3, 0.01f32..0.99),
            0..30,
        ),
    ) {
        let rows: Vec<[f32; 7]> = rows
            .into_iter()
            .map(|(cx, cy, w, h, class, conf)| detection_row(cx, cy, w, h, class, conf))
            .collect();

        let a = decode(&row_major_output(&rows), 3, 0.5, 640).unwrap();
        let b = decode(&attr_major_output(&rows), 3, 0.5, 640).unwrap();
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            prop_assert_eq!(x.class_id, y.class_id);
            prop_assert!((x.score - y.score).abs() < 1e-4);
            prop_assert!((x.bbox.x1 - y.bbox.x1).abs() < 1e-2);
        }
    }

    /// Every decoded candidate clears the confidence threshold.
    #[test]
    fn decoder_respects_threshold(
        rows in prop::collection::vec(
            (0.0f32..1.0, 0.0f32..1.0, 0.01f32..1.0, 0.01f32..1.0, 0usize..3, 0.01f32..0.99),
            0..30,
        ),
        threshold in 0.1f32..0.9,
    ) {
        let rows: Vec<[f32; 7]> = rows
            .into_iter()
            .map(|(cx, cy, w, h, class, conf)| detection_row(cx, cy, w, h, class, conf))
            .collect();
        let candidates = decode(&row_major_output(&rows), 3, threshold, 640).unwrap();
        for c in candidates {
            prop_assert!(c.score >= threshold - 1e-4);
        }
    }
}
