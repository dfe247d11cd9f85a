//! Temporal stability tracking for debouncing noisy per-frame detections.

use crate::nms::iou;
use crate::types::{BoundingBox, CaptureTarget, ClassId};

/// Running record of how long the same candidate has been observed.
///
/// Threaded by value through gate evaluations; only the orchestrator
/// stores the successor state. The count restarts whenever the target
/// changes, the class changes, or box continuity breaks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StabilityState {
    pub last_box: Option<BoundingBox>,
    pub consecutive_good: u32,
    pub target: Option<CaptureTarget>,
    pub class_id: Option<ClassId>,
}

impl StabilityState {
    /// Record an observation and return the successor state.
    ///
    /// The count continues only when target and class are unchanged and
    /// the new box overlaps the previous one at `continuity_iou` or
    /// better; otherwise it restarts at 1. Pass a continuity of 0.0 for
    /// pipelines that track consecutive good ticks without box identity
    /// (the face gate).
    #[must_use]
    pub fn observe(
        self,
        bbox: BoundingBox,
        target: CaptureTarget,
        class_id: Option<ClassId>,
        continuity_iou: f32,
    ) -> StabilityState {
        let continuous = self.target == Some(target)
            && self.class_id == class_id
            && (continuity_iou <= 0.0
                || self
                    .last_box
                    .is_some_and(|prev| iou(&prev, &bbox) >= continuity_iou));
        StabilityState {
            last_box: Some(bbox),
            consecutive_good: if continuous {
                self.consecutive_good + 1
            } else {
                1
            },
            target: Some(target),
            class_id,
        }
    }

    /// Drop all history. Used on target switch, capture, or gate failure
    /// in counters that track good ticks.
    #[must_use]
    pub fn reset(self) -> StabilityState {
        StabilityState::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(100.0, 100.0, 500.0, 360.0)
    }

    #[test]
    fn test_count_grows_for_steady_box() {
        let mut state = StabilityState::default();
        for expected in 1..=5 {
            state = state.observe(
                bbox(),
                CaptureTarget::DocumentFront,
                Some(ClassId::DocumentFront),
                0.85,
            );
            assert_eq!(state.consecutive_good, expected);
        }
    }

    #[test]
    fn test_target_switch_resets_even_with_same_box() {
        let state = StabilityState::default()
            .observe(
                bbox(),
                CaptureTarget::DocumentFront,
                Some(ClassId::DocumentFront),
                0.85,
            )
            .observe(
                bbox(),
                CaptureTarget::DocumentFront,
                Some(ClassId::DocumentFront),
                0.85,
            );
        assert_eq!(state.consecutive_good, 2);

        let state = state.observe(
            bbox(),
            CaptureTarget::DocumentBack,
            Some(ClassId::DocumentFront),
            0.85,
        );
        assert_eq!(state.consecutive_good, 1);
    }

    #[test]
    fn test_class_switch_resets() {
        let state = StabilityState::default()
            .observe(
                bbox(),
                CaptureTarget::DocumentFront,
                Some(ClassId::DocumentFront),
                0.85,
            )
            .observe(
                bbox(),
                CaptureTarget::DocumentFront,
                Some(ClassId::DocumentBack),
                0.85,
            );
        assert_eq!(state.consecutive_good, 1);
    }

    #[test]
    fn test_moved_box_resets() {
        let state = StabilityState::default().observe(
            bbox(),
            CaptureTarget::DocumentFront,
            Some(ClassId::DocumentFront),
            0.85,
        );
        let far = BoundingBox::new(600.0, 100.0, 1000.0, 360.0);
        let state = state.observe(
            far,
            CaptureTarget::DocumentFront,
            Some(ClassId::DocumentFront),
            0.85,
        );
        assert_eq!(state.consecutive_good, 1);
    }

    #[test]
    fn test_zero_continuity_ignores_box_motion() {
        let state = StabilityState::default().observe(bbox(), CaptureTarget::Face, None, 0.0);
        let far = BoundingBox::new(600.0, 100.0, 1000.0, 360.0);
        let state = state.observe(far, CaptureTarget::Face, None, 0.0);
        assert_eq!(state.consecutive_good, 2);
    }
}
