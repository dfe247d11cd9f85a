//! Face quality gate: coverage, photometry, head pose, and stability
//! checks for the portrait capture.

use serde::{Deserialize, Serialize};

use super::{GateDecision, GateVerdict, RejectReason};
use crate::metrics::{brightness_stats, laplacian_variance, to_grayscale};
use crate::pose::{self, Landmark};
use crate::stability::StabilityState;
use crate::types::{BoundingBox, CaptureTarget, FaceDetection, Frame, QualityMetrics};

/// Thresholds for the face gate.
///
/// Photometric limits are face-tuned: portraits tolerate less texture
/// than card crops, so the blur floor sits lower and only the brightness
/// mean is bounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceGateConfig {
    /// Reject unless exactly one face is present. When false, the
    /// largest detection is selected instead.
    pub require_single_face: bool,
    /// Minimum box-area / frame-area after padding.
    pub min_coverage: f32,
    /// Minimum luminance mean over the crop.
    pub min_brightness: f32,
    /// Minimum Laplacian variance over the crop.
    pub min_blur_variance: f32,
    /// Pose limits in degrees.
    pub max_yaw: f32,
    pub max_pitch: f32,
    pub max_roll: f32,
    /// Crop padding around the detected box.
    pub pad: f32,
    /// Consecutive good ticks required before capture.
    pub required_stable_frames: u32,
    /// Minimum time since the previous capture, in milliseconds.
    pub cooldown_ms: u64,
    /// Capture-in-progress lock window, in milliseconds.
    pub capture_lock_ms: u64,
}

impl Default for FaceGateConfig {
    fn default() -> Self {
        Self {
            require_single_face: true,
            min_coverage: 0.08,
            min_brightness: 64.0,
            min_blur_variance: 75.0,
            max_yaw: 30.0,
            max_pitch: 65.0,
            max_roll: 10.0,
            pad: 0.22,
            required_stable_frames: 5,
            cooldown_ms: 2500,
            capture_lock_ms: 1200,
        }
    }
}

/// Pick the face to evaluate, or reject the tick.
///
/// Strict mode requires exactly one detection; tolerant mode takes the
/// largest.
pub fn select_face(
    detections: &[FaceDetection],
    config: &FaceGateConfig,
) -> Result<FaceDetection, RejectReason> {
    match detections {
        [] => Err(RejectReason::NoFace),
        [single] => Ok(*single),
        many if config.require_single_face => {
            debug_assert!(many.len() > 1);
            Err(RejectReason::MultipleFaces)
        }
        many => {
            let mut best = many[0];
            for det in &many[1..] {
                if det.area() > best.area() {
                    best = *det;
                }
            }
            Ok(best)
        }
    }
}

/// Expand a normalized detection into a padded frame-space crop box.
///
/// The height is stretched to include chin and forehead, with extra
/// padding biased toward the top, then clamped to frame bounds.
pub fn expand_face_box(det: &FaceDetection, frame_w: u32, frame_h: u32, pad: f32) -> BoundingBox {
    let fw = frame_w as f32;
    let fh = frame_h as f32;
    let base_w = det.width * fw;
    let base_h = det.height * fh * 1.20;
    let x = (det.x_center - det.width / 2.0) * fw - base_w * pad;
    let y = (det.y_center - det.height / 2.0) * fh - base_h * (pad + 0.10);
    let w = base_w * (1.0 + 2.0 * pad);
    let h = base_h * (1.0 + 2.0 * pad);
    BoundingBox::new(x, y, x + w, y + h).clamped(fw, fh)
}

/// Evaluate the padded face crop for the current tick.
///
/// Unlike the document gate, the stability counter tracks consecutive
/// good ticks: any failing check resets it to zero. The reported reason
/// follows the priority pose > blur > lighting.
pub fn evaluate(
    frame: &Frame,
    bbox: &BoundingBox,
    landmarks: &[Landmark],
    stability: StabilityState,
    config: &FaceGateConfig,
) -> GateDecision {
    let (x, y, w, h) = bbox.to_pixel_rect();
    let coverage = bbox.area() / (frame.area() as f32).max(1.0);
    if coverage < config.min_coverage {
        return GateDecision {
            verdict: GateVerdict::Reject(RejectReason::TooFar { coverage }),
            stability: stability.reset(),
        };
    }

    let crop = frame.crop(x, y, w, h);
    let gray = to_grayscale(&crop);
    let (brightness_mean, brightness_std) = brightness_stats(&gray);
    let blur_variance = laplacian_variance(&gray, crop.width as usize, crop.height as usize);

    let head_pose = match pose::estimate(landmarks) {
        Some(p) => p,
        None => {
            return GateDecision {
                verdict: GateVerdict::Reject(RejectReason::NoLandmarks),
                stability: stability.reset(),
            };
        }
    };

    let metrics = QualityMetrics {
        aspect_ratio: bbox.height() / bbox.width().max(1.0),
        area_ratio: coverage,
        brightness_mean,
        brightness_std,
        blur_variance,
        edge_score: 0.0,
        coverage,
        yaw_deg: head_pose.yaw,
        pitch_deg: head_pose.pitch,
        roll_deg: head_pose.roll,
    };

    let pose_ok = head_pose.yaw.abs() <= config.max_yaw
        && head_pose.pitch.abs() <= config.max_pitch
        && head_pose.roll.abs() <= config.max_roll;
    let sharp = blur_variance >= config.min_blur_variance;
    let lit = brightness_mean >= config.min_brightness;

    if !(pose_ok && sharp && lit) {
        let reason = if !pose_ok {
            RejectReason::Pose {
                yaw: head_pose.yaw,
                pitch: head_pose.pitch,
                roll: head_pose.roll,
            }
        } else if !sharp {
            RejectReason::Blurry {
                variance: blur_variance,
            }
        } else {
            RejectReason::Lighting {
                mean: brightness_mean,
                std: brightness_std,
            }
        };
        return GateDecision {
            verdict: GateVerdict::Reject(reason),
            stability: stability.reset(),
        };
    }

    let stability = stability.observe(*bbox, CaptureTarget::Face, None, 0.0);
    if stability.consecutive_good < config.required_stable_frames {
        return GateDecision {
            verdict: GateVerdict::Reject(RejectReason::NotStable {
                have: stability.consecutive_good,
                need: config.required_stable_frames,
            }),
            stability,
        };
    }

    GateDecision {
        verdict: GateVerdict::Accept(metrics),
        stability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic::{checkerboard_frame, landmark_set};

    fn centered_face() -> FaceDetection {
        FaceDetection {
            x_center: 0.5,
            y_center: 0.5,
            width: 0.35,
            height: 0.45,
            score: 0.9,
        }
    }

    fn good_frame() -> Frame {
        checkerboard_frame(640, 480, 4, 60, 220)
    }

    #[test]
    fn test_single_face_selected() {
        let config = FaceGateConfig::default();
        let det = centered_face();
        assert_eq!(select_face(&[det], &config), Ok(det));
        assert_eq!(select_face(&[], &config), Err(RejectReason::NoFace));
        assert_eq!(
            select_face(&[det, det], &config),
            Err(RejectReason::MultipleFaces)
        );
    }

    #[test]
    fn test_largest_face_when_tolerant() {
        let config = FaceGateConfig {
            require_single_face: false,
            ..Default::default()
        };
        let small = FaceDetection {
            width: 0.1,
            height: 0.1,
            ..centered_face()
        };
        let big = centered_face();
        assert_eq!(select_face(&[small, big], &config), Ok(big));
    }

    #[test]
    fn test_expanded_box_is_clamped() {
        let det = FaceDetection {
            x_center: 0.05,
            y_center: 0.05,
            width: 0.3,
            height: 0.3,
            score: 0.9,
        };
        let bbox = expand_face_box(&det, 640, 480, 0.22);
        assert!(bbox.x1 >= 0.0);
        assert!(bbox.y1 >= 0.0);
        assert!(bbox.x2 <= 640.0);
        assert!(bbox.y2 <= 480.0);
    }

    #[test]
    fn test_good_face_builds_stability_then_accepts() {
        let config = FaceGateConfig::default();
        let frame = good_frame();
        let bbox = expand_face_box(&centered_face(), frame.width, frame.height, config.pad);
        let mesh = landmark_set(5.0, 10.0, 2.0);

        let mut stability = StabilityState::default();
        for tick in 1..config.required_stable_frames {
            let decision = evaluate(&frame, &bbox, &mesh, stability, &config);
            stability = decision.stability;
            assert_eq!(
                decision.verdict,
                GateVerdict::Reject(RejectReason::NotStable {
                    have: tick,
                    need: config.required_stable_frames
                })
            );
        }
        let decision = evaluate(&frame, &bbox, &mesh, stability, &config);
        match decision.verdict {
            GateVerdict::Accept(metrics) => {
                assert!((metrics.yaw_deg - 5.0).abs() < 2.0);
                assert!(metrics.coverage >= config.min_coverage);
            }
            GateVerdict::Reject(reason) => panic!("expected accept, got {}", reason),
        }
    }

    #[test]
    fn test_turned_head_rejected_and_counter_restarts() {
        let config = FaceGateConfig::default();
        let frame = good_frame();
        let bbox = expand_face_box(&centered_face(), frame.width, frame.height, config.pad);

        // Build partial stability with a frontal face.
        let frontal = landmark_set(5.0, 0.0, 0.0);
        let mut stability = StabilityState::default();
        for _ in 0..3 {
            stability = evaluate(&frame, &bbox, &frontal, stability, &config).stability;
        }
        assert_eq!(stability.consecutive_good, 3);

        // Yaw 40 degrees: pose reject, counter wiped.
        let turned = landmark_set(40.0, 0.0, 0.0);
        let decision = evaluate(&frame, &bbox, &turned, stability, &config);
        assert!(matches!(
            decision.verdict,
            GateVerdict::Reject(RejectReason::Pose { .. })
        ));
        assert_eq!(decision.stability.consecutive_good, 0);

        // Back to frontal: the count restarts from 1, not 4.
        let decision = evaluate(&frame, &bbox, &frontal, decision.stability, &config);
        assert_eq!(
            decision.verdict,
            GateVerdict::Reject(RejectReason::NotStable {
                have: 1,
                need: config.required_stable_frames
            })
        );
    }

    #[test]
    fn test_small_face_too_far() {
        let config = FaceGateConfig::default();
        let frame = good_frame();
        let tiny = FaceDetection {
            width: 0.05,
            height: 0.08,
            ..centered_face()
        };
        let bbox = expand_face_box(&tiny, frame.width, frame.height, config.pad);
        let decision = evaluate(
            &frame,
            &bbox,
            &landmark_set(0.0, 0.0, 0.0),
            StabilityState::default(),
            &config,
        );
        assert!(matches!(
            decision.verdict,
            GateVerdict::Reject(RejectReason::TooFar { .. })
        ));
    }

    #[test]
    fn test_missing_landmarks_is_retry() {
        let config = FaceGateConfig::default();
        let frame = good_frame();
        let bbox = expand_face_box(&centered_face(), frame.width, frame.height, config.pad);
        let decision = evaluate(&frame, &bbox, &[], StabilityState::default(), &config);
        assert_eq!(
            decision.verdict,
            GateVerdict::Reject(RejectReason::NoLandmarks)
        );
    }
}
