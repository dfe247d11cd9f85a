//! Document quality gate: geometry, photometry, and temporal stability
//! checks for ID-card captures.

use serde::{Deserialize, Serialize};

use super::{GateDecision, GateVerdict, RejectReason};
use crate::metrics::{border_edge_score, brightness_stats, laplacian_variance, to_grayscale};
use crate::stability::StabilityState;
use crate::types::{BoundingBox, CaptureTarget, ClassId, Frame, QualityMetrics};

/// Thresholds for the document gate. All tunable; defaults match the
/// calibration the detector was shipped with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentGateConfig {
    /// Accepted height/width range for a horizontal ID card.
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Accepted box-area / frame-area range.
    pub min_area_ratio: f32,
    pub max_area_ratio: f32,
    /// Minimum detector confidence (post marker boost).
    pub min_score: f32,
    /// Accepted luminance mean range; rejects under and over exposure.
    pub brightness_min: f32,
    pub brightness_max: f32,
    /// Minimum luminance spread; rejects flat or blown-out crops.
    pub min_brightness_std: f32,
    /// Minimum Laplacian variance; lower tolerates more blur.
    pub min_blur_variance: f32,
    /// Minimum mean Sobel magnitude along the border band.
    pub min_edge_score: f32,
    /// Border band width as a fraction of each crop dimension.
    pub border_band_pct: f32,
    /// Box continuity threshold between consecutive ticks.
    pub continuity_iou: f32,
    /// Consecutive ticks the same box must be observed before capture.
    pub required_stable_frames: u32,
}

impl Default for DocumentGateConfig {
    fn default() -> Self {
        Self {
            min_aspect: 0.58,
            max_aspect: 0.78,
            min_area_ratio: 0.14,
            max_area_ratio: 0.65,
            min_score: 0.50,
            brightness_min: 25.0,
            brightness_max: 205.0,
            min_brightness_std: 20.0,
            min_blur_variance: 120.0,
            min_edge_score: 8.0,
            border_band_pct: 0.06,
            continuity_iou: 0.85,
            required_stable_frames: 4,
        }
    }
}

/// Evaluate a mapped document candidate.
///
/// `crop` holds the candidate's pixels at native frame resolution and
/// `bbox` its frame-space box. The stability record is advanced on every
/// observation regardless of the verdict, so a card held steady through a
/// momentary blur does not lose its count. When more than one check
/// fails, the reported reason follows the priority stability > blur >
/// brightness > geometry.
pub fn evaluate(
    crop: &Frame,
    bbox: &BoundingBox,
    frame_area: f32,
    score: f32,
    class_id: ClassId,
    target: CaptureTarget,
    stability: StabilityState,
    config: &DocumentGateConfig,
) -> GateDecision {
    let stability = stability.observe(*bbox, target, Some(class_id), config.continuity_iou);

    let gray = to_grayscale(crop);
    let (w, h) = (crop.width as usize, crop.height as usize);
    let (brightness_mean, brightness_std) = brightness_stats(&gray);
    let blur_variance = laplacian_variance(&gray, w, h);
    let edge_score = border_edge_score(&gray, w, h, config.border_band_pct);

    let aspect_ratio = bbox.height() / bbox.width().max(1.0);
    let area_ratio = bbox.area() / frame_area.max(1.0);

    let metrics = QualityMetrics {
        aspect_ratio,
        area_ratio,
        brightness_mean,
        brightness_std,
        blur_variance,
        edge_score,
        coverage: area_ratio,
        yaw_deg: 0.0,
        pitch_deg: 0.0,
        roll_deg: 0.0,
    };

    let stable = stability.consecutive_good >= config.required_stable_frames;
    let sharp = blur_variance >= config.min_blur_variance;
    let lit = brightness_mean >= config.brightness_min
        && brightness_mean <= config.brightness_max
        && brightness_std >= config.min_brightness_std;
    let aligned = aspect_ratio >= config.min_aspect && aspect_ratio <= config.max_aspect;
    let sized = area_ratio >= config.min_area_ratio && area_ratio <= config.max_area_ratio;
    let confident = score >= config.min_score;
    let edged = edge_score >= config.min_edge_score;

    let reason = if !stable {
        Some(RejectReason::NotStable {
            have: stability.consecutive_good,
            need: config.required_stable_frames,
        })
    } else if !sharp {
        Some(RejectReason::Blurry {
            variance: blur_variance,
        })
    } else if !lit {
        Some(RejectReason::Lighting {
            mean: brightness_mean,
            std: brightness_std,
        })
    } else if !aligned {
        Some(RejectReason::Alignment {
            aspect: aspect_ratio,
        })
    } else if !sized {
        Some(RejectReason::AreaOutOfRange { ratio: area_ratio })
    } else if !confident {
        Some(RejectReason::LowConfidence { score })
    } else if !edged {
        Some(RejectReason::WeakEdges { score: edge_score })
    } else {
        None
    };

    GateDecision {
        verdict: match reason {
            Some(reason) => GateVerdict::Reject(reason),
            None => GateVerdict::Accept(metrics),
        },
        stability,
    }
}
