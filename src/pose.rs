//! Head pose estimation from facial landmarks.
//!
//! Roll comes from the eye-line angle. Yaw and pitch come from the
//! nostril-midpoint offset against the eye midpoint, measured in a
//! de-rolled coordinate frame and normalized by inter-ocular distance so
//! the result is size invariant. The nostril-midpoint anchor is used in
//! preference to the raw nose tip because it is less sensitive to
//! landmark jitter.

use serde::{Deserialize, Serialize};

/// A single normalized landmark point ([0,1] image coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Landmark indices consumed by the pose estimator.
pub const LEFT_EYE_OUTER: usize = 33;
pub const RIGHT_EYE_OUTER: usize = 263;
pub const NOSE_TIP: usize = 4;
pub const NOSE_TIP_FALLBACK: usize = 1;
pub const LEFT_NOSTRIL: usize = 98;
pub const RIGHT_NOSTRIL: usize = 327;

/// Minimum landmark count for a usable mesh.
pub const MIN_LANDMARKS: usize = 330;

/// Head orientation in degrees. Zero on all axes is a frontal face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
}

/// Estimate pose from a landmark mesh.
///
/// Returns `None` when the mesh is too small to hold the required
/// indices; the caller treats that as "retry", never as a failure.
pub fn estimate(landmarks: &[Landmark]) -> Option<HeadPose> {
    if landmarks.len() < MIN_LANDMARKS {
        return None;
    }
    let left = landmarks[LEFT_EYE_OUTER];
    let right = landmarks[RIGHT_EYE_OUTER];

    // Nostril midpoint, falling back to the nose tip.
    let nl = landmarks[LEFT_NOSTRIL];
    let nr = landmarks[RIGHT_NOSTRIL];
    let anchor = if nl != nr {
        Landmark {
            x: (nl.x + nr.x) / 2.0,
            y: (nl.y + nr.y) / 2.0,
            z: (nl.z + nr.z) / 2.0,
        }
    } else {
        // Degenerate nostril pair; fall back to the nose tip.
        landmarks[NOSE_TIP]
    };

    let dx = right.x - left.x;
    let dy = right.y - left.y;
    let inter_ocular = (dx * dx + dy * dy).sqrt().max(1e-6);

    let roll = dy.atan2(dx).to_degrees();

    // Eye midpoint.
    let mx = (left.x + right.x) / 2.0;
    let my = (left.y + right.y) / 2.0;

    // Rotate the anchor by -roll so head tilt does not leak into yaw or
    // pitch.
    let rad = -dy.atan2(dx);
    let (sin, cos) = rad.sin_cos();
    let ax = anchor.x - mx;
    let ay = anchor.y - my;
    let nose_x = ax * cos - ay * sin;
    let nose_y = ax * sin + ay * cos;

    // Image y grows downward; positive pitch means looking down.
    let yaw = (nose_x / inter_ocular) * 90.0;
    let pitch = (nose_y / inter_ocular) * 90.0;

    Some(HeadPose { yaw, pitch, roll })
}
