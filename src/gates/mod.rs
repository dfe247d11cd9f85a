//! Quality gates: accept or reject a candidate region for capture.
//!
//! Gates are pure with respect to session state. They receive the
//! stability record by value and hand back the successor; the orchestrator
//! is the only writer of the stored copy.

pub mod document;
pub mod face;

use std::fmt;

use crate::select::DocumentSide;
use crate::stability::StabilityState;
use crate::types::QualityMetrics;

/// Why a tick did not produce a capture.
///
/// These are expected control flow, never errors. `Display` renders the
/// operator-facing guidance string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// Candidate seen, but not for enough consecutive ticks yet.
    NotStable { have: u32, need: u32 },
    Blurry { variance: f32 },
    Lighting { mean: f32, std: f32 },
    /// Aspect ratio outside the tolerated card proportions.
    Alignment { aspect: f32 },
    /// Box too small or too large relative to the frame.
    AreaOutOfRange { ratio: f32 },
    LowConfidence { score: f32 },
    /// Border band lacks the edge strength of a real card.
    WeakEdges { score: f32 },
    Pose { yaw: f32, pitch: f32, roll: f32 },
    /// Face box covers too little of the frame.
    TooFar { coverage: f32 },
    NoFace,
    MultipleFaces,
    NoLandmarks,
    /// No candidate of the requested class this tick.
    NoCandidate { side: DocumentSide },
    /// Mapped box degenerated after clamping.
    Reposition { side: DocumentSide },
    FrameUnavailable,
    /// Quality passed but the capture cooldown has not elapsed.
    CoolingDown,
    /// Session idle, complete, or cancelled.
    Inactive,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RejectReason::NotStable { have, need } => {
                write!(f, "Hold steady ({}/{})", have, need)
            }
            RejectReason::Blurry { .. } => write!(f, "Avoid blur, hold the camera still"),
            RejectReason::Lighting { .. } => write!(f, "Improve lighting"),
            RejectReason::Alignment { .. } => {
                write!(f, "Rotate and align the card to be horizontal")
            }
            RejectReason::AreaOutOfRange { .. } => {
                write!(f, "Adjust distance so the card fills the frame")
            }
            RejectReason::LowConfidence { .. } => {
                write!(f, "Show the card clearly (good light, fill frame)")
            }
            RejectReason::WeakEdges { .. } => {
                write!(f, "Place the card against a contrasting background")
            }
            RejectReason::Pose { yaw, pitch, roll } => write!(
                f,
                "Keep face straight (yaw:{:.0} pitch:{:.0} roll:{:.0})",
                yaw, pitch, roll
            ),
            RejectReason::TooFar { .. } => write!(f, "Move closer"),
            RejectReason::NoFace => write!(f, "No face detected"),
            RejectReason::MultipleFaces => write!(f, "Multiple faces detected"),
            RejectReason::NoLandmarks => write!(f, "Align face in frame"),
            RejectReason::NoCandidate { side } => {
                write!(f, "Hold steady, detecting {} side", side.as_str())
            }
            RejectReason::Reposition { side } => {
                write!(f, "Reposition the {} side in frame", side.as_str())
            }
            RejectReason::FrameUnavailable => write!(f, "Waiting for video"),
            RejectReason::CoolingDown => write!(f, "Hold on"),
            RejectReason::Inactive => write!(f, "Scanning inactive"),
        }
    }
}

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum GateVerdict {
    Accept(QualityMetrics),
    Reject(RejectReason),
}

/// Verdict plus the successor stability record the caller must store.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub verdict: GateVerdict,
    pub stability: StabilityState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guidance_strings() {
        let reason = RejectReason::NotStable { have: 2, need: 4 };
        assert_eq!(reason.to_string(), "Hold steady (2/4)");

        let reason = RejectReason::Pose {
            yaw: 40.2,
            pitch: 3.0,
            roll: -1.0,
        };
        assert!(reason.to_string().contains("yaw:40"));

        let reason = RejectReason::NoCandidate {
            side: DocumentSide::Front,
        };
        assert!(reason.to_string().contains("front"));
    }
}
