//! Target selector: pick the single best document candidate for the
//! requested side.
//!
//! Faces never pass through here; the face pipeline has its own model
//! contract and single-box selection.

use crate::types::{ClassId, DetectionCandidate};

/// Which document side is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSide {
    Front,
    Back,
}

impl DocumentSide {
    pub fn class_id(&self) -> ClassId {
        match self {
            DocumentSide::Front => ClassId::DocumentFront,
            DocumentSide::Back => ClassId::DocumentBack,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSide::Front => "front",
            DocumentSide::Back => "back",
        }
    }
}

/// Pick the best NMS survivor for `side`.
///
/// Front candidates get a fixed score bonus when a marker box sits fully
/// inside them; the marker is helpful but never required. The returned
/// candidate carries the boosted score. Returns `None` when the side's
/// bucket is empty (caller retries next tick).
pub fn select_candidate(
    survivors: &[&DetectionCandidate],
    side: DocumentSide,
    marker_bonus: f32,
) -> Option<DetectionCandidate> {
    let wanted = side.class_id();
    let markers: Vec<&&DetectionCandidate> = survivors
        .iter()
        .filter(|c| c.class_id == ClassId::Marker)
        .collect();

    let mut best: Option<DetectionCandidate> = None;
    for cand in survivors.iter().filter(|c| c.class_id == wanted) {
        let boost = if side == DocumentSide::Front
            && markers.iter().any(|m| cand.bbox.contains(&m.bbox))
        {
            marker_bonus
        } else {
            0.0
        };
        let boosted = cand.score + boost;
        if best.as_ref().map_or(true, |b| boosted > b.score) {
            best = Some(DetectionCandidate {
                bbox: cand.bbox,
                score: boosted,
                class_id: cand.class_id,
            });
        }
    }
    best
}
