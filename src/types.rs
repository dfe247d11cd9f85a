//! Core data types shared across the capture pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One decoded video frame in RGB24 layout.
///
/// A frame is a logical snapshot for a single decision tick. It is never
/// mutated after construction; crops produce new frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// Total pixel count of the frame.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Extract a rectangular region as a new frame.
    ///
    /// The rectangle is clamped to frame bounds; a degenerate rectangle
    /// yields a 1x1 crop rather than an empty buffer.
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Frame {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let w = w.clamp(1, self.width - x);
        let h = h.clamp(1, self.height - y);

        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for row in y..y + h {
            let start = ((row * self.width + x) * 3) as usize;
            let end = start + (w * 3) as usize;
            data.extend_from_slice(&self.data[start..end]);
        }
        Frame::new(data, w, h)
    }
}

/// The item currently being scanned for capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureTarget {
    Face,
    DocumentFront,
    DocumentBack,
}

impl CaptureTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureTarget::Face => "face",
            CaptureTarget::DocumentFront => "document_front",
            CaptureTarget::DocumentBack => "document_back",
        }
    }
}

/// Detector class labels, matching the document model's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassId {
    DocumentBack,
    DocumentFront,
    Marker,
}

impl ClassId {
    /// Map a class index from the detector output to a label.
    pub fn from_index(index: usize) -> Option<ClassId> {
        match index {
            0 => Some(ClassId::DocumentBack),
            1 => Some(ClassId::DocumentFront),
            2 => Some(ClassId::Marker),
            _ => None,
        }
    }
}

/// Axis-aligned box in corner form (x1, y1, x2, y2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a corner-form box from center form (cx, cy, w, h).
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// True when `inner` lies entirely inside this box.
    pub fn contains(&self, inner: &BoundingBox) -> bool {
        inner.x1 >= self.x1 && inner.y1 >= self.y1 && inner.x2 <= self.x2 && inner.y2 <= self.y2
    }

    /// Clamp all corners into `[0, w] x [0, h]`.
    pub fn clamped(&self, w: f32, h: f32) -> BoundingBox {
        BoundingBox {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }

    /// Integer pixel rectangle (x, y, w, h) after rounding.
    pub fn to_pixel_rect(&self) -> (u32, u32, u32, u32) {
        let x = self.x1.round().max(0.0) as u32;
        let y = self.y1.round().max(0.0) as u32;
        let w = (self.x2.round() - self.x1.round()).max(0.0) as u32;
        let h = (self.y2.round() - self.y1.round()).max(0.0) as u32;
        (x, y, w, h)
    }
}

/// A decoded detector row after thresholding, pre-NMS.
///
/// The box is in model-space pixels; the score has sigmoid applied and the
/// class is the argmax over class scores.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionCandidate {
    pub bbox: BoundingBox,
    pub score: f32,
    pub class_id: ClassId,
}

/// One face detection in normalized center-form coordinates ([0,1] of the
/// frame), as delivered by the face model collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub score: f32,
}

impl FaceDetection {
    /// Normalized area, used to pick the primary face when multiple are
    /// tolerated.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// Measurements computed over a candidate region.
///
/// Pose angles are zero for document targets; coverage equals the area
/// ratio for documents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub aspect_ratio: f32,
    pub area_ratio: f32,
    pub brightness_mean: f32,
    pub brightness_std: f32,
    pub blur_variance: f32,
    pub edge_score: f32,
    pub coverage: f32,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub roll_deg: f32,
}

impl Default for QualityMetrics {
    fn default() -> Self {
        Self {
            aspect_ratio: 0.0,
            area_ratio: 0.0,
            brightness_mean: 0.0,
            brightness_std: 0.0,
            blur_variance: 0.0,
            edge_score: 0.0,
            coverage: 0.0,
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
        }
    }
}

/// Encoded output format for a captured region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    Png,
    /// JPEG with quality 1-100.
    Jpeg(u8),
}

/// One successful capture, emitted exactly once per target acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureResult {
    pub id: Uuid,
    pub target: CaptureTarget,
    pub encoded_image: Vec<u8>,
    pub format: CaptureFormat,
    pub timestamp: DateTime<Utc>,
    pub metrics: QualityMetrics,
}

/// Per-session capture slots, one per target.
///
/// A slot is cleared before re-scanning for its target begins; completeness
/// is only meaningful against the ids present at the time of the check.
#[derive(Debug, Clone, Default)]
pub struct SessionCaptureSet {
    pub face: Option<CaptureResult>,
    pub document_front: Option<CaptureResult>,
    pub document_back: Option<CaptureResult>,
}

impl SessionCaptureSet {
    pub fn slot(&self, target: CaptureTarget) -> Option<&CaptureResult> {
        match target {
            CaptureTarget::Face => self.face.as_ref(),
            CaptureTarget::DocumentFront => self.document_front.as_ref(),
            CaptureTarget::DocumentBack => self.document_back.as_ref(),
        }
    }

    pub fn store(&mut self, result: CaptureResult) {
        match result.target {
            CaptureTarget::Face => self.face = Some(result),
            CaptureTarget::DocumentFront => self.document_front = Some(result),
            CaptureTarget::DocumentBack => self.document_back = Some(result),
        }
    }

    pub fn clear(&mut self, target: CaptureTarget) {
        match target {
            CaptureTarget::Face => self.face = None,
            CaptureTarget::DocumentFront => self.document_front = None,
            CaptureTarget::DocumentBack => self.document_back = None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.face.is_some() && self.document_front.is_some() && self.document_back.is_some()
    }

    /// Capture ids for all three slots, if filled.
    ///
    /// A later recapture of any slot changes the ids, invalidating a
    /// completeness snapshot taken earlier.
    pub fn capture_ids(&self) -> Option<[Uuid; 3]> {
        match (&self.face, &self.document_front, &self.document_back) {
            (Some(f), Some(fr), Some(b)) => Some([f.id, fr.id, b.id]),
            _ => None,
        }
    }
}
