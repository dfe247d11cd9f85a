//! Contracts for the external model and frame collaborators.
//!
//! The pipeline treats the detection model, the face model, and the
//! landmark model as black boxes behind these traits. Each contract is
//! resolved once when the session is built and never re-probed per frame.

use crate::decode::DetectorOutput;
use crate::errors::PipelineError;
use crate::pose::Landmark;
use crate::types::{FaceDetection, Frame};

/// Normalized planar RGB tensor for the document detector, values in
/// [0, 1], spatial size `size` x `size`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub data: Vec<f32>,
    pub size: u32,
}

/// The ID-card detection model.
///
/// Inference may suspend the tick; the session never issues a second
/// call before the first resolves.
#[allow(async_fn_in_trait)]
pub trait DocumentDetector {
    async fn infer(&mut self, input: &ModelInput) -> Result<DetectorOutput, PipelineError>;
}

/// The face detection model, returning zero or more normalized boxes.
#[allow(async_fn_in_trait)]
pub trait FaceModel {
    async fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, PipelineError>;
}

/// The facial landmark model.
///
/// `None` means no landmark set was found this frame, which is a normal
/// "retry" outcome rather than an error.
#[allow(async_fn_in_trait)]
pub trait LandmarkModel {
    async fn landmarks(&mut self, frame: &Frame) -> Result<Option<Vec<Landmark>>, PipelineError>;
}

/// The decoded video stream.
///
/// The source owns the stream lifecycle; the pipeline only ever asks for
/// the current frame and skips the tick when none is available.
pub trait FrameSource {
    fn current_frame(&mut self) -> Option<Frame>;
}
