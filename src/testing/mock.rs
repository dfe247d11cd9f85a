//! Scripted collaborators for driving the session loop without real
//! models or a camera.
//!
//! Each mock plays back a scripted sequence of responses, then repeats
//! the final entry forever, so a test can describe a short transient
//! (e.g. one bad tensor) followed by steady-state behavior.

use crate::decode::DetectorOutput;
use crate::errors::PipelineError;
use crate::model::{DocumentDetector, FaceModel, FrameSource, LandmarkModel, ModelInput};
use crate::pose::Landmark;
use crate::types::{FaceDetection, Frame};

fn play<T: Clone>(script: &[T], cursor: &mut usize) -> Option<T> {
    if script.is_empty() {
        return None;
    }
    let item = script[(*cursor).min(script.len() - 1)].clone();
    *cursor += 1;
    Some(item)
}

/// Document detector playing back scripted tensors.
pub struct ScriptedDetector {
    script: Vec<Result<DetectorOutput, PipelineError>>,
    cursor: usize,
    pub calls: usize,
}

impl ScriptedDetector {
    pub fn sequence(script: Vec<Result<DetectorOutput, PipelineError>>) -> Self {
        Self {
            script,
            cursor: 0,
            calls: 0,
        }
    }

    pub fn repeating(output: DetectorOutput) -> Self {
        Self::sequence(vec![Ok(output)])
    }
}

impl DocumentDetector for ScriptedDetector {
    async fn infer(&mut self, _input: &ModelInput) -> Result<DetectorOutput, PipelineError> {
        self.calls += 1;
        play(&self.script, &mut self.cursor)
            .unwrap_or_else(|| Err(PipelineError::Inference("script exhausted".to_string())))
    }
}

/// Face model playing back scripted detection lists.
pub struct ScriptedFaceModel {
    script: Vec<Result<Vec<FaceDetection>, PipelineError>>,
    cursor: usize,
    pub calls: usize,
}

impl ScriptedFaceModel {
    pub fn sequence(script: Vec<Result<Vec<FaceDetection>, PipelineError>>) -> Self {
        Self {
            script,
            cursor: 0,
            calls: 0,
        }
    }

    pub fn repeating(detections: Vec<FaceDetection>) -> Self {
        Self::sequence(vec![Ok(detections)])
    }
}

impl FaceModel for ScriptedFaceModel {
    async fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceDetection>, PipelineError> {
        self.calls += 1;
        play(&self.script, &mut self.cursor)
            .unwrap_or_else(|| Err(PipelineError::Inference("script exhausted".to_string())))
    }
}

/// Landmark model playing back scripted meshes.
pub struct ScriptedLandmarks {
    script: Vec<Result<Option<Vec<Landmark>>, PipelineError>>,
    cursor: usize,
}

impl ScriptedLandmarks {
    pub fn sequence(script: Vec<Result<Option<Vec<Landmark>>, PipelineError>>) -> Self {
        Self { script, cursor: 0 }
    }

    pub fn repeating(mesh: Vec<Landmark>) -> Self {
        Self::sequence(vec![Ok(Some(mesh))])
    }

    /// A model that never finds a mesh.
    pub fn absent() -> Self {
        Self::sequence(vec![Ok(None)])
    }
}

impl LandmarkModel for ScriptedLandmarks {
    async fn landmarks(&mut self, _frame: &Frame) -> Result<Option<Vec<Landmark>>, PipelineError> {
        play(&self.script, &mut self.cursor)
            .unwrap_or_else(|| Err(PipelineError::Inference("script exhausted".to_string())))
    }
}

/// Frame source serving the same frame every tick.
pub struct StaticFrameSource {
    frame: Option<Frame>,
}

impl StaticFrameSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame: Some(frame) }
    }

    /// A source with no frame available.
    pub fn empty() -> Self {
        Self { frame: None }
    }
}

impl FrameSource for StaticFrameSource {
    fn current_frame(&mut self) -> Option<Frame> {
        self.frame.clone()
    }
}

/// Frame source playing a scripted sequence, repeating the last entry.
pub struct SequenceFrameSource {
    script: Vec<Option<Frame>>,
    cursor: usize,
}

impl SequenceFrameSource {
    pub fn new(script: Vec<Option<Frame>>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl FrameSource for SequenceFrameSource {
    fn current_frame(&mut self) -> Option<Frame> {
        play(&self.script, &mut self.cursor).flatten()
    }
}
