//! Testing utilities for the capture pipeline.
//!
//! Provides synthetic frames and landmark meshes with known quality
//! characteristics, plus scripted stand-ins for the model and frame
//! collaborators, enabling deterministic offline testing of the full
//! decision loop.

pub mod mock;
pub mod synthetic;

pub use mock::{
    ScriptedDetector, ScriptedFaceModel, ScriptedLandmarks, SequenceFrameSource, StaticFrameSource,
};
pub use synthetic::{
    attr_major_output, checkerboard_frame, detection_row, document_frame, flat_frame,
    gradient_frame, landmark_set, row_major_output,
};
