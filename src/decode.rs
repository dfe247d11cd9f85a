//! Detection decoder: raw detector tensor to candidate regions.
//!
//! The document detector emits N rows of `[cx, cy, w, h, c0..ck]` with
//! normalized coordinates and raw class logits. Either axis may hold the
//! row dimension depending on the export; both layouts are supported and
//! anything else is a shape error.

use crate::errors::PipelineError;
use crate::types::{BoundingBox, ClassId, DetectionCandidate};

/// Raw detector output: a flat buffer plus its dimensions.
///
/// The contract is fixed at model load time; no key/index fallback
/// probing happens per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOutput {
    pub data: Vec<f32>,
    pub dims: Vec<usize>,
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Decode a detector output tensor into thresholded candidates.
///
/// Rows below `conf_threshold` (after sigmoid) are dropped. Boxes are
/// converted from normalized center form to corner form in model-space
/// pixels. Returns `PipelineError::Shape` for any unsupported layout.
pub fn decode(
    output: &DetectorOutput,
    num_classes: usize,
    conf_threshold: f32,
    model_size: u32,
) -> Result<Vec<DetectionCandidate>, PipelineError> {
    let attrs = 4 + num_classes;
    let dims = &output.dims;
    if dims.len() != 3 || dims[0] != 1 {
        return Err(PipelineError::Shape { dims: dims.clone() });
    }

    // Identify which axis carries the fixed attribute width.
    let (rows, read) = if dims[1] == attrs {
        // [1, attrs, rows]: attribute-major, transpose on read.
        let n = dims[2];
        (n, Box::new(move |data: &[f32], i: usize, j: usize| data[j * n + i])
            as Box<dyn Fn(&[f32], usize, usize) -> f32>)
    } else if dims[2] == attrs {
        // [1, rows, attrs]: row-major.
        (dims[1], Box::new(move |data: &[f32], i: usize, j: usize| {
            data[i * attrs + j]
        }) as Box<dyn Fn(&[f32], usize, usize) -> f32>)
    } else {
        return Err(PipelineError::Shape { dims: dims.clone() });
    };

    if output.data.len() != dims[1] * dims[2] {
        return Err(PipelineError::Shape { dims: dims.clone() });
    }

    let s = model_size as f32;
    let mut candidates = Vec::new();
    for i in 0..rows {
        let mut best_score = f32::MIN;
        let mut best_class = 0usize;
        for c in 0..num_classes {
            let score = sigmoid(read(&output.data, i, 4 + c));
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        if best_score < conf_threshold {
            continue;
        }
        let class_id = match ClassId::from_index(best_class) {
            Some(id) => id,
            None => continue,
        };
        let cx = read(&output.data, i, 0) * s;
        let cy = read(&output.data, i, 1) * s;
        let w = read(&output.data, i, 2) * s;
        let h = read(&output.data, i, 3) * s;
        candidates.push(DetectionCandidate {
            bbox: BoundingBox::from_center(cx, cy, w, h),
            score: best_score,
            class_id,
        });
    }
    Ok(candidates)
}
