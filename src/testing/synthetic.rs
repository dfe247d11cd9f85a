//! Synthetic frames, landmark meshes, and detector tensors with known
//! quality characteristics.
//!
//! The generators are calibrated against the gate defaults: a
//! checkerboard region passes the blur, edge, and brightness checks, a
//! flat region fails blur and edge, and `landmark_set` produces a mesh
//! whose estimated pose matches the requested angles.

use crate::decode::DetectorOutput;
use crate::pose::{
    Landmark, LEFT_EYE_OUTER, LEFT_NOSTRIL, NOSE_TIP, NOSE_TIP_FALLBACK, RIGHT_EYE_OUTER,
    RIGHT_NOSTRIL,
};
use crate::types::{BoundingBox, Frame};

/// A uniform gray frame. Fails every sharpness and edge check.
pub fn flat_frame(width: u32, height: u32, value: u8) -> Frame {
    Frame::new(vec![value; (width * height * 3) as usize], width, height)
}

/// A two-tone checkerboard with `block`-pixel squares.
///
/// High local contrast everywhere, so crops taken anywhere pass the
/// Laplacian and Sobel thresholds with a wide margin.
pub fn checkerboard_frame(width: u32, height: u32, block: u32, lo: u8, hi: u8) -> Frame {
    let block = block.max(1);
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let value = if ((x / block) + (y / block)) % 2 == 0 {
                lo
            } else {
                hi
            };
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value;
        }
    }
    Frame::new(data, width, height)
}

/// A smooth diagonal gradient, useful for temporal-encoding style checks.
pub fn gradient_frame(width: u32, height: u32) -> Frame {
    let mut data = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let value = (((x + y) * 255) / (width + height).max(1)) as u8;
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = value;
            data[idx + 1] = value;
            data[idx + 2] = value;
        }
    }
    Frame::new(data, width, height)
}

/// A dark frame with a well-textured "card" filling `bbox`.
///
/// The card region is a fine checkerboard, so a crop of the box passes
/// the document gate's photometric checks while the background stays
/// featureless.
pub fn document_frame(width: u32, height: u32, bbox: BoundingBox) -> Frame {
    let mut frame = flat_frame(width, height, 12);
    let clamped = bbox.clamped(width as f32, height as f32);
    let (x0, y0, w, h) = clamped.to_pixel_rect();
    for y in y0..(y0 + h).min(height) {
        for x in x0..(x0 + w).min(width) {
            let value = if ((x / 4) + (y / 4)) % 2 == 0 { 40 } else { 220 };
            let idx = ((y * width + x) * 3) as usize;
            frame.data[idx] = value;
            frame.data[idx + 1] = value;
            frame.data[idx + 2] = value;
        }
    }
    frame
}

fn rotate(x: f32, y: f32, deg: f32) -> (f32, f32) {
    let (sin, cos) = deg.to_radians().sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// A full landmark mesh posed at the given angles (degrees).
///
/// The eye line is rotated by `roll` and the nostril midpoint is offset
/// from the eye midpoint so that the estimator recovers `yaw` and
/// `pitch` under the inter-ocular normalization. Unused indices sit at
/// the mesh center.
pub fn landmark_set(yaw_deg: f32, pitch_deg: f32, roll_deg: f32) -> Vec<Landmark> {
    let at = |x: f32, y: f32| Landmark { x, y, z: 0.0 };
    let mut mesh = vec![at(0.5, 0.5); 478];

    let (mx, my) = (0.5, 0.42);
    let inter = 0.2;

    let (ex, ey) = rotate(inter / 2.0, 0.0, roll_deg);
    mesh[LEFT_EYE_OUTER] = at(mx - ex, my - ey);
    mesh[RIGHT_EYE_OUTER] = at(mx + ex, my + ey);

    // Anchor offset in the de-rolled frame, then rotated into the image.
    let (ax, ay) = rotate(
        yaw_deg / 90.0 * inter,
        pitch_deg / 90.0 * inter,
        roll_deg,
    );
    let (anchor_x, anchor_y) = (mx + ax, my + ay);
    mesh[NOSE_TIP] = at(anchor_x, anchor_y);
    mesh[NOSE_TIP_FALLBACK] = at(anchor_x, anchor_y + 0.01);

    // Nostrils straddle the anchor so their midpoint lands exactly on it.
    let (nx, ny) = rotate(0.02, 0.0, roll_deg);
    mesh[LEFT_NOSTRIL] = at(anchor_x - nx, anchor_y - ny);
    mesh[RIGHT_NOSTRIL] = at(anchor_x + nx, anchor_y + ny);

    mesh
}

fn logit(p: f32) -> f32 {
    let p = p.clamp(1e-6, 1.0 - 1e-6);
    (p / (1.0 - p)).ln()
}

/// One detector row: normalized center-form box plus class logits.
///
/// `confidence` is the post-sigmoid score the decoder should recover for
/// `class_index`; the other classes sit near zero.
pub fn detection_row(
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    class_index: usize,
    confidence: f32,
) -> [f32; 7] {
    let mut row = [cx, cy, w, h, logit(0.02), logit(0.02), logit(0.02)];
    row[4 + class_index] = logit(confidence);
    row
}

/// Pack rows into a `[1, rows, attrs]` tensor.
pub fn row_major_output(rows: &[[f32; 7]]) -> DetectorOutput {
    DetectorOutput {
        data: rows.concat(),
        dims: vec![1, rows.len(), 7],
    }
}

/// Pack rows into a `[1, attrs, rows]` tensor (transposed export).
pub fn attr_major_output(rows: &[[f32; 7]]) -> DetectorOutput {
    let n = rows.len();
    let mut data = vec![0.0f32; n * 7];
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            data[j * n + i] = v;
        }
    }
    DetectorOutput {
        data,
        dims: vec![1, 7, n],
    }
}
