//! Letterbox transform between frame space and the detector's square input.
//!
//! Maps an arbitrary-aspect frame into a fixed SxS canvas without
//! distortion, and exposes the inverse mapping for detector boxes.

use crate::types::{BoundingBox, Frame};

/// Mapping metadata produced by the forward transform.
///
/// Holds everything needed to invert a model-space box back to original
/// frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxMeta {
    pub scale: f32,
    pub pad_x: u32,
    pub pad_y: u32,
    pub new_w: u32,
    pub new_h: u32,
    pub frame_w: u32,
    pub frame_h: u32,
}

/// Scale the frame to fit inside a `model_size` square, centered with
/// black padding. Returns the RGB canvas and the mapping metadata.
pub fn letterbox(frame: &Frame, model_size: u32) -> (Vec<u8>, LetterboxMeta) {
    let s = model_size as f32;
    let scale = (s / frame.width as f32).min(s / frame.height as f32);
    let new_w = ((frame.width as f32 * scale).round() as u32).min(model_size);
    let new_h = ((frame.height as f32 * scale).round() as u32).min(model_size);
    let pad_x = (model_size - new_w) / 2;
    let pad_y = (model_size - new_h) / 2;

    let mut canvas = vec![0u8; (model_size * model_size * 3) as usize];
    // Nearest-neighbour resample into the padded region.
    for y in 0..new_h {
        let src_y = ((y as f32 / scale) as u32).min(frame.height - 1);
        for x in 0..new_w {
            let src_x = ((x as f32 / scale) as u32).min(frame.width - 1);
            let src = ((src_y * frame.width + src_x) * 3) as usize;
            let dst = (((y + pad_y) * model_size + (x + pad_x)) * 3) as usize;
            canvas[dst..dst + 3].copy_from_slice(&frame.data[src..src + 3]);
        }
    }

    let meta = LetterboxMeta {
        scale,
        pad_x,
        pad_y,
        new_w,
        new_h,
        frame_w: frame.width,
        frame_h: frame.height,
    };
    (canvas, meta)
}

/// Convert an RGB canvas into the planar CHW float tensor the detector
/// expects, values normalized to [0, 1].
pub fn to_model_input(rgb: &[u8], model_size: u32) -> Vec<f32> {
    let plane = (model_size * model_size) as usize;
    let mut chw = vec![0.0f32; plane * 3];
    for i in 0..plane {
        chw[i] = rgb[i * 3] as f32 / 255.0;
        chw[plane + i] = rgb[i * 3 + 1] as f32 / 255.0;
        chw[2 * plane + i] = rgb[i * 3 + 2] as f32 / 255.0;
    }
    chw
}

/// Map a model-space box back to original frame pixels.
///
/// Round-trips with the forward mapping to within one pixel.
pub fn unletterbox(bbox: &BoundingBox, meta: &LetterboxMeta, clamp: bool) -> BoundingBox {
    let mapped = BoundingBox::new(
        (bbox.x1 - meta.pad_x as f32) / meta.scale,
        (bbox.y1 - meta.pad_y as f32) / meta.scale,
        (bbox.x2 - meta.pad_x as f32) / meta.scale,
        (bbox.y2 - meta.pad_y as f32) / meta.scale,
    );
    if clamp {
        mapped.clamped(meta.frame_w as f32, meta.frame_h as f32)
    } else {
        mapped
    }
}

/// Map a frame-space box into model space (used by tests and overlays).
pub fn to_model_space(bbox: &BoundingBox, meta: &LetterboxMeta) -> BoundingBox {
    BoundingBox::new(
        bbox.x1 * meta.scale + meta.pad_x as f32,
        bbox.y1 * meta.scale + meta.pad_y as f32,
        bbox.x2 * meta.scale + meta.pad_x as f32,
        bbox.y2 * meta.scale + meta.pad_y as f32,
    )
}
