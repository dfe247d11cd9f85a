//! Photometric measurements over RGB crops.
//!
//! Every heuristic in the quality gates reads these measurements; there is
//! a single grayscale conversion and a single implementation of each
//! estimator so document and face gates cannot drift apart.

use crate::types::Frame;

/// Rec.601 luminance over an RGB24 buffer.
pub fn to_grayscale(frame: &Frame) -> Vec<f32> {
    let mut gray = Vec::with_capacity((frame.width * frame.height) as usize);
    for px in frame.data.chunks_exact(3) {
        gray.push(0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32);
    }
    gray
}

/// Mean and standard deviation of luminance.
pub fn brightness_stats(gray: &[f32]) -> (f32, f32) {
    if gray.is_empty() {
        return (0.0, 0.0);
    }
    let n = gray.len() as f32;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for &g in gray {
        sum += g as f64;
        sum_sq += (g as f64) * (g as f64);
    }
    let mean = sum / n as f64;
    let variance = (sum_sq / n as f64 - mean * mean).max(0.0);
    (mean as f32, variance.sqrt() as f32)
}

/// Variance of a 3x3 discrete Laplacian over luminance.
///
/// Low variance means a flat second-derivative response, i.e. blur.
pub fn laplacian_variance(gray: &[f32], width: usize, height: usize) -> f32 {
    if width < 3 || height < 3 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut n = 0u64;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let idx = y * width + x;
            let lap = gray[idx - width] + gray[idx + width] + gray[idx - 1] + gray[idx + 1]
                - 4.0 * gray[idx];
            sum += lap as f64;
            sum_sq += (lap as f64) * (lap as f64);
            n += 1;
        }
    }
    if n == 0 {
        return 0.0;
    }
    let mean = sum / n as f64;
    ((sum_sq / n as f64) - mean * mean).max(0.0) as f32
}

/// Mean Sobel gradient magnitude sampled along the outer border band.
///
/// A real card crop has strong rectangular edges in its border region;
/// textureless false positives do not. `border_pct` sets the band width
/// as a fraction of each dimension, with a 2 px minimum.
pub fn border_edge_score(gray: &[f32], width: usize, height: usize, border_pct: f32) -> f32 {
    if width < 3 || height < 3 {
        return 0.0;
    }
    let mut mag = vec![0.0f32; width * height];
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let at = |dx: i32, dy: i32| {
                gray[((y as i32 + dy) as usize) * width + (x as i32 + dx) as usize]
            };
            let sx = -at(-1, -1) + at(1, -1) - 2.0 * at(-1, 0) + 2.0 * at(1, 0) - at(-1, 1)
                + at(1, 1);
            let sy = -at(-1, -1) - 2.0 * at(0, -1) - at(1, -1) + at(-1, 1) + 2.0 * at(0, 1)
                + at(1, 1);
            mag[y * width + x] = (sx * sx + sy * sy).sqrt();
        }
    }

    let bw = ((width as f32 * border_pct) as usize).max(2);
    let bh = ((height as f32 * border_pct) as usize).max(2);
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for y in 0..height {
        for x in 0..width {
            let in_band = y < bh || y >= height - bh || x < bw || x >= width - bw;
            if in_band {
                sum += mag[y * width + x] as f64;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        (sum / count as f64) as f32
    }
}
