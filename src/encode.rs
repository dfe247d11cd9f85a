//! Encoding of accepted crops into the emitted capture artifact.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};

use crate::errors::PipelineError;
use crate::types::{CaptureFormat, Frame};

/// Encode an RGB frame into the requested raster format.
pub fn encode_frame(frame: &Frame, format: CaptureFormat) -> Result<Vec<u8>, PipelineError> {
    let img = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or_else(
        || PipelineError::Encode(format!("buffer does not match {}x{}", frame.width, frame.height)),
    )?;

    let mut buf = Vec::new();
    match format {
        CaptureFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| PipelineError::Encode(e.to_string()))?;
        }
        CaptureFormat::Jpeg(quality) => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
            img.write_with_encoder(encoder)
                .map_err(|e| PipelineError::Encode(e.to_string()))?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::synthetic::checkerboard_frame;

    #[test]
    fn test_png_magic_bytes() {
        let frame = checkerboard_frame(32, 32, 4, 40, 220);
        let bytes = encode_frame(&frame, CaptureFormat::Png).unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_jpeg_magic_bytes() {
        let frame = checkerboard_frame(32, 32, 4, 40, 220);
        let bytes = encode_frame(&frame, CaptureFormat::Jpeg(92)).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
