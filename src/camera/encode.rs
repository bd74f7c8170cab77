//! Still-image encoding for drawn frames.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use super::types::{CameraError, StillImage, VideoFrame};

/// JPEG quality used for captures. Matches what browsers use for
/// `canvas.toBlob(.., 'image/jpeg')` without an explicit quality.
pub const JPEG_QUALITY: u8 = 92;

/// Encode an RGB frame as a JPEG still.
///
/// Returns `CameraError::EncodeFailed` if the frame buffer does not match its
/// dimensions or the encoder rejects it.
pub fn encode_jpeg(frame: &VideoFrame) -> Result<StillImage, CameraError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(CameraError::EncodeFailed("frame has no pixels".to_string()));
    }
    if !frame.is_complete() {
        return Err(CameraError::EncodeFailed(format!(
            "frame buffer is {} bytes, expected {}",
            frame.data.len(),
            frame.width as usize * frame.height as usize * frame.bytes_per_pixel()
        )));
    }

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
        .encode(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| CameraError::EncodeFailed(e.to_string()))?;

    Ok(StillImage::jpeg(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg_produces_jpeg_magic() {
        let frame = VideoFrame::rgb(vec![128; 8 * 8 * 3], 8, 8, 0);
        let still = encode_jpeg(&frame).unwrap();
        assert_eq!(still.mime_type, "image/jpeg");
        assert_eq!(&still.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_encode_jpeg_rejects_short_buffer() {
        let frame = VideoFrame::rgb(vec![0; 10], 8, 8, 0);
        assert!(matches!(
            encode_jpeg(&frame),
            Err(CameraError::EncodeFailed(_))
        ));
    }

    #[test]
    fn test_encode_jpeg_rejects_empty_frame() {
        let frame = VideoFrame::rgb(Vec::new(), 0, 0, 0);
        assert!(encode_jpeg(&frame).is_err());
    }
}
