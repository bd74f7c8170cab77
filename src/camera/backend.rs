//! Media capability interface.
//!
//! The capture state machine never talks to a platform camera API directly.
//! Everything it needs from the runtime goes through [`MediaBackend`], so a
//! browser bridge, a native webcam, a recorded session or a test fake can all
//! drive the same controller.

use async_trait::async_trait;

use super::encode::encode_jpeg;
use super::types::{CameraError, FacingMode, StillImage, StreamInfo, VideoFrame};

#[async_trait]
pub trait MediaBackend: Send {
    /// Ask the platform for a camera stream facing `facing`.
    ///
    /// May suspend while the platform shows a permission prompt.
    async fn acquire_stream(&mut self, facing: FacingMode) -> Result<StreamInfo, CameraError>;

    /// Stop every acquired track. Must be safe to call when nothing is held.
    fn release_stream(&mut self);

    /// Draw the current frame of the live stream.
    ///
    /// Returns `None` while the stream has no decodable frame yet.
    fn draw_frame(&mut self) -> Option<VideoFrame>;

    /// Encode a drawn frame into an uploadable still.
    fn encode_frame(&self, frame: &VideoFrame) -> Result<StillImage, CameraError> {
        encode_jpeg(frame)
    }

    /// False once a finite source (e.g. a recording) has run out of frames.
    fn is_live(&self) -> bool {
        true
    }
}
