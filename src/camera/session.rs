//! Camera stream lifecycle.

use super::backend::MediaBackend;
use super::types::{CameraError, FacingMode, StillImage, StreamInfo, VideoFrame};

/// Sole owner of the camera stream.
///
/// Wraps a [`MediaBackend`] and tracks whether a stream is held. The stream
/// is released on [`stop`](Self::stop) and again, if still held, when the
/// session is dropped, so a view that goes away mid-stream never leaves the
/// camera light on.
pub struct MediaSession<B: MediaBackend> {
    backend: B,
    facing: FacingMode,
    stream: Option<StreamInfo>,
}

impl<B: MediaBackend> std::fmt::Debug for MediaSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSession")
            .field("facing", &self.facing)
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

impl<B: MediaBackend> MediaSession<B> {
    /// Create a session that requests the front (`user`) camera.
    pub fn new(backend: B) -> Self {
        Self::with_facing(backend, FacingMode::User)
    }

    pub fn with_facing(backend: B, facing: FacingMode) -> Self {
        Self {
            backend,
            facing,
            stream: None,
        }
    }

    /// Acquire the camera stream.
    ///
    /// # Errors
    /// * `CameraError::AlreadyRunning` - If a stream is already held
    /// * `CameraError::PermissionDenied` / `DeviceNotFound` / `OpenFailed` -
    ///   Whatever the backend reports; the session stays stopped
    pub async fn start(&mut self) -> Result<StreamInfo, CameraError> {
        if self.stream.is_some() {
            return Err(CameraError::AlreadyRunning);
        }

        match self.backend.acquire_stream(self.facing).await {
            Ok(info) => {
                log::info!(
                    "Camera stream acquired ({}x{}, facing {})",
                    info.resolution.width,
                    info.resolution.height,
                    info.facing
                );
                self.stream = Some(info);
                Ok(info)
            }
            Err(e) => {
                log::error!("Camera error: {}", e);
                // Some platforms hand out partial tracks before failing.
                self.backend.release_stream();
                Err(e)
            }
        }
    }

    /// Release all tracks. Idempotent.
    pub fn stop(&mut self) {
        self.backend.release_stream();
        if self.stream.take().is_some() {
            log::info!("Camera stream released");
        }
    }

    /// True while a stream is held and the source still produces frames.
    pub fn is_active(&self) -> bool {
        self.stream.is_some() && self.backend.is_live()
    }

    /// Negotiated stream parameters, if a stream is held.
    pub fn stream_info(&self) -> Option<StreamInfo> {
        self.stream
    }

    /// Draw the current frame. `None` if the camera is off or not ready.
    pub fn current_frame(&mut self) -> Option<VideoFrame> {
        if self.stream.is_none() {
            return None;
        }
        self.backend.draw_frame()
    }

    /// Draw the current frame and encode it as a still.
    pub fn capture_still(&mut self) -> Result<StillImage, CameraError> {
        if self.stream.is_none() {
            return Err(CameraError::NotStreaming);
        }
        let frame = self.backend.draw_frame().ok_or(CameraError::NoFrame)?;
        self.backend.encode_frame(&frame)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: MediaBackend> Drop for MediaSession<B> {
    fn drop(&mut self) {
        if self.stream.is_some() {
            self.stop();
        }
    }
}
