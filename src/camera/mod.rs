//! Camera stream module.
//!
//! This module provides the media side of a capture session:
//! - Platform capability interface via [`MediaBackend`]
//! - Stream ownership via [`MediaSession`]
//! - Frame and still types via [`VideoFrame`] and [`StillImage`]

mod backend;
mod encode;
mod session;
mod types;

pub use backend::MediaBackend;
pub use encode::{encode_jpeg, JPEG_QUALITY};
pub use session::MediaSession;
pub use types::{
    CameraError, FacingMode, FrameFormat, Resolution, StillImage, StreamInfo, VideoFrame,
};
