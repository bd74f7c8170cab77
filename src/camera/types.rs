//! Camera types and data structures.

use std::fmt;
use std::path::Path;
use std::time::Instant;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Front camera, pointed at the operator (selfie mode)
    #[default]
    User,
    /// Rear camera
    Environment,
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Camera resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// 640x480, what most webcams hand out for a `user` facing request
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::VGA
    }
}

/// What the backend negotiated when the stream was acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub resolution: Resolution,
    pub facing: FacingMode,
}

/// Pixel format of a drawn frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A frame drawn from the live video source.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Raw pixel data in RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Monotonic frame number within the stream
    pub sequence: u64,
    /// Timestamp when frame was drawn
    pub timestamp: Instant,
}

impl VideoFrame {
    /// Build an RGB frame.
    pub fn rgb(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            sequence,
            timestamp: Instant::now(),
        }
    }

    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }

    /// True when the buffer holds exactly `width * height` pixels.
    pub fn is_complete(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize * self.bytes_per_pixel()
    }
}

/// An encoded still image cut from the live stream.
///
/// This is the payload handed to capture handlers and uploaded to the
/// backend as the multipart `file` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillImage {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `image/jpeg`
    pub mime_type: String,
}

impl StillImage {
    pub const JPEG: &'static str = "image/jpeg";

    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: Self::JPEG.to_string(),
        }
    }

    /// Read an image file. The MIME type follows the extension, JPEG if unknown.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = image::ImageFormat::from_path(path)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|_| Self::JPEG.to_string());
        Ok(Self { bytes, mime_type })
    }

    /// File name used when uploading, derived from the MIME type.
    pub fn file_name(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "capture.png",
            _ => "capture.jpg",
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// Camera permission denied by the user or the platform
    PermissionDenied,
    /// No camera matching the request
    DeviceNotFound(String),
    /// Failed to open camera
    OpenFailed(String),
    /// Failed to start video stream
    StreamFailed(String),
    /// A stream is already acquired
    AlreadyRunning,
    /// Operation needs a live stream
    NotStreaming,
    /// The stream has no decodable frame yet
    NoFrame,
    /// Failed to encode a still image
    EncodeFailed(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => {
                write!(f, "Camera access denied or not available")
            }
            CameraError::DeviceNotFound(what) => write!(f, "Camera not found: {}", what),
            CameraError::OpenFailed(msg) => write!(f, "Failed to open camera: {}", msg),
            CameraError::StreamFailed(msg) => write!(f, "Failed to start camera stream: {}", msg),
            CameraError::AlreadyRunning => write!(f, "Camera stream is already running"),
            CameraError::NotStreaming => write!(f, "Camera is off"),
            CameraError::NoFrame => write!(f, "No camera frame available yet"),
            CameraError::EncodeFailed(msg) => write!(f, "Failed to encode still image: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}
