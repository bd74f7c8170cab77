//! Recorded capture sessions.
//!
//! A replay directory stands in for a webcam and a face detection model. It
//! holds still images and a `session.json` manifest:
//!
//! ```json
//! {
//!   "frame_ms": 250,
//!   "loop": false,
//!   "frames": [
//!     { "file": "0001.jpg", "faces": [{ "x": 120, "y": 80, "width": 160, "height": 160 }] },
//!     { "file": "0002.jpg", "faces": [] }
//!   ]
//! }
//! ```
//!
//! Frames play back in real time, one every `frame_ms`. The faces listed for
//! a frame are what the detector reports for it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::camera::{
    CameraError, FacingMode, MediaBackend, Resolution, StreamInfo, VideoFrame,
};
use crate::detect::{BoundingBox, DetectorOptions, FaceDetector, SamplerError};

pub const MANIFEST_FILE: &str = "session.json";

const DEFAULT_FRAME_MS: u64 = 250;

fn default_frame_ms() -> u64 {
    DEFAULT_FRAME_MS
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid replay manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode frame {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("replay session has no frames")]
    Empty,
    #[error("frame_ms must be greater than zero")]
    ZeroFramePeriod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayManifest {
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayFrame {
    pub file: String,
    #[serde(default)]
    pub faces: Vec<BoundingBox>,
}

/// A decoded replay directory.
#[derive(Debug, Clone)]
pub struct ReplaySession {
    frames: Arc<Vec<VideoFrame>>,
    faces: Arc<Vec<Vec<BoundingBox>>>,
    period: Duration,
    looping: bool,
}

impl ReplaySession {
    /// Read the manifest in `dir` and decode every frame it lists.
    pub fn open(dir: &Path) -> Result<Self, ReplayError> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path).map_err(|source| ReplayError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let manifest: ReplayManifest =
            serde_json::from_str(&content).map_err(|source| ReplayError::Manifest {
                path: manifest_path,
                source,
            })?;
        Self::from_manifest(dir, manifest)
    }

    pub fn from_manifest(dir: &Path, manifest: ReplayManifest) -> Result<Self, ReplayError> {
        if manifest.frames.is_empty() {
            return Err(ReplayError::Empty);
        }
        if manifest.frame_ms == 0 {
            return Err(ReplayError::ZeroFramePeriod);
        }

        let mut frames = Vec::with_capacity(manifest.frames.len());
        let mut faces = Vec::with_capacity(manifest.frames.len());
        for (index, entry) in manifest.frames.into_iter().enumerate() {
            let path = dir.join(&entry.file);
            let rgb = image::open(&path)
                .map_err(|source| ReplayError::Image {
                    path: path.clone(),
                    source,
                })?
                .to_rgb8();
            let (width, height) = rgb.dimensions();
            frames.push(VideoFrame::rgb(rgb.into_raw(), width, height, index as u64));
            faces.push(entry.faces);
        }

        log::info!(
            "Loaded replay session from {} ({} frames, {} ms each)",
            dir.display(),
            frames.len(),
            manifest.frame_ms
        );

        Ok(Self {
            frames: Arc::new(frames),
            faces: Arc::new(faces),
            period: Duration::from_millis(manifest.frame_ms),
            looping: manifest.looping,
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame_period(&self) -> Duration {
        self.period
    }

    pub fn camera(&self) -> ReplayCamera {
        ReplayCamera {
            frames: Arc::clone(&self.frames),
            period: self.period,
            looping: self.looping,
            started: None,
        }
    }

    pub fn detector(&self) -> ReplayDetector {
        ReplayDetector {
            faces: Arc::clone(&self.faces),
        }
    }
}

/// Plays recorded frames as a camera stream.
#[derive(Debug)]
pub struct ReplayCamera {
    frames: Arc<Vec<VideoFrame>>,
    period: Duration,
    looping: bool,
    started: Option<Instant>,
}

impl ReplayCamera {
    /// Frames elapsed since the stream was acquired.
    fn position(&self) -> Option<u64> {
        let started = self.started?;
        let elapsed = started.elapsed().as_millis();
        Some((elapsed / self.period.as_millis().max(1)) as u64)
    }

    fn finished(&self) -> bool {
        match self.position() {
            Some(pos) => !self.looping && pos >= self.frames.len() as u64,
            None => true,
        }
    }
}

#[async_trait]
impl MediaBackend for ReplayCamera {
    async fn acquire_stream(&mut self, facing: FacingMode) -> Result<StreamInfo, CameraError> {
        let first = self
            .frames
            .first()
            .ok_or_else(|| CameraError::DeviceNotFound("empty replay session".to_string()))?;
        self.started = Some(Instant::now());
        Ok(StreamInfo {
            resolution: Resolution {
                width: first.width,
                height: first.height,
            },
            facing,
        })
    }

    fn release_stream(&mut self) {
        self.started = None;
    }

    fn draw_frame(&mut self) -> Option<VideoFrame> {
        if self.finished() {
            return None;
        }
        let pos = self.position()?;
        let index = (pos % self.frames.len() as u64) as usize;
        let mut frame = self.frames.get(index)?.clone();
        frame.sequence = pos;
        frame.timestamp = std::time::Instant::now();
        Some(frame)
    }

    fn is_live(&self) -> bool {
        !self.finished()
    }
}

/// Reports the faces recorded for each frame.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    faces: Arc<Vec<Vec<BoundingBox>>>,
}

#[async_trait]
impl FaceDetector for ReplayDetector {
    async fn load_model(&self) -> Result<(), SamplerError> {
        Ok(())
    }

    async fn detect(
        &self,
        frame: &VideoFrame,
        _options: &DetectorOptions,
    ) -> Result<Vec<BoundingBox>, SamplerError> {
        if self.faces.is_empty() {
            return Ok(Vec::new());
        }
        let index = (frame.sequence % self.faces.len() as u64) as usize;
        Ok(self.faces.get(index).cloned().unwrap_or_default())
    }
}
