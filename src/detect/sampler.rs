//! Face presence sampling over an injected detector.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{BoundingBox, DetectorOptions, FrameSample};
use crate::camera::VideoFrame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error("face detection model is not loaded")]
    NotReady,
    #[error("Failed to load face detection models: {0}")]
    ModelLoad(String),
    #[error("Face detection error: {0}")]
    Detection(String),
}

/// A face detection capability (a model runtime, a remote service, a fake).
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Fetch and initialize the model. Called at most once per sampler.
    async fn load_model(&self) -> Result<(), SamplerError>;

    /// Find faces in `frame`.
    async fn detect(
        &self,
        frame: &VideoFrame,
        options: &DetectorOptions,
    ) -> Result<Vec<BoundingBox>, SamplerError>;
}

/// Load state of the detection model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelState {
    #[default]
    NotAttempted,
    Loading,
    Ready,
    Failed(String),
}

/// Wraps a [`FaceDetector`] with an explicit readiness state.
///
/// The model is loaded once. A failed load is remembered and reported on
/// every later [`load`](Self::load) call instead of retrying.
pub struct FaceSampler<D: FaceDetector> {
    detector: D,
    options: DetectorOptions,
    state: ModelState,
}

impl<D: FaceDetector> FaceSampler<D> {
    pub fn new(detector: D) -> Self {
        Self::with_options(detector, DetectorOptions::default())
    }

    pub fn with_options(detector: D, options: DetectorOptions) -> Self {
        Self {
            detector,
            options,
            state: ModelState::NotAttempted,
        }
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ModelState::Ready
    }

    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Load the model if that has not been attempted yet.
    pub async fn load(&mut self) -> Result<(), SamplerError> {
        match &self.state {
            ModelState::Ready => return Ok(()),
            ModelState::Failed(reason) => {
                log::debug!("Not retrying model load after earlier failure");
                return Err(SamplerError::ModelLoad(reason.clone()));
            }
            ModelState::Loading => return Err(SamplerError::NotReady),
            ModelState::NotAttempted => {}
        }

        self.state = ModelState::Loading;
        match self.detector.load_model().await {
            Ok(()) => {
                log::info!("Face detection model loaded");
                self.state = ModelState::Ready;
                Ok(())
            }
            Err(e) => {
                let reason = match e {
                    SamplerError::ModelLoad(reason) | SamplerError::Detection(reason) => reason,
                    SamplerError::NotReady => "model unavailable".to_string(),
                };
                log::warn!("Could not load face detection model: {}", reason);
                self.state = ModelState::Failed(reason.clone());
                Err(SamplerError::ModelLoad(reason))
            }
        }
    }

    /// Detect faces in `frame`, dropping boxes under the score threshold.
    ///
    /// Returns `SamplerError::NotReady` without touching the detector if the
    /// model has not loaded.
    pub async fn detect_faces(&self, frame: &VideoFrame) -> Result<Vec<BoundingBox>, SamplerError> {
        if !self.is_ready() {
            return Err(SamplerError::NotReady);
        }
        let mut faces = self.detector.detect(frame, &self.options).await?;
        faces.retain(|b| b.confidence >= self.options.score_threshold);
        Ok(faces)
    }

    /// Sample one frame.
    pub async fn sample(&self, frame: &VideoFrame) -> Result<FrameSample, SamplerError> {
        let faces = self.detect_faces(frame).await?;
        Ok(FrameSample {
            sequence: frame.sequence,
            faces,
        })
    }
}
