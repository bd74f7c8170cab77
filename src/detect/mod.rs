//! Face presence detection.
//!
//! The detector itself is an external capability behind [`FaceDetector`];
//! [`FaceSampler`] adds the one-time model load, the readiness gate and the
//! score filtering the capture loop relies on.

mod sampler;
mod types;

pub use sampler::{FaceDetector, FaceSampler, ModelState, SamplerError};
pub use types::{BoundingBox, DetectorOptions, FrameSample};
