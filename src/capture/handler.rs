use async_trait::async_trait;
use thiserror::Error;

use super::state::Verdict;
use crate::camera::StillImage;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("backend request failed: {0}")]
    Backend(String),
    #[error("could not prepare capture: {0}")]
    Capture(String),
}

/// Receives every still the controller captures, auto or manual.
#[async_trait]
pub trait CaptureHandler: Send {
    async fn handle(&mut self, still: StillImage) -> Result<Verdict, HandlerError>;
}
