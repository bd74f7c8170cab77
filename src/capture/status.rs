//! Human-readable status for a capture session.

use std::fmt;

use super::state::{Activity, SessionSnapshot};
use crate::detect::ModelState;

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Idle => write!(f, "idle"),
            Activity::CameraOn => write!(f, "camera-on"),
            Activity::CameraOff => write!(f, "camera-off"),
            Activity::NoFace => write!(f, "no-face"),
            Activity::FaceDetected { count, threshold } => {
                write!(f, "Face detected ({}/{})", count, threshold)
            }
            Activity::Capturing => write!(f, "capturing"),
            Activity::ManualCapturing => write!(f, "manual-capturing"),
            Activity::CaptureError => write!(f, "capture-error"),
        }
    }
}

/// The one-line status shown under the camera view.
///
/// Errors win over everything, then model readiness, then cooldown, then
/// whatever the session did last.
pub struct StatusLine<'a>(pub &'a SessionSnapshot);

impl fmt::Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.0;
        if let Some(err) = &snap.camera_error {
            return write!(f, "❌ {}", err);
        }
        match &snap.model {
            ModelState::Failed(_) => return write!(f, "❌ Failed to load face detection models"),
            ModelState::Ready => {}
            _ => return write!(f, "Models not loaded"),
        }
        if snap.cooldown_active {
            return write!(f, "Cooldown...");
        }
        match snap.activity {
            Some(activity) => write!(f, "{}", activity),
            None => write!(f, "idle"),
        }
    }
}

/// Badge text for the camera view corner.
pub fn camera_badge(snapshot: &SessionSnapshot) -> &'static str {
    if snapshot.camera_on {
        "Camera On"
    } else {
        "Camera Off"
    }
}
