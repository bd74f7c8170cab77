//! Capture session state and per-tick outcomes.

use std::fmt;
use std::time::Duration;

use crate::detect::{BoundingBox, ModelState};

/// Default sampling period.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Default number of consecutive face ticks before an auto capture.
pub const DEFAULT_STABILITY_THRESHOLD: u32 = 8;

/// Default suppression window after an auto capture.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(5000);

/// Where the capture session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Camera off
    #[default]
    Idle,
    /// Waiting on the platform for a stream
    CameraStarting,
    /// Stream live, sampling not started (model not ready yet)
    CameraOn,
    /// Sampling loop running
    Sampling,
    /// Auto capture in flight
    Capturing,
    /// Stream acquisition failed; start must be called again
    CameraError,
    /// Auto capture disabled until the camera restarts. Manual capture still works.
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::CameraStarting => "camera-starting",
            SessionState::CameraOn => "camera-on",
            SessionState::Sampling => "sampling",
            SessionState::Capturing => "capturing",
            SessionState::CameraError => "camera-error",
            SessionState::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// Controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Sampling period
    pub tick_interval: Duration,
    /// Consecutive face ticks required before auto capture
    pub stability_threshold: u32,
    /// Auto-capture suppression after a capture completes
    pub cooldown: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            stability_threshold: DEFAULT_STABILITY_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// The backend's answer to a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Capture did what it was for (attendance marked). Sampling continues after cooldown.
    Accepted,
    /// Capture was not useful (no match). Auto capture stops for this session.
    Rejected,
}

/// What came of a capture sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Accepted,
    Rejected,
    /// Encoding or the handler failed; the reason is kept for display
    Failed(String),
}

impl From<Verdict> for CaptureOutcome {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Accepted => CaptureOutcome::Accepted,
            Verdict::Rejected => CaptureOutcome::Rejected,
        }
    }
}

/// Why a tick did not sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CameraOff,
    ModelNotReady,
    AutoCaptureStopped,
    Cooldown,
    /// The stream has no frame to draw yet
    FrameNotReady,
}

/// Result of one sampling tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    /// Detection failed; logged and dropped
    DetectionFailed(String),
    NoFace,
    FaceDetected {
        count: u32,
        threshold: u32,
        /// Largest detected face, for overlays
        largest: BoundingBox,
    },
    /// Stability reached and a capture sequence ran
    Captured {
        largest: BoundingBox,
        outcome: CaptureOutcome,
    },
}

impl TickOutcome {
    pub fn captured(&self) -> bool {
        matches!(self, TickOutcome::Captured { .. })
    }
}

/// Latest thing the session did, for status display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    /// Nothing in flight; a capture sequence just finished
    Idle,
    CameraOn,
    CameraOff,
    NoFace,
    FaceDetected { count: u32, threshold: u32 },
    Capturing,
    ManualCapturing,
    CaptureError,
}

/// Point-in-time view of the controller, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub model: ModelState,
    pub camera_on: bool,
    pub stable_count: u32,
    pub threshold: u32,
    pub cooldown_active: bool,
    pub auto_capture_stopped: bool,
    pub captures: u64,
    pub activity: Option<Activity>,
    pub camera_error: Option<String>,
}
