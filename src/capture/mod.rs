//! Auto-capture control.
//!
//! - [`CaptureController`] runs the sampling loop and capture policy
//! - [`CaptureHandler`] receives every captured still
//! - [`StatusLine`] renders a [`SessionSnapshot`] for display

mod controller;
mod handler;
mod state;
mod status;

pub use controller::CaptureController;
pub use handler::{CaptureHandler, HandlerError};
pub use state::{
    Activity, CaptureOutcome, CaptureSettings, SessionSnapshot, SessionState, SkipReason,
    TickOutcome, Verdict, DEFAULT_COOLDOWN, DEFAULT_STABILITY_THRESHOLD, DEFAULT_TICK_INTERVAL,
};
pub use status::{camera_badge, StatusLine};
