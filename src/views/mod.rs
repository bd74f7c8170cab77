//! Operator-facing flows built on the capture controller and API client.

mod dashboard;
mod register;
mod table;

pub use dashboard::{
    AttendanceCaptureHandler, Dashboard, DashboardEvent, DashboardUpdate, DEFAULT_POLL_INTERVAL,
    MESSAGE_TTL,
};
pub use register::{
    PhotoCaptureHandler, RegisterForm, MISSING_INPUT_TEXT, PHOTO_READY_TEXT, REGISTERED_TEXT,
};
pub use table::{render_attendance_table, EMPTY_TABLE_TEXT};
