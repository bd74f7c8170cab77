//! Wire types for the attendance backend.

use serde::Deserialize;

/// Response from `POST /register`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response from `POST /capture/auto`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CaptureResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub attendance_marked: Option<bool>,
    /// Name of the recognized user, on success
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// When attendance was recorded, on success
    #[serde(default)]
    pub time: Option<String>,
}

impl CaptureResponse {
    /// Whether the backend recorded attendance for this capture.
    pub fn is_marked(&self) -> bool {
        self.status.as_deref() == Some("success") || self.attendance_marked == Some(true)
    }
}

/// One recognition event as returned by `GET /attendance`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub name: String,
    /// ISO-8601 timestamp; UTC when it carries no offset
    pub time: String,
}

/// Response from `GET /attendance`, newest first.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct AttendanceList {
    #[serde(default)]
    pub records: Vec<AttendanceRecord>,
}

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Deserialize, Default)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    /// FastAPI validation errors use `detail`
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub(crate) fn into_message(self) -> Option<String> {
        if let Some(message) = self.message {
            return Some(message);
        }
        match self.detail? {
            serde_json::Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}
