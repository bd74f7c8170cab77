//! Backend REST client.
//!
//! Thin request/response wrapper around the three endpoints the front-end
//! uses: `POST /register`, `POST /capture/auto` and `GET /attendance`.

mod client;
mod retry;
mod types;

pub use client::{
    validate_name, ApiError, AttendanceClient, API_BASE_URL_ENV, DEFAULT_API_BASE_URL,
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT,
};
pub use retry::{calculate_backoff, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX, DEFAULT_NETWORK_RETRIES};
pub use types::{AttendanceList, AttendanceRecord, CaptureResponse, RegisterResponse};
