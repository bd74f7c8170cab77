//! AttendanceClient - talks to the face-attendance backend.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::retry::{
    calculate_backoff, is_transient_network_error, is_transient_status, DEFAULT_BACKOFF_BASE,
    DEFAULT_BACKOFF_MAX, DEFAULT_NETWORK_RETRIES,
};
use super::types::{AttendanceList, CaptureResponse, ErrorBody, RegisterResponse};
use crate::camera::StillImage;

/// Environment variable that overrides the backend base URL.
pub const API_BASE_URL_ENV: &str = "FACE_ATTENDANCE_API_BASE_URL";

/// Backend base URL used when nothing else is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default timeout for HTTP requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reject empty or whitespace-only user names before uploading.
pub fn validate_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::EmptyName);
    }
    Ok(())
}

/// Client for the register, capture and attendance endpoints.
///
/// Holds no session state; every call is an independent request.
#[derive(Debug, Clone)]
pub struct AttendanceClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl AttendanceClient {
    /// Create a client from `FACE_ATTENDANCE_API_BASE_URL`, falling back to
    /// [`DEFAULT_API_BASE_URL`].
    pub fn new() -> Result<Self, ApiError> {
        let base_url =
            std::env::var(API_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        Self::with_base_url(base_url)
    }

    /// Create a client for an explicit base URL, e.g. a mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_timeouts(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/').to_string();
        reqwest::Url::parse(&trimmed).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.clone(),
            reason: e.to_string(),
        })?;

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            base_url: trimmed,
            http_client,
        })
    }

    /// Get the base URL (without a trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Register `name` with a face photo.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::EmptyName` / `ApiError::EmptyImage` before any request
    /// is made, `ApiError::Rejected` when the backend refuses the photo
    /// (no face, several faces, duplicate name), `ApiError::Status` for other
    /// non-2xx answers, or `ApiError::HttpError` if the request fails.
    pub async fn register(
        &self,
        name: &str,
        image: &StillImage,
    ) -> Result<RegisterResponse, ApiError> {
        validate_name(name)?;
        if image.is_empty() {
            return Err(ApiError::EmptyImage);
        }

        let form = Form::new()
            .text("name", name.trim().to_string())
            .part("file", image_part(image)?);

        log::debug!("Registering '{}' ({} byte photo)", name.trim(), image.len());
        let response = self
            .http_client
            .post(self.endpoint("register"))
            .multipart(form)
            .send()
            .await?;

        read_json(response).await
    }

    /// Submit a capture for recognition and attendance marking.
    ///
    /// Never retried: a repeated upload could mark attendance twice.
    ///
    /// # Errors
    ///
    /// `ApiError::Rejected` when the backend answers 4xx with a reason (e.g. 404
    /// "Face not recognized"), `ApiError::Status` for other failures,
    /// `ApiError::HttpError` on transport errors.
    pub async fn capture_auto(&self, image: &StillImage) -> Result<CaptureResponse, ApiError> {
        if image.is_empty() {
            return Err(ApiError::EmptyImage);
        }

        let form = Form::new().part("file", image_part(image)?);

        log::debug!("Submitting capture ({} bytes)", image.len());
        let response = self
            .http_client
            .post(self.endpoint("capture/auto"))
            .multipart(form)
            .send()
            .await?;

        read_json(response).await
    }

    /// Fetch all attendance records, newest first.
    pub async fn list_attendance(&self) -> Result<AttendanceList, ApiError> {
        let response = self
            .http_client
            .get(self.endpoint("attendance"))
            .send()
            .await?;

        read_json(response).await
    }

    /// Fetch attendance, retrying transient network and gateway failures.
    pub async fn list_attendance_with_retry(&self) -> Result<AttendanceList, ApiError> {
        self.list_attendance_with_retry_config(
            DEFAULT_NETWORK_RETRIES,
            DEFAULT_BACKOFF_BASE,
            DEFAULT_BACKOFF_MAX,
        )
        .await
    }

    /// Like [`list_attendance_with_retry`](Self::list_attendance_with_retry)
    /// with explicit retry tuning.
    pub async fn list_attendance_with_retry_config(
        &self,
        max_retries: u32,
        backoff_base: Duration,
        backoff_max: Duration,
    ) -> Result<AttendanceList, ApiError> {
        let mut attempt = 0u32;

        loop {
            let last_message = match self.list_attendance().await {
                Ok(list) => return Ok(list),
                Err(ApiError::HttpError(ref e)) if is_transient_network_error(e) => e.to_string(),
                Err(ApiError::Status { status, ref message })
                    if reqwest::StatusCode::from_u16(status)
                        .map(is_transient_status)
                        .unwrap_or(false) =>
                {
                    format!("status {}: {}", status, message)
                }
                Err(e) => return Err(e),
            };

            if attempt >= max_retries {
                log::error!(
                    "Loading attendance failed after {} attempts: {}",
                    attempt + 1,
                    last_message
                );
                return Err(ApiError::NetworkError {
                    message: last_message,
                    attempts: attempt + 1,
                });
            }

            let delay = calculate_backoff(attempt, backoff_base, backoff_max);
            log::warn!(
                "Loading attendance failed (attempt {}/{}): {}. Retrying in {:?}...",
                attempt + 1,
                max_retries + 1,
                last_message,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn image_part(image: &StillImage) -> Result<Part, ApiError> {
    Ok(Part::bytes(image.bytes.clone())
        .file_name(image.file_name())
        .mime_str(&image.mime_type)?)
}

/// Decode a 2xx JSON body, or turn an error response into an `ApiError`.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let reason = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(ErrorBody::into_message);

    match reason {
        Some(message) if status.is_client_error() => {
            log::info!("Backend refused request ({}): {}", status, message);
            Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            })
        }
        reason => Err(ApiError::Status {
            status: status.as_u16(),
            message: reason.unwrap_or(text),
        }),
    }
}

/// Errors that can occur when talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The backend understood the request and said no.
    #[error("{message}")]
    Rejected {
        /// HTTP status code (4xx)
        status: u16,
        /// Reason given by the backend
        message: String,
    },

    #[error("API request failed with status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Reason or raw body
        message: String,
    },

    #[error("Network error: {message} (after {attempts} attempts)")]
    NetworkError {
        /// Last transport error seen
        message: String,
        /// Number of attempts made before giving up
        attempts: u32,
    },

    #[error("Please provide a name")]
    EmptyName,

    #[error("Image is empty")]
    EmptyImage,

    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
