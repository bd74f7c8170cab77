//! User registration: a name plus one face photo.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::AttendanceClient;
use crate::camera::StillImage;
use crate::capture::{CaptureHandler, HandlerError, Verdict};

pub const MISSING_INPUT_TEXT: &str = "Please provide name and photo";
pub const PHOTO_READY_TEXT: &str = "Captured photo ready";
pub const REGISTERED_TEXT: &str = "User registered successfully";

/// Holds the latest camera capture for the registration form.
#[derive(Debug, Clone, Default)]
pub struct PhotoCaptureHandler {
    slot: Arc<Mutex<Option<StillImage>>>,
}

impl PhotoCaptureHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the held photo, if any.
    pub fn take(&self) -> Option<StillImage> {
        self.slot.lock().ok()?.take()
    }

    pub fn has_photo(&self) -> bool {
        self.slot.lock().map(|s| s.is_some()).unwrap_or(false)
    }
}

#[async_trait]
impl CaptureHandler for PhotoCaptureHandler {
    async fn handle(&mut self, still: StillImage) -> Result<Verdict, HandlerError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| HandlerError::Capture("photo slot poisoned".to_string()))?;
        log::info!("Holding captured photo ({} bytes)", still.len());
        *slot = Some(still);
        // A held photo ends auto capture; the operator decides what to do with it.
        Ok(Verdict::Rejected)
    }
}

/// The registration form.
#[derive(Debug, Default)]
pub struct RegisterForm {
    pub name: String,
    photo: Option<StillImage>,
    message: String,
}

impl RegisterForm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn photo(&self) -> Option<&StillImage> {
        self.photo.as_ref()
    }

    pub fn set_photo(&mut self, photo: StillImage) {
        self.photo = Some(photo);
    }

    /// Use an image file as the photo.
    pub fn attach_file(&mut self, path: &Path) -> std::io::Result<()> {
        self.photo = Some(StillImage::from_file(path)?);
        Ok(())
    }

    /// Move a camera capture into the form.
    pub fn take_captured(&mut self, handler: &PhotoCaptureHandler) -> bool {
        match handler.take() {
            Some(still) => {
                self.photo = Some(still);
                self.message = PHOTO_READY_TEXT.to_string();
                true
            }
            None => false,
        }
    }

    /// Send the form. On success the name and photo are cleared.
    pub async fn submit(&mut self, client: &AttendanceClient) -> bool {
        let photo = match &self.photo {
            Some(photo) if !self.name.trim().is_empty() => photo,
            _ => {
                self.message = MISSING_INPUT_TEXT.to_string();
                return false;
            }
        };

        match client.register(&self.name, photo).await {
            Ok(resp) => {
                self.message = resp.message.unwrap_or_else(|| REGISTERED_TEXT.to_string());
                self.name.clear();
                self.photo = None;
                true
            }
            Err(e) => {
                log::error!("Registration failed: {}", e);
                self.message = format!("Error: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_photo_handler_holds_capture_and_stops_auto() {
        let mut handler = PhotoCaptureHandler::new();
        let verdict = handler.handle(StillImage::jpeg(vec![1, 2, 3])).await.unwrap();
        assert_eq!(verdict, Verdict::Rejected);
        assert!(handler.has_photo());

        let mut form = RegisterForm::new("Asha");
        assert!(form.take_captured(&handler));
        assert_eq!(form.message(), PHOTO_READY_TEXT);
        assert_eq!(form.photo().unwrap().bytes, vec![1, 2, 3]);
        assert!(!handler.has_photo());
    }

    #[tokio::test]
    async fn test_submit_requires_name_and_photo() {
        let client = AttendanceClient::with_base_url("http://127.0.0.1:9").unwrap();

        let mut form = RegisterForm::new("Asha");
        assert!(!form.submit(&client).await);
        assert_eq!(form.message(), MISSING_INPUT_TEXT);

        let mut form = RegisterForm::new("   ");
        form.set_photo(StillImage::jpeg(vec![1]));
        assert!(!form.submit(&client).await);
        assert_eq!(form.message(), MISSING_INPUT_TEXT);
    }

    #[test]
    fn test_attach_file_uses_extension_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut form = RegisterForm::new("Asha");
        form.attach_file(&path).unwrap();
        assert_eq!(form.photo().unwrap().mime_type, "image/png");
    }
}
