//! Unit and mock HTTP tests for AttendanceClient and the views built on it.
//!
//! These tests cover:
//! - Client creation and configuration
//! - Multipart request formatting
//! - Response and error body parsing
//! - Attendance retry
//! - Dashboard and registration flows against a mock backend

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use face_attendance::api::{ApiError, AttendanceClient, DEFAULT_API_BASE_URL};
use face_attendance::camera::StillImage;
use face_attendance::capture::{CaptureHandler, Verdict};
use face_attendance::views::{
    Dashboard, DashboardUpdate, RegisterForm, DEFAULT_POLL_INTERVAL, MESSAGE_TTL,
};

fn still() -> StillImage {
    StillImage::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3])
}

// === Client Creation Tests ===

#[test]
fn test_with_base_url_creates_client() {
    let client = AttendanceClient::with_base_url("http://backend.test/api/v1").unwrap();
    assert_eq!(client.base_url(), "http://backend.test/api/v1");
}

#[test]
fn test_default_base_url_is_valid() {
    let client = AttendanceClient::with_base_url(DEFAULT_API_BASE_URL).unwrap();
    assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
}

#[tokio::test]
async fn test_register_rejects_empty_name_without_request() {
    let client = AttendanceClient::with_base_url("http://localhost:9").unwrap();
    let result = client.register("   ", &still()).await;
    assert!(matches!(result, Err(ApiError::EmptyName)));
}

#[tokio::test]
async fn test_capture_rejects_empty_image_without_request() {
    let client = AttendanceClient::with_base_url("http://localhost:9").unwrap();
    let result = client.capture_auto(&StillImage::jpeg(Vec::new())).await;
    assert!(matches!(result, Err(ApiError::EmptyImage)));
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let client = AttendanceClient::with_base_url("http://127.0.0.1:9/api/v1").unwrap();
    let result = client.list_attendance().await;
    assert!(matches!(result, Err(ApiError::HttpError(_))));
}

// === Mock HTTP Tests ===

mod mock_http_tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AttendanceClient {
        AttendanceClient::with_base_url(format!("{}/api/v1", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_register_sends_name_and_file() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .and(body_string_contains("name=\"name\""))
            .and(body_string_contains("Asha Rao"))
            .and(body_string_contains("name=\"file\""))
            .and(body_string_contains("image/jpeg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "message": "User Asha Rao registered"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let resp = client.register(" Asha Rao ", &still()).await.unwrap();
        assert_eq!(resp.message.as_deref(), Some("User Asha Rao registered"));
        assert_eq!(resp.status.as_deref(), Some("success"));
    }

    #[tokio::test]
    async fn test_capture_auto_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/capture/auto"))
            .and(body_string_contains("name=\"file\""))
            .and(body_string_contains("filename=\"capture.jpg\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "attendance_marked": true,
                "user": "Asha",
                "time": "2024-03-01T10:00:00"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let resp = client_for(&mock_server)
            .capture_auto(&still())
            .await
            .unwrap();
        assert!(resp.is_marked());
        assert_eq!(resp.user.as_deref(), Some("Asha"));
        assert_eq!(resp.time.as_deref(), Some("2024-03-01T10:00:00"));
    }

    #[tokio::test]
    async fn test_capture_auto_not_recognized_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/capture/auto"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "status": "error",
                "message": "Face not recognized"
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).capture_auto(&still()).await;
        match result {
            Err(ApiError::Rejected { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "Face not recognized");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fastapi_detail_is_used_as_reason() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "detail": "No face detected in image"
            })))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).register("Asha", &still()).await;
        assert!(matches!(
            result,
            Err(ApiError::Rejected { status: 400, ref message }) if message == "No face detected in image"
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/capture/auto"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server).capture_auto(&still()).await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_list_attendance() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/attendance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [
                    { "name": "Ravi", "time": "2024-03-01T10:05:00" },
                    { "name": "Asha", "time": "2024-03-01T10:00:00+00:00" }
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let list = client_for(&mock_server).list_attendance().await.unwrap();
        assert_eq!(list.records.len(), 2);
        assert_eq!(list.records[0].name, "Ravi");
    }

    #[tokio::test]
    async fn test_list_attendance_retries_gateway_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/attendance"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v1/attendance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{ "name": "Asha", "time": "2024-03-01T10:00:00" }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let list = client_for(&mock_server)
            .list_attendance_with_retry_config(3, Duration::from_millis(5), Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(list.records.len(), 1);
    }

    #[tokio::test]
    async fn test_list_attendance_gives_up_after_retries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/attendance"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3)
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .list_attendance_with_retry_config(2, Duration::from_millis(5), Duration::from_millis(20))
            .await;
        assert!(matches!(
            result,
            Err(ApiError::NetworkError { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_attendance_does_not_retry_client_errors() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/attendance"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = client_for(&mock_server)
            .list_attendance_with_retry_config(3, Duration::from_millis(5), Duration::from_millis(20))
            .await;
        assert!(matches!(result, Err(ApiError::Status { status: 404, .. })));
    }

    // === Dashboard handler ===

    #[tokio::test]
    async fn test_dashboard_handler_accepts_marked_capture() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/capture/auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "user": "Asha"
            })))
            .mount(&mock_server)
            .await;

        let (mut dashboard, mut handler) =
            Dashboard::new(client_for(&mock_server), DEFAULT_POLL_INTERVAL);
        assert_eq!(handler.handle(still()).await, Ok(Verdict::Accepted));
        assert!(dashboard.drain_events(), "a mark should make the log stale");
        assert_eq!(dashboard.message(), "Marked attendance for Asha");
    }

    #[tokio::test]
    async fn test_dashboard_handler_rejects_unknown_face() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/capture/auto"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Face not recognized"
            })))
            .mount(&mock_server)
            .await;

        let (mut dashboard, mut handler) =
            Dashboard::new(client_for(&mock_server), DEFAULT_POLL_INTERVAL);
        assert_eq!(handler.handle(still()).await, Ok(Verdict::Rejected));
        assert!(!dashboard.drain_events());
        assert_eq!(dashboard.message(), "Face not recognized");
    }

    #[tokio::test]
    async fn test_dashboard_handler_unmarked_without_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/capture/auto"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "error" })),
            )
            .mount(&mock_server)
            .await;

        let (mut dashboard, mut handler) =
            Dashboard::new(client_for(&mock_server), DEFAULT_POLL_INTERVAL);
        assert_eq!(handler.handle(still()).await, Ok(Verdict::Rejected));
        dashboard.drain_events();
        assert_eq!(dashboard.message(), "Face not recognized");
    }

    #[tokio::test]
    async fn test_dashboard_handler_server_failure_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/capture/auto"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let (mut dashboard, mut handler) =
            Dashboard::new(client_for(&mock_server), DEFAULT_POLL_INTERVAL);
        assert!(handler.handle(still()).await.is_err());
        dashboard.drain_events();
        assert_eq!(dashboard.message(), "Error capturing image");
    }

    #[tokio::test]
    async fn test_dashboard_load_failure_keeps_records() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/attendance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{ "name": "Asha", "time": "2024-03-01T10:00:00" }]
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/attendance"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let (mut dashboard, _handler) =
            Dashboard::new(client_for(&mock_server), DEFAULT_POLL_INTERVAL);
        dashboard.load_attendance().await.unwrap();
        assert!(dashboard.load_attendance().await.is_err());
        assert_eq!(dashboard.records().len(), 1);
        assert_eq!(dashboard.message(), "Error loading attendance");
    }

    // === Registration form ===

    #[tokio::test]
    async fn test_register_form_success_clears_form() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut form = RegisterForm::new("Asha");
        form.set_photo(still());
        assert!(form.submit(&client_for(&mock_server)).await);
        assert_eq!(form.message(), "User registered successfully");
        assert!(form.name.is_empty());
        assert!(form.photo().is_none());
    }

    #[tokio::test]
    async fn test_register_form_error_keeps_input() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/register"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "message": "Multiple faces detected"
            })))
            .mount(&mock_server)
            .await;

        let mut form = RegisterForm::new("Asha");
        form.set_photo(still());
        assert!(!form.submit(&client_for(&mock_server)).await);
        assert_eq!(form.message(), "Error: Multiple faces detected");
        assert_eq!(form.name, "Asha");
        assert!(form.photo().is_some());
    }

    // === Dashboard session ===

    mod session {
        use super::*;
        use async_trait::async_trait;
        use face_attendance::camera::{
            CameraError, FacingMode, MediaBackend, Resolution, StreamInfo, VideoFrame,
        };
        use face_attendance::capture::{CaptureController, CaptureSettings};
        use face_attendance::detect::{BoundingBox, DetectorOptions, FaceDetector, SamplerError};

        struct StillCamera;

        #[async_trait]
        impl MediaBackend for StillCamera {
            async fn acquire_stream(
                &mut self,
                facing: FacingMode,
            ) -> Result<StreamInfo, CameraError> {
                Ok(StreamInfo {
                    resolution: Resolution::VGA,
                    facing,
                })
            }

            fn release_stream(&mut self) {}

            fn draw_frame(&mut self) -> Option<VideoFrame> {
                Some(VideoFrame::rgb(vec![90; 2 * 2 * 3], 2, 2, 0))
            }
        }

        /// Live until the flag is cleared, like a device being unplugged.
        struct SwitchableCamera {
            live: Arc<AtomicBool>,
        }

        #[async_trait]
        impl MediaBackend for SwitchableCamera {
            async fn acquire_stream(
                &mut self,
                facing: FacingMode,
            ) -> Result<StreamInfo, CameraError> {
                Ok(StreamInfo {
                    resolution: Resolution::VGA,
                    facing,
                })
            }

            fn release_stream(&mut self) {}

            fn draw_frame(&mut self) -> Option<VideoFrame> {
                Some(VideoFrame::rgb(vec![90; 2 * 2 * 3], 2, 2, 0))
            }

            fn is_live(&self) -> bool {
                self.live.load(Ordering::SeqCst)
            }
        }

        struct AlwaysFace;

        #[async_trait]
        impl FaceDetector for AlwaysFace {
            async fn load_model(&self) -> Result<(), SamplerError> {
                Ok(())
            }

            async fn detect(
                &self,
                _frame: &VideoFrame,
                _options: &DetectorOptions,
            ) -> Result<Vec<BoundingBox>, SamplerError> {
                Ok(vec![BoundingBox {
                    x: 0.0,
                    y: 0.0,
                    width: 1.0,
                    height: 1.0,
                    confidence: 0.99,
                }])
            }
        }

        #[tokio::test]
        async fn test_session_marks_and_reloads_attendance() {
            let mock_server = MockServer::start().await;

            Mock::given(method("POST"))
                .and(path("/api/v1/capture/auto"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "status": "success",
                    "user": "Asha"
                })))
                .expect(1)
                .mount(&mock_server)
                .await;
            Mock::given(method("GET"))
                .and(path("/api/v1/attendance"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "records": [{ "name": "Asha", "time": "2024-03-01T10:00:00" }]
                })))
                .mount(&mock_server)
                .await;

            let (mut dashboard, handler) =
                Dashboard::new(client_for(&mock_server), Duration::from_secs(60));
            let settings = CaptureSettings {
                tick_interval: Duration::from_millis(10),
                stability_threshold: 2,
                cooldown: Duration::from_secs(60),
            };
            let mut controller = CaptureController::new(StillCamera, AlwaysFace, handler, settings);
            controller.load_model().await.unwrap();
            controller.start_camera().await.unwrap();

            let stop = Arc::new(AtomicBool::new(false));
            let stopper = Arc::clone(&stop);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(300)).await;
                stopper.store(true, Ordering::SeqCst);
            });

            let mut messages = Vec::new();
            let mut record_loads = 0;
            let mut statuses = Vec::new();
            dashboard
                .run_session(&mut controller, &stop, |update| match update {
                    DashboardUpdate::Status(s) => statuses.push(s),
                    DashboardUpdate::Message(m) => messages.push(m.to_string()),
                    DashboardUpdate::Records(_) => record_loads += 1,
                })
                .await;
            controller.stop_camera();

            let sending = messages.iter().position(|m| m == "Sending...");
            let marked = messages
                .iter()
                .position(|m| m == "Marked attendance for Asha");
            assert!(sending.is_some(), "messages: {:?}", messages);
            assert!(sending < marked, "messages: {:?}", messages);
            // Initial load plus the reload after the mark.
            assert!(record_loads >= 2, "records loaded {} times", record_loads);
            assert!(statuses.iter().any(|s| s == "Cooldown..."));
            assert_eq!(dashboard.records().len(), 1);
            assert_eq!(controller.captures(), 1);
        }

        async fn attendance_requests(server: &MockServer) -> usize {
            server
                .received_requests()
                .await
                .unwrap_or_default()
                .iter()
                .filter(|r| r.url.path() == "/api/v1/attendance")
                .count()
        }

        async fn mount_attendance(server: &MockServer) {
            Mock::given(method("GET"))
                .and(path("/api/v1/attendance"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "records": [{ "name": "Asha", "time": "2024-03-01T10:00:00" }]
                })))
                .mount(server)
                .await;
        }

        /// Samples every 10 ms but never reaches the threshold.
        fn watching_settings() -> CaptureSettings {
            CaptureSettings {
                tick_interval: Duration::from_millis(10),
                stability_threshold: 1_000,
                cooldown: Duration::from_secs(60),
            }
        }

        #[tokio::test]
        async fn test_session_polls_attendance_every_interval() {
            let mock_server = MockServer::start().await;
            mount_attendance(&mock_server).await;

            let poll = Duration::from_millis(100);
            let (mut dashboard, handler) = Dashboard::new(client_for(&mock_server), poll);
            let mut controller =
                CaptureController::new(StillCamera, AlwaysFace, handler, watching_settings());
            controller.load_model().await.unwrap();
            controller.start_camera().await.unwrap();

            let stop = AtomicBool::new(false);
            let mut record_loads = 0;
            let started = std::time::Instant::now();
            tokio::time::timeout(
                Duration::from_secs(5),
                dashboard.run_session(&mut controller, &stop, |update| {
                    if let DashboardUpdate::Records(_) = update {
                        record_loads += 1;
                        if record_loads == 4 {
                            stop.store(true, Ordering::SeqCst);
                        }
                    }
                }),
            )
            .await
            .expect("session should stop after four loads");

            // One load on start, then one per interval.
            assert_eq!(record_loads, 4);
            assert!(started.elapsed() >= 3 * poll, "took {:?}", started.elapsed());
            assert_eq!(attendance_requests(&mock_server).await, 4);
            assert_eq!(controller.captures(), 0);
        }

        #[tokio::test]
        async fn test_session_clears_message_after_ttl() {
            let mock_server = MockServer::start().await;
            mount_attendance(&mock_server).await;
            Mock::given(method("POST"))
                .and(path("/api/v1/capture/auto"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "status": "success",
                    "user": "Asha"
                })))
                .expect(1)
                .mount(&mock_server)
                .await;

            let (mut dashboard, handler) =
                Dashboard::new(client_for(&mock_server), Duration::from_secs(60));
            let settings = CaptureSettings {
                stability_threshold: 2,
                ..watching_settings()
            };
            let mut controller = CaptureController::new(StillCamera, AlwaysFace, handler, settings);
            controller.load_model().await.unwrap();
            controller.start_camera().await.unwrap();

            let stop = AtomicBool::new(false);
            let mut messages = Vec::new();
            let mut marked_at = None;
            let mut cleared_at = None;
            tokio::time::timeout(
                Duration::from_secs(10),
                dashboard.run_session(&mut controller, &stop, |update| {
                    if let DashboardUpdate::Message(m) = update {
                        messages.push(m.to_string());
                        if m == "Marked attendance for Asha" {
                            marked_at = Some(std::time::Instant::now());
                        } else if m.is_empty() && marked_at.is_some() {
                            cleared_at = Some(std::time::Instant::now());
                            stop.store(true, Ordering::SeqCst);
                        }
                    }
                }),
            )
            .await
            .expect("message should be cleared");

            assert_eq!(
                messages,
                vec!["Sending...", "Marked attendance for Asha", ""]
            );
            let shown = cleared_at.unwrap() - marked_at.unwrap();
            assert!(
                shown >= MESSAGE_TTL - Duration::from_millis(50),
                "cleared after {:?}",
                shown
            );
            assert_eq!(dashboard.message(), "");
        }

        #[tokio::test]
        async fn test_session_stops_polling_when_camera_stops() {
            let mock_server = MockServer::start().await;
            mount_attendance(&mock_server).await;

            let live = Arc::new(AtomicBool::new(true));
            let camera = SwitchableCamera {
                live: Arc::clone(&live),
            };
            let (mut dashboard, handler) =
                Dashboard::new(client_for(&mock_server), Duration::from_millis(50));
            let mut controller =
                CaptureController::new(camera, AlwaysFace, handler, watching_settings());
            controller.load_model().await.unwrap();
            controller.start_camera().await.unwrap();

            let unplug = Arc::clone(&live);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                unplug.store(false, Ordering::SeqCst);
            });

            let stop = AtomicBool::new(false);
            tokio::time::timeout(
                Duration::from_secs(5),
                dashboard.run_session(&mut controller, &stop, |_| {}),
            )
            .await
            .expect("session should end with the camera");

            assert!(!stop.load(Ordering::SeqCst));
            assert!(!controller.is_camera_on());
            let loads = attendance_requests(&mock_server).await;
            assert!(loads >= 2, "attendance loaded {} times", loads);

            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(attendance_requests(&mock_server).await, loads);
        }
    }
}
