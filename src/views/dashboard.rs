//! Attendance dashboard: capture, mark, show the log.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::{ApiError, AttendanceClient, AttendanceRecord};
use crate::camera::{MediaBackend, StillImage};
use crate::capture::{CaptureController, CaptureHandler, HandlerError, StatusLine, Verdict};
use crate::detect::FaceDetector;

/// How often attendance is reloaded while the camera is on.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// How long a capture message stays up.
pub const MESSAGE_TTL: Duration = Duration::from_millis(2500);

/// Sent from the capture handler to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    Message(String),
    /// Attendance was marked; the log is stale
    AttendanceChanged,
}

/// Something the dashboard wants shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardUpdate<'a> {
    Status(String),
    Message(&'a str),
    Records(&'a [AttendanceRecord]),
}

/// Uploads every capture to `/capture/auto` and turns the answer into a verdict.
pub struct AttendanceCaptureHandler {
    client: AttendanceClient,
    events: UnboundedSender<DashboardEvent>,
}

impl AttendanceCaptureHandler {
    pub fn new(client: AttendanceClient, events: UnboundedSender<DashboardEvent>) -> Self {
        Self { client, events }
    }

    fn notify(&self, event: DashboardEvent) {
        // The dashboard may already be gone during shutdown.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl CaptureHandler for AttendanceCaptureHandler {
    async fn handle(&mut self, still: StillImage) -> Result<Verdict, HandlerError> {
        self.notify(DashboardEvent::Message("Sending...".to_string()));

        match self.client.capture_auto(&still).await {
            Ok(resp) if resp.is_marked() => {
                let user = resp.user.as_deref().unwrap_or("unknown user");
                log::info!("Attendance marked for {}", user);
                self.notify(DashboardEvent::Message(format!(
                    "Marked attendance for {}",
                    user
                )));
                self.notify(DashboardEvent::AttendanceChanged);
                Ok(Verdict::Accepted)
            }
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| "Face not recognized".to_string());
                self.notify(DashboardEvent::Message(message));
                Ok(Verdict::Rejected)
            }
            Err(ApiError::Rejected { message, .. }) => {
                self.notify(DashboardEvent::Message(message));
                Ok(Verdict::Rejected)
            }
            Err(e) => {
                log::error!("Capture upload failed: {}", e);
                self.notify(DashboardEvent::Message("Error capturing image".to_string()));
                Err(HandlerError::Backend(e.to_string()))
            }
        }
    }
}

/// Dashboard state: the attendance log and the latest capture message.
pub struct Dashboard {
    client: AttendanceClient,
    events: UnboundedReceiver<DashboardEvent>,
    records: Vec<AttendanceRecord>,
    message: String,
    message_set_at: Option<Instant>,
    poll_interval: Duration,
}

impl Dashboard {
    /// Create a dashboard and the capture handler that reports into it.
    ///
    /// A zero `poll_interval` falls back to [`DEFAULT_POLL_INTERVAL`].
    pub fn new(
        client: AttendanceClient,
        poll_interval: Duration,
    ) -> (Self, AttendanceCaptureHandler) {
        let poll_interval = if poll_interval.is_zero() {
            log::warn!("Zero attendance poll interval, using {:?}", DEFAULT_POLL_INTERVAL);
            DEFAULT_POLL_INTERVAL
        } else {
            poll_interval
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = AttendanceCaptureHandler::new(client.clone(), tx);
        let dashboard = Self {
            client,
            events: rx,
            records: Vec::new(),
            message: String::new(),
            message_set_at: None,
            poll_interval,
        };
        (dashboard, handler)
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Reload the attendance log. On failure the old records stay.
    pub async fn load_attendance(&mut self) -> Result<(), ApiError> {
        match self.client.list_attendance().await {
            Ok(list) => {
                self.records = list.records;
                Ok(())
            }
            Err(e) => {
                log::error!("Loading attendance failed: {}", e);
                self.set_message("Error loading attendance".to_string());
                Err(e)
            }
        }
    }

    /// Apply pending handler events. Returns true if the log should be reloaded.
    pub fn drain_events(&mut self) -> bool {
        let mut stale = false;
        while let Ok(event) = self.events.try_recv() {
            stale |= self.apply_event(event);
        }
        stale
    }

    fn apply_event(&mut self, event: DashboardEvent) -> bool {
        match event {
            DashboardEvent::Message(message) => {
                self.set_message(message);
                false
            }
            DashboardEvent::AttendanceChanged => true,
        }
    }

    fn render_message<F>(&self, last_message: &mut String, render: &mut F)
    where
        F: FnMut(DashboardUpdate<'_>),
    {
        if self.message != *last_message {
            render(DashboardUpdate::Message(&self.message));
            last_message.clone_from(&self.message);
        }
    }

    fn set_message(&mut self, message: String) {
        self.message = message;
        self.message_set_at = Some(Instant::now());
    }

    fn expire_message(&mut self) -> bool {
        match self.message_set_at {
            Some(at) if at.elapsed() >= MESSAGE_TTL => {
                self.message.clear();
                self.message_set_at = None;
                true
            }
            _ => false,
        }
    }

    /// Run the capture loop and attendance polling until `stop` is set or the
    /// camera goes away.
    ///
    /// Attendance is loaded right away and then every poll interval, but
    /// only while the camera is on.
    pub async fn run_session<B, D, F>(
        &mut self,
        controller: &mut CaptureController<B, D, AttendanceCaptureHandler>,
        stop: &AtomicBool,
        mut render: F,
    ) where
        B: MediaBackend,
        D: FaceDetector,
        F: FnMut(DashboardUpdate<'_>),
    {
        if !controller.is_camera_on() {
            return;
        }

        if self.load_attendance().await.is_ok() {
            render(DashboardUpdate::Records(&self.records));
        }

        let mut ticker = controller.ticker();
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately and the log was just loaded.
        poll.tick().await;

        let mut last_status = String::new();
        let mut last_message = self.message.clone();

        while !stop.load(Ordering::SeqCst) && controller.is_camera_on() {
            let mut reload = false;
            tokio::select! {
                _ = ticker.tick() => {
                    // Show handler messages while the upload is in flight.
                    {
                        let tick = controller.tick();
                        tokio::pin!(tick);
                        loop {
                            tokio::select! {
                                biased;
                                Some(event) = self.events.recv() => {
                                    reload |= self.apply_event(event);
                                    self.render_message(&mut last_message, &mut render);
                                }
                                _ = &mut tick => break,
                            }
                        }
                    }

                    let status = StatusLine(&controller.snapshot()).to_string();
                    if status != last_status {
                        render(DashboardUpdate::Status(status.clone()));
                        last_status = status;
                    }
                }
                _ = poll.tick() => reload = true,
            }

            reload |= self.drain_events();
            self.expire_message();
            self.render_message(&mut last_message, &mut render);

            if reload && self.load_attendance().await.is_ok() {
                render(DashboardUpdate::Records(&self.records));
            }
        }
    }
}
