//! The capture control loop.
//!
//! Samples the live stream on a fixed period, counts consecutive ticks with a
//! face in view, and fires a capture once the count reaches the stability
//! threshold. After a capture the loop cools down; a rejected capture turns
//! auto capture off until the camera is restarted.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::handler::{CaptureHandler, HandlerError};
use super::state::{
    Activity, CaptureOutcome, CaptureSettings, SessionSnapshot, SessionState, SkipReason,
    TickOutcome, Verdict, DEFAULT_TICK_INTERVAL,
};
use crate::camera::{CameraError, MediaBackend, MediaSession, StreamInfo};
use crate::detect::{FaceDetector, FaceSampler, SamplerError};

pub struct CaptureController<B, D, H>
where
    B: MediaBackend,
    D: FaceDetector,
    H: CaptureHandler,
{
    media: MediaSession<B>,
    sampler: FaceSampler<D>,
    handler: H,
    settings: CaptureSettings,
    state: SessionState,
    /// Consecutive ticks with at least one face
    stable_count: u32,
    cooldown_until: Option<Instant>,
    /// Stills handed to the handler over the controller's lifetime
    captures: u64,
    activity: Option<Activity>,
    camera_error: Option<String>,
}

impl<B, D, H> std::fmt::Debug for CaptureController<B, D, H>
where
    B: MediaBackend,
    D: FaceDetector,
    H: CaptureHandler,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("state", &self.state)
            .field("stable_count", &self.stable_count)
            .field("cooldown_until", &self.cooldown_until)
            .field("captures", &self.captures)
            .finish_non_exhaustive()
    }
}

impl<B, D, H> CaptureController<B, D, H>
where
    B: MediaBackend,
    D: FaceDetector,
    H: CaptureHandler,
{
    pub fn new(backend: B, detector: D, handler: H, settings: CaptureSettings) -> Self {
        Self::from_parts(
            MediaSession::new(backend),
            FaceSampler::new(detector),
            handler,
            settings,
        )
    }

    pub fn from_parts(
        media: MediaSession<B>,
        sampler: FaceSampler<D>,
        handler: H,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            media,
            sampler,
            handler,
            settings,
            state: SessionState::Idle,
            stable_count: 0,
            cooldown_until: None,
            captures: 0,
            activity: None,
            camera_error: None,
        }
    }

    /// Load the detection model. Sampling starts here if the camera is already on.
    ///
    /// A failure is final for this controller; calling again returns the same error.
    pub async fn load_model(&mut self) -> Result<(), SamplerError> {
        let result = self.sampler.load().await;
        self.maybe_begin_sampling();
        result
    }

    /// Turn the camera on.
    ///
    /// On failure the session moves to `CameraError` and stays there until
    /// this is called again.
    pub async fn start_camera(&mut self) -> Result<StreamInfo, CameraError> {
        if self.media.is_active() {
            if let Some(info) = self.media.stream_info() {
                return Ok(info);
            }
        }

        // A finished source may still hold its stream.
        self.media.stop();
        self.reset_session();
        self.state = SessionState::CameraStarting;
        self.camera_error = None;

        match self.media.start().await {
            Ok(info) => {
                self.state = SessionState::CameraOn;
                self.activity = Some(Activity::CameraOn);
                self.maybe_begin_sampling();
                Ok(info)
            }
            Err(e) => {
                self.state = SessionState::CameraError;
                self.camera_error = Some(e.to_string());
                self.activity = None;
                Err(e)
            }
        }
    }

    /// Turn the camera off and forget all per-session capture state.
    pub fn stop_camera(&mut self) {
        self.media.stop();
        self.reset_session();
        self.state = SessionState::Idle;
        self.activity = Some(Activity::CameraOff);
    }

    /// Run one sampling tick.
    pub async fn tick(&mut self) -> TickOutcome {
        if !self.media.is_active() {
            return TickOutcome::Skipped(SkipReason::CameraOff);
        }
        self.maybe_begin_sampling();

        let cooling = self.in_cooldown(Instant::now());
        match self.state {
            SessionState::Sampling => {}
            SessionState::Stopped => return TickOutcome::Skipped(SkipReason::AutoCaptureStopped),
            _ if !self.sampler.is_ready() => {
                return TickOutcome::Skipped(SkipReason::ModelNotReady)
            }
            _ => return TickOutcome::Skipped(SkipReason::CameraOff),
        }
        if cooling {
            return TickOutcome::Skipped(SkipReason::Cooldown);
        }

        let Some(frame) = self.media.current_frame() else {
            return TickOutcome::Skipped(SkipReason::FrameNotReady);
        };

        let sample = match self.sampler.sample(&frame).await {
            Ok(sample) => sample,
            Err(e) => {
                log::warn!("Face detection error: {}", e);
                return TickOutcome::DetectionFailed(e.to_string());
            }
        };

        let Some(largest) = sample.largest_face().copied() else {
            self.stable_count = 0;
            self.activity = Some(Activity::NoFace);
            return TickOutcome::NoFace;
        };

        self.stable_count += 1;
        let threshold = self.settings.stability_threshold;
        self.activity = Some(Activity::FaceDetected {
            count: self.stable_count,
            threshold,
        });
        log::debug!(
            "Face detected ({}/{}) in frame {}, {} face(s)",
            self.stable_count,
            threshold,
            sample.sequence,
            sample.faces.len()
        );

        if self.stable_count >= threshold {
            let outcome = self.run_auto_capture().await;
            return TickOutcome::Captured { largest, outcome };
        }

        TickOutcome::FaceDetected {
            count: self.stable_count,
            threshold,
            largest,
        }
    }

    /// Capture now, regardless of stability, cooldown or a stopped auto capture.
    ///
    /// Leaves the stability counter and cooldown untouched. Handler failures
    /// come back as `CaptureOutcome::Failed`; only a missing stream or frame
    /// is an error.
    pub async fn manual_capture(&mut self) -> Result<CaptureOutcome, CameraError> {
        if !self.media.is_active() {
            return Err(CameraError::NotStreaming);
        }
        self.activity = Some(Activity::ManualCapturing);

        let still = match self.media.capture_still() {
            Ok(still) => still,
            Err(e) => {
                log::error!("Manual capture failed: {}", e);
                self.activity = Some(Activity::CaptureError);
                return Err(e);
            }
        };
        self.captures += 1;

        match self.handler.handle(still).await {
            Ok(verdict) => {
                self.activity = Some(Activity::Idle);
                Ok(verdict.into())
            }
            Err(e) => {
                log::error!("Manual capture failed: {}", e);
                self.activity = Some(Activity::CaptureError);
                Ok(CaptureOutcome::Failed(e.to_string()))
            }
        }
    }

    /// A sampling interval that skips missed ticks instead of bursting.
    ///
    /// A zero period falls back to [`DEFAULT_TICK_INTERVAL`].
    pub fn ticker(&self) -> Interval {
        let mut period = self.settings.tick_interval;
        if period.is_zero() {
            log::warn!("Zero sampling interval, using {:?}", DEFAULT_TICK_INTERVAL);
            period = DEFAULT_TICK_INTERVAL;
        }
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker
    }

    /// Drive ticks until `stop` is set or the camera goes away.
    ///
    /// Each tick, including any capture it triggers, finishes before the next
    /// one is polled.
    pub async fn run<F>(&mut self, stop: &AtomicBool, mut on_tick: F)
    where
        F: FnMut(&TickOutcome, &SessionSnapshot),
    {
        let mut ticker = self.ticker();
        while !stop.load(Ordering::SeqCst) && self.media.is_active() {
            ticker.tick().await;
            let outcome = self.tick().await;
            on_tick(&outcome, &self.snapshot());
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            model: self.sampler.state().clone(),
            camera_on: self.media.is_active(),
            stable_count: self.stable_count,
            threshold: self.settings.stability_threshold,
            cooldown_active: self.cooldown_remaining().is_some(),
            auto_capture_stopped: self.state == SessionState::Stopped,
            captures: self.captures,
            activity: self.activity,
            camera_error: self.camera_error.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    pub fn is_camera_on(&self) -> bool {
        self.media.is_active()
    }

    pub fn cooldown_remaining(&self) -> Option<std::time::Duration> {
        let until = self.cooldown_until?;
        let now = Instant::now();
        (now < until).then(|| until - now)
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn media(&self) -> &MediaSession<B> {
        &self.media
    }

    pub fn sampler(&self) -> &FaceSampler<D> {
        &self.sampler
    }

    fn maybe_begin_sampling(&mut self) {
        if self.state == SessionState::CameraOn && self.media.is_active() && self.sampler.is_ready()
        {
            log::debug!("Sampling every {:?}", self.settings.tick_interval);
            self.state = SessionState::Sampling;
        }
    }

    fn reset_session(&mut self) {
        self.stable_count = 0;
        self.cooldown_until = None;
    }

    fn in_cooldown(&mut self, now: Instant) -> bool {
        match self.cooldown_until {
            Some(until) if now < until => true,
            Some(_) => {
                self.cooldown_until = None;
                false
            }
            None => false,
        }
    }

    async fn run_auto_capture(&mut self) -> CaptureOutcome {
        self.state = SessionState::Capturing;
        self.activity = Some(Activity::Capturing);

        let result = self.capture_and_handle().await;

        self.stable_count = 0;
        self.cooldown_until = Some(Instant::now() + self.settings.cooldown);

        match result {
            Ok(Verdict::Accepted) => {
                log::info!("Capture accepted, cooling down for {:?}", self.settings.cooldown);
                self.activity = Some(Activity::Idle);
                self.state = SessionState::Sampling;
                CaptureOutcome::Accepted
            }
            Ok(Verdict::Rejected) => {
                log::info!("Capture rejected, auto capture off until the camera restarts");
                self.activity = Some(Activity::Idle);
                self.state = SessionState::Stopped;
                CaptureOutcome::Rejected
            }
            Err(e) => {
                log::error!("Capture failed: {}", e);
                self.activity = Some(Activity::CaptureError);
                self.state = SessionState::Sampling;
                CaptureOutcome::Failed(e.to_string())
            }
        }
    }

    async fn capture_and_handle(&mut self) -> Result<Verdict, HandlerError> {
        let still = self
            .media
            .capture_still()
            .map_err(|e| HandlerError::Capture(e.to_string()))?;
        self.captures += 1;
        log::debug!("Captured still ({} bytes, {})", still.len(), still.mime_type);
        self.handler.handle(still).await
    }
}
