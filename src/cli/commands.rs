//! Subcommand handlers.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use face_attendance::api::{ApiError, AttendanceClient};
use face_attendance::camera::{CameraError, StillImage};
use face_attendance::capture::{
    camera_badge, CaptureController, CaptureHandler, CaptureOutcome, StatusLine, Verdict,
};
use face_attendance::config::{default_path, write_default, Config, ConfigError};
use face_attendance::replay::{ReplayError, ReplaySession};
use face_attendance::views::{
    render_attendance_table, Dashboard, DashboardUpdate, PhotoCaptureHandler, RegisterForm,
    DEFAULT_POLL_INTERVAL,
};

use super::args::ConfigAction;

static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error("Failed to read {path}: {source}")]
    Photo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to set Ctrl+C handler: {0}")]
    Ctrlc(#[from] ctrlc::Error),
    /// User-facing message, printed as is
    #[error("{0}")]
    Reported(String),
}

/// Stop flag set on Ctrl+C.
pub fn setup_ctrlc_handler() -> Result<&'static AtomicBool, ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })?;
    Ok(&CTRLC_RECEIVED)
}

fn read_photo(path: &Path) -> Result<StillImage, CommandError> {
    StillImage::from_file(path).map_err(|source| CommandError::Photo {
        path: path.display().to_string(),
        source,
    })
}

/// `register`: from a photo file, or from the first capture of a replay.
pub async fn register(
    config: &Config,
    client: &AttendanceClient,
    name: Option<String>,
    photo: Option<&Path>,
    replay: Option<&Path>,
) -> Result<(), CommandError> {
    let mut form = RegisterForm::new(name.unwrap_or_default());

    if let Some(path) = photo {
        form.set_photo(read_photo(path)?);
    } else if let Some(dir) = replay {
        if let Some(still) = capture_photo(config, dir).await? {
            form.set_photo(still);
        }
    }

    if form.submit(client).await {
        println!("{}", form.message());
        Ok(())
    } else {
        Err(CommandError::Reported(form.message().to_string()))
    }
}

/// Run auto capture on a replay until the first photo is held.
async fn capture_photo(config: &Config, dir: &Path) -> Result<Option<StillImage>, CommandError> {
    let replay = ReplaySession::open(dir)?;
    let handler = PhotoCaptureHandler::new();
    let slot = handler.clone();
    let mut controller = CaptureController::new(
        replay.camera(),
        replay.detector(),
        handler,
        config.capture_settings(),
    );

    println!("Loading face detection models...");
    controller
        .load_model()
        .await
        .map_err(|e| CommandError::Reported(e.to_string()))?;
    controller.start_camera().await?;
    println!("{}", camera_badge(&controller.snapshot()));

    let stop = setup_ctrlc_handler()?;
    let done = AtomicBool::new(false);
    let mut last_status = String::new();
    controller
        .run(&done, |outcome, snapshot| {
            let status = StatusLine(snapshot).to_string();
            if status != last_status {
                println!("{}", status);
                last_status = status;
            }
            if outcome.captured() || stop.load(Ordering::SeqCst) {
                done.store(true, Ordering::SeqCst);
            }
        })
        .await;
    controller.stop_camera();

    let mut form = RegisterForm::default();
    if form.take_captured(&slot) {
        println!("{}", form.message());
    } else {
        println!("No photo captured");
    }
    Ok(form.photo().cloned())
}

/// `mark`: one attendance capture from a photo file.
pub async fn mark(client: &AttendanceClient, photo: &Path) -> Result<(), CommandError> {
    let still = read_photo(photo)?;
    let (mut dashboard, mut handler) = Dashboard::new(client.clone(), DEFAULT_POLL_INTERVAL);

    let result = handler.handle(still).await;
    dashboard.drain_events();
    match result {
        Ok(Verdict::Accepted) => {
            println!("{}", dashboard.message());
            Ok(())
        }
        _ => Err(CommandError::Reported(dashboard.message().to_string())),
    }
}

/// `attendance`: print the log.
pub async fn attendance(client: &AttendanceClient) -> Result<(), CommandError> {
    let list = client.list_attendance_with_retry().await?;
    println!("{}", render_attendance_table(&list.records));
    Ok(())
}

/// `session`: auto-capture attendance on a replay until Ctrl+C or the end of the recording.
pub async fn session(
    config: &Config,
    client: &AttendanceClient,
    dir: &Path,
    manual: bool,
) -> Result<(), CommandError> {
    let replay = ReplaySession::open(dir)?;
    let (mut dashboard, handler) = Dashboard::new(client.clone(), config.poll_interval());
    let mut controller = CaptureController::new(
        replay.camera(),
        replay.detector(),
        handler,
        config.capture_settings(),
    );

    println!("Loading face detection models...");
    if let Err(e) = controller.load_model().await {
        // Manual capture still works without a model.
        eprintln!("{}", e);
    }
    controller.start_camera().await?;
    println!("{}", camera_badge(&controller.snapshot()));

    if manual {
        match controller.manual_capture().await? {
            CaptureOutcome::Failed(reason) => log::warn!("Manual capture failed: {}", reason),
            outcome => log::info!("Manual capture: {:?}", outcome),
        }
    }

    let stop = setup_ctrlc_handler()?;
    dashboard
        .run_session(&mut controller, stop, |update| match update {
            DashboardUpdate::Status(status) => println!("[{}]", status),
            DashboardUpdate::Message(message) if !message.is_empty() => println!("{}", message),
            DashboardUpdate::Message(_) => {}
            DashboardUpdate::Records(records) => println!("{}", render_attendance_table(records)),
        })
        .await;

    controller.stop_camera();
    println!("{}", camera_badge(&controller.snapshot()));
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config_path: Option<&Path>,
    api_url: Option<&str>,
) -> Result<(), CommandError> {
    match action {
        ConfigAction::Show => {
            let config = Config::load(config_path)?;
            let settings = config.capture_settings();
            println!("Current configuration:");
            println!("  API base URL: {}", config.resolved_base_url(api_url));
            println!(
                "  Timeouts: {}s request, {}s connect",
                config.api.timeout_secs, config.api.connect_timeout_secs
            );
            println!("  Capture interval: {:?}", settings.tick_interval);
            println!("  Stability threshold: {}", settings.stability_threshold);
            println!("  Cooldown: {:?}", settings.cooldown);
            println!("  Attendance poll: {:?}", config.poll_interval());
            println!();

            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(default_path);
            if path.exists() {
                println!("Config file: {} (exists)", path.display());
            } else {
                println!("Config file: {} (not found)", path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            let path = write_default(config_path)?;
            println!("Created config file: {}", path.display());
            Ok(())
        }
    }
}
