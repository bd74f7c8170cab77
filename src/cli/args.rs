//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Face-recognition attendance client
#[derive(Parser, Debug)]
#[command(name = "face-attendance")]
#[command(version, about = "Face-recognition attendance client", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides FACE_ATTENDANCE_API_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a user with a face photo
    Register {
        /// User name
        #[arg(long)]
        name: Option<String>,

        /// Photo file to upload
        #[arg(long, conflicts_with = "replay")]
        photo: Option<PathBuf>,

        /// Take the photo from a recorded capture session instead
        #[arg(long)]
        replay: Option<PathBuf>,
    },
    /// Mark attendance from a single photo
    Mark {
        /// Photo file to upload
        #[arg(long)]
        photo: PathBuf,
    },
    /// Print the attendance log
    Attendance,
    /// Run an auto-capture attendance session
    Session {
        /// Recorded capture session directory
        #[arg(long)]
        replay: PathBuf,

        /// Take one manual capture as soon as the camera is on
        #[arg(long)]
        manual: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,
    /// Create default config file
    Init,
}
