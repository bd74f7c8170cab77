mod cli;

use clap::Parser;

use cli::{Args, Command, CommandError};
use face_attendance::config::Config;

fn load_env() {
    // Load .env file, don't override existing env vars
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

fn run(args: Args) -> Result<(), CommandError> {
    if let Command::Config { action } = args.command {
        return cli::handle_config_action(
            action,
            args.config.as_deref(),
            args.api_url.as_deref(),
        );
    }

    let config = Config::load(args.config.as_deref())?;
    let client = config.client(args.api_url.as_deref())?;
    log::debug!("Using backend at {}", client.base_url());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CommandError::Reported(format!("Failed to create async runtime: {}", e)))?;

    rt.block_on(async {
        match args.command {
            Command::Register {
                name,
                photo,
                replay,
            } => {
                cli::register(&config, &client, name, photo.as_deref(), replay.as_deref()).await
            }
            Command::Mark { photo } => cli::mark(&client, &photo).await,
            Command::Attendance => cli::attendance(&client).await,
            Command::Session { replay, manual } => {
                cli::session(&config, &client, &replay, manual).await
            }
            Command::Config { .. } => Ok(()),
        }
    })
}

fn main() {
    // Load .env file before anything else
    load_env();
    init_logging();

    let args = Args::parse();

    match run(args) {
        Ok(()) => {}
        Err(CommandError::Reported(message)) => {
            eprintln!("{}", message);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
