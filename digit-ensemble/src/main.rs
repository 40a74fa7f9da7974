//! digit-ensemble - range-classifier digit recognizer
//!
//! Loads the configured range classifiers and recognizes handwritten digits
//! either from one image file, from a replayed capture feed, or
//! interactively from commands on stdin.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use digit_common::{DisplayEvent, EnsembleConfig, EventBus};
use digit_ensemble::capture::DirectoryConnector;
use digit_ensemble::classifier::RemoteClassifierLoader;
use digit_ensemble::logging;
use digit_ensemble::{ConsoleSink, DisplaySink, Ensemble, Mode, SamplingController, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Command-line arguments for digit-ensemble
#[derive(Parser, Debug)]
#[command(name = "digit-ensemble")]
#[command(about = "Handwritten digit recognition with an ensemble of range classifiers")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "DIGIT_ENSEMBLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the digit in one image file
    Classify {
        /// Image file to classify
        image: PathBuf,
    },
    /// Sample the capture feed until Ctrl+C
    Watch {
        /// Directory of frames to replay (overrides capture.source)
        #[arg(long, value_name = "DIR")]
        frames: Option<PathBuf>,
    },
    /// Interactive session driven by stdin commands
    Session,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_control = logging::init();
    let args = Args::parse();

    info!("Starting digit-ensemble v{}", env!("CARGO_PKG_VERSION"));

    let mut config = EnsembleConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;
    log_control.apply_config(&config.logging);

    match args.command {
        Command::Classify { image } => classify(&config, &image).await,
        Command::Watch { frames } => {
            if let Some(frames) = frames {
                config.capture.source = frames;
            }
            watch(&config).await
        }
        Command::Session => interactive(&config).await,
    }
}

/// Load the ensemble and wrap it in a session
async fn build_session(config: &EnsembleConfig) -> Result<Session> {
    let sink: Arc<dyn DisplaySink> = Arc::new(ConsoleSink);

    let loader = RemoteClassifierLoader::new().context("Failed to create classifier loader")?;
    let ensemble = Ensemble::load(config, &loader, sink.as_ref())
        .await
        .context("Failed to load models")?;

    let event_bus = EventBus::new(64);
    spawn_state_logger(&event_bus);

    let controller = SamplingController::new(
        ensemble,
        Arc::new(DirectoryConnector),
        config.capture.clone(),
        config.throttle_interval(),
        sink,
    )
    .with_event_bus(event_bus);

    Ok(Session::new(
        controller,
        config.mode_strategy,
        config.tick_interval(),
    ))
}

/// Log controller lifecycle transitions
fn spawn_state_logger(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(DisplayEvent::EngineStateChanged {
                    old_state,
                    new_state,
                    ..
                }) => info!("State: {} -> {}", old_state, new_state),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!("State logger skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

async fn classify(config: &EnsembleConfig, image: &Path) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;

    let mut session = build_session(config).await?;
    let outcome = session
        .submit_upload(bytes)
        .await
        .with_context(|| format!("Failed to classify {}", image.display()))?;
    info!("Outcome: {}", outcome);

    session.shutdown().await;
    Ok(())
}

async fn watch(config: &EnsembleConfig) -> Result<()> {
    let mut session = build_session(config).await?;
    session
        .start_capture()
        .await
        .context("Failed to start capture")?;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, shutting down");

    if let Some(summary) = session.shutdown().await {
        info!(
            "Capture summary: {} ticks, {} published, {} throttled, {} failed",
            summary.ticks, summary.published, summary.throttled, summary.failed
        );
    }
    Ok(())
}

/// One line of interactive input
#[derive(Debug, PartialEq)]
enum SessionCommand {
    Empty,
    /// Camera button (toggle capture)
    Camera,
    /// Select a mode
    Select(Mode),
    Stop,
    /// Upload an image file
    Image(PathBuf),
    /// `image` typed without a path
    MissingImagePath,
    Quit,
    Unknown(String),
}

impl SessionCommand {
    fn parse(line: &str) -> Self {
        let (command, argument) = match line.trim().split_once(char::is_whitespace) {
            Some((command, argument)) => (command, argument.trim()),
            None => (line.trim(), ""),
        };

        match command {
            "" => SessionCommand::Empty,
            "camera" => SessionCommand::Camera,
            "capture" => SessionCommand::Select(Mode::Capture),
            "single" => SessionCommand::Select(Mode::SingleImage),
            "stop" => SessionCommand::Stop,
            "image" if argument.is_empty() => SessionCommand::MissingImagePath,
            "image" => SessionCommand::Image(PathBuf::from(argument)),
            "quit" | "exit" => SessionCommand::Quit,
            other => SessionCommand::Unknown(other.to_string()),
        }
    }
}

/// Commands: `camera`, `capture`, `single`, `image <path>`, `stop`, `quit`
async fn interactive(config: &EnsembleConfig) -> Result<()> {
    let mut session = build_session(config).await?;

    if config.auto_start_capture {
        // Failure is already on the display; the session stays usable
        if let Err(e) = session.start_capture().await {
            warn!("Auto-start failed: {}", e);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                None
            }
        };
        let Some(line) = line else { break };

        let command = SessionCommand::parse(&line);
        let result = match &command {
            SessionCommand::Empty => Ok(()),
            SessionCommand::Camera => session.toggle_capture().await,
            SessionCommand::Select(mode) => session.select_mode(*mode).await,
            SessionCommand::Stop => {
                session.stop_capture().await;
                Ok(())
            }
            SessionCommand::Image(path) => match tokio::fs::read(path).await {
                Ok(bytes) => session.submit_upload(bytes).await.map(|_| ()),
                Err(e) => {
                    warn!("Cannot read {}: {}", path.display(), e);
                    continue;
                }
            },
            SessionCommand::MissingImagePath => {
                warn!("Usage: image <path>");
                Ok(())
            }
            SessionCommand::Quit => break,
            SessionCommand::Unknown(other) => {
                warn!("Unknown command: {}", other);
                Ok(())
            }
        };

        // Failures are already on the display
        if let Err(e) = result {
            debug!("Command {:?} failed: {}", command, e);
        }
    }

    session.shutdown().await;
    info!("Session ended");
    Ok(())
}
