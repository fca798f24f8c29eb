//! # yin-tuner - Terminal String Tuner
//!
//! Thin driver around `yin-tuner-core`: captures the default microphone,
//! feeds fixed-size frames to a tuning session and redraws a one-line cent
//! meter whenever a reading is produced.
//!
//! ## Usage
//! - `yin-tuner [settings.json]` - run, with defaults when no file is given
//! - `yin-tuner --write-settings <path>` - write the default settings and exit
//!
//! Press Enter to stop. Logs go to stderr (`RUST_LOG`), the meter to stdout.
//!
//! ## Architecture
//! - **Audio callback**: slices input into frames, sends them over a bounded channel
//! - **Main thread**: `select!`s over frames and a shutdown signal, runs the session
//! - **Stdin thread**: sends the shutdown signal on Enter or end of input

mod audio;
mod display;
mod settings;

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result, bail};
use cpal::traits::StreamTrait;
use crossbeam_channel::{Receiver, select};
use tracing_subscriber::EnvFilter;
use yin_tuner_core::Session;

use settings::TunerSettings;

/// Frames buffered between the audio callback and the analysis loop.
const FRAME_QUEUE_DEPTH: usize = 4;

/// What the command line asked for.
#[derive(Debug, PartialEq)]
enum Command {
    Run { settings: Option<PathBuf> },
    WriteSettings { path: PathBuf },
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command> {
    let command = match args.next() {
        None => Command::Run { settings: None },
        Some(flag) if flag == "--write-settings" => {
            let Some(path) = args.next() else {
                bail!("--write-settings needs a file path");
            };
            Command::WriteSettings { path: path.into() }
        }
        Some(flag) if flag.starts_with("--") => bail!("unknown option {flag}"),
        Some(path) => Command::Run {
            settings: Some(path.into()),
        },
    };
    if let Some(extra) = args.next() {
        bail!("unexpected argument {extra}");
    }
    Ok(command)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match parse_args(env::args().skip(1))? {
        Command::WriteSettings { path } => {
            settings::save_settings(&TunerSettings::default(), &path)?;
            tracing::info!(path = %path.display(), "default settings written");
            Ok(())
        }
        Command::Run { settings } => {
            let settings = match settings {
                Some(path) => settings::load_settings(&path)?,
                None => TunerSettings::default(),
            };
            run(settings)
        }
    }
}

/// Opens the microphone and runs the tuner until shutdown is requested.
fn run(settings: TunerSettings) -> Result<()> {
    let tuning = settings.tuning.tuning();
    let frame_size = settings.detection.frame_size;

    // Reject detection settings before the device is opened; the real rate is
    // checked again once capture has negotiated it.
    settings
        .detection
        .clone()
        .into_config(f64::from(audio::TARGET_SAMPLE_RATE))
        .context("invalid detection settings")?;

    let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Vec<f32>>(FRAME_QUEUE_DEPTH);
    let capture = audio::start_audio_capture(frame_tx, frame_size)?;

    let config = settings
        .detection
        .clone()
        .into_config(f64::from(capture.sample_rate))
        .context("detection settings do not fit the input sample rate")?;
    let session = Session::new(config, tuning);

    let shutdown_rx = spawn_stdin_watcher();

    tracing::info!("tuner running, play one string at a time (Enter to stop)");
    let result = tuner_loop(&session, &settings, &frame_rx, &shutdown_rx);

    tracing::info!("stopping audio stream");
    if let Err(e) = capture.stream.pause() {
        tracing::error!("error pausing stream: {e}");
    }
    drop(capture);
    println!();
    result
}

/// Sends one message once stdin yields a line or reaches end of input.
fn spawn_stdin_watcher() -> Receiver<()> {
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
        let _ = shutdown_tx.send(());
    });
    shutdown_rx
}

/// Processes frames until shutdown. The last reading stays on screen through
/// silent frames.
fn tuner_loop(
    session: &Session,
    settings: &TunerSettings,
    frame_rx: &Receiver<Vec<f32>>,
    shutdown_rx: &Receiver<()>,
) -> Result<()> {
    let mut stdout = io::stdout().lock();
    loop {
        select! {
            recv(frame_rx) -> msg => {
                let Ok(frame) = msg else {
                    tracing::warn!("audio channel closed");
                    return Ok(());
                };
                match session.process_frame(&frame) {
                    Ok(Some(reading)) => {
                        let line = display::render_line(
                            &reading,
                            settings.in_tune_cents,
                            settings.meter_width,
                        );
                        write!(stdout, "\r\x1b[2K{line}")?;
                        stdout.flush()?;
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("skipping frame: {e}"),
                }
            },
            recv(shutdown_rx) -> _ => {
                tracing::info!("received shutdown signal");
                return Ok(());
            },
        }
    }
}
