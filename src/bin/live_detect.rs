//! live_detect - webcam object detection with a live overlay
//!
//! This binary:
//! 1. Loads the detection model once
//! 2. Opens the configured camera on start
//! 3. Detects, draws and tallies objects at the display refresh rate
//! 4. Releases the camera on stop, Ctrl-C or timeout

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, IsTerminal};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use live_detect::camera::{devices_for, CameraManager, StreamConstraints};
use live_detect::config::LiveDetectConfig;
use live_detect::controller::{DetectionController, StopHandle};
use live_detect::detect::library_for;
use live_detect::render::OverlayCanvas;
use live_detect::schedule::PacedScheduler;
use live_detect::ui::{ConsoleFrontend, UiMode};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Camera device (`/dev/videoN` or `stub://<name>`).
    #[arg(long, value_name = "DEVICE")]
    camera: Option<String>,
    /// Model path (ONNX file or `stub://<scene>`).
    #[arg(long, value_name = "PATH")]
    model: Option<String>,
    /// Display refresh rate driving the detection loop.
    #[arg(long, value_name = "HZ")]
    refresh_hz: Option<u32>,
    /// Stop automatically after this many seconds.
    #[arg(long)]
    seconds: Option<u64>,
    /// Write a JPEG of the annotated frame once per second.
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,
    /// Wait for `start` / `stop` / `quit` on stdin instead of starting immediately.
    #[arg(long)]
    no_autostart: bool,
    /// Console output: auto, plain or pretty.
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

#[derive(Debug)]
enum Command {
    Start,
    Stop,
    Hidden(bool),
    Quit,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = LiveDetectConfig::load()?;
    if let Some(camera) = args.camera {
        config.camera.device = camera;
    }
    if let Some(model) = args.model {
        config.model.path = model;
    }
    if let Some(hz) = args.refresh_hz {
        config.display.refresh_hz = hz;
    }
    if args.snapshot.is_some() {
        config.display.snapshot_path = args.snapshot;
    }
    config.validate()?;

    let is_tty = std::io::stderr().is_terminal();
    let frontend = ConsoleFrontend::new(UiMode::from_flag(Some(&args.ui)), is_tty);

    let camera = CameraManager::new(
        devices_for(&config.camera)?,
        StreamConstraints::from_settings(&config.camera),
    );
    let mut controller = DetectionController::new(camera, OverlayCanvas::default(), Box::new(frontend))
        .with_display_settings(&config.display);
    let mut scheduler = PacedScheduler::new(config.display.refresh_hz)?;
    let stop = controller.stop_handle();

    let (tx, rx) = mpsc::channel();
    {
        let stop = stop.clone();
        let tx = tx.clone();
        ctrlc::set_handler(move || {
            stop.request_stop();
            let _ = tx.send(Command::Quit);
        })
        .context("error setting Ctrl-C handler")?;
    }

    if let Some(seconds) = args.seconds {
        let stop = stop.clone();
        let tx = tx.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_secs(seconds));
            log::info!("{}s elapsed, stopping", seconds);
            stop.request_stop();
            let _ = tx.send(Command::Quit);
        });
    }

    let library = library_for(&config.model)?;
    if let Err(err) = controller.load_model(library.as_ref()) {
        log::error!("{:#}", anyhow::Error::from(err));
    }

    if !args.no_autostart {
        controller.on_start()?;
        return controller.run(&mut scheduler);
    }

    spawn_stdin_commands(stop, tx);
    log::info!("waiting for commands on stdin (start, stop, hide, show, quit)");
    while let Ok(command) = rx.recv() {
        match command {
            Command::Start => match controller.on_start() {
                Ok(()) => controller.run(&mut scheduler)?,
                Err(err) => log::warn!("start refused: {}", err),
            },
            Command::Stop => controller.on_stop(),
            Command::Hidden(hidden) => controller.on_visibility_change(hidden),
            Command::Quit => break,
        }
    }
    Ok(())
}

/// Forward stdin commands. While the loop is running the main thread is busy, so stop
/// and visibility changes go through the stop handle directly.
fn spawn_stdin_commands(stop: StopHandle, tx: mpsc::Sender<Command>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "start" => Command::Start,
                "stop" if stop.is_detecting() => {
                    stop.request_stop();
                    continue;
                }
                "stop" => Command::Stop,
                "hide" | "show" if stop.is_detecting() => {
                    stop.set_hidden(line.trim() == "hide");
                    continue;
                }
                "hide" => Command::Hidden(true),
                "show" => Command::Hidden(false),
                "quit" | "exit" => {
                    stop.request_stop();
                    Command::Quit
                }
                "" => continue,
                other => {
                    log::warn!("unknown command {:?}", other);
                    continue;
                }
            };
            if tx.send(command).is_err() {
                break;
            }
        }
        let _ = tx.send(Command::Quit);
    });
}
