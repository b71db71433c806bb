//! Voice Runner entry point
//!
//! Runs one session against the microphone (or a scripted voice with
//! `--demo`) on a fixed-timestep loop and reports progress on stdout.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use voice_runner::audio::{AudioLevelMonitor, LoudnessSource, ScriptedVoice};
use voice_runner::consts::{MAX_SUBSTEPS, SIM_DT};
use voice_runner::{SessionController, Settings};

/// Seconds a demo runs before giving up
const DEMO_MAX_SECONDS: f32 = 60.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Shout to cross the bridge", long_about = None)]
struct Cli {
    /// JSON settings file (missing fields keep their defaults)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Seed for the terrain generator
    #[arg(long)]
    seed: Option<u64>,

    /// Drive the runner with a scripted voice instead of the microphone
    #[arg(long)]
    demo: bool,

    /// Give up after this many seconds
    #[arg(long)]
    max_seconds: Option<f32>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load(path).unwrap_or_else(|e| {
            log::warn!("{}; using default settings", e);
            Settings::default()
        }),
        None => Settings::default(),
    };

    log::info!("Voice Runner starting...");
    if cli.demo {
        let limit = cli.max_seconds.or(Some(DEMO_MAX_SECONDS));
        let voice = ScriptedVoice::demo().with_floor(settings.silence_floor_db);
        let session = build_session(settings, voice, cli.seed);
        run(session, limit)
    } else {
        let monitor = AudioLevelMonitor::new(settings.silence_floor_db);
        let session = build_session(settings, monitor, cli.seed);
        run(session, cli.max_seconds)
    }
}

fn build_session<S: LoudnessSource>(
    settings: Settings,
    source: S,
    seed: Option<u64>,
) -> SessionController<S> {
    match seed {
        Some(seed) => SessionController::seeded(settings, source, seed),
        None => SessionController::new(settings, source),
    }
}

/// Fixed-timestep loop until the session ends or time runs out
fn run<S: LoudnessSource>(mut session: SessionController<S>, max_seconds: Option<f32>) -> ExitCode {
    let target = session.state().target;
    session.on_step_count(move |steps| println!("steps: {} / {}", steps, target));
    session.on_outcome(|won| {
        if won {
            println!("You made it across!");
        } else {
            println!("You fell. Game over.");
        }
    });

    session.start();
    println!("steps: 0 / {}", target);

    let started = Instant::now();
    let mut last = started;
    let mut accumulator = 0.0f32;
    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(0.1);
        last = now;
        accumulator += dt;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            session.tick(SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }

        if let Some(won) = session.state().outcome() {
            return if won {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            };
        }

        if max_seconds.is_some_and(|limit| started.elapsed().as_secs_f32() >= limit) {
            log::info!("Time limit reached at {} steps", session.steps());
            session.stop();
            return ExitCode::from(2);
        }

        std::thread::sleep(Duration::from_secs_f32(SIM_DT));
    }
}
