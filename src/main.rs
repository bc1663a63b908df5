//! Dune Runner headless entry point
//!
//! Loads settings (first CLI argument, optional), drives a scripted session
//! at a fixed 60 Hz and logs what the world did. A second argument names a
//! high-score file that is updated with the session's run.

use std::path::Path;
use std::process::ExitCode;

use glam::Vec3;

use dune_runner::consts::FRAME_DT;
use dune_runner::sim::{Aabb, Family, InputCommand, Mesh, ObjectId, Runner};
use dune_runner::{HighScores, RunnerResult, Settings};

/// Length of the scripted session in seconds
const SESSION_SECS: f32 = 60.0;

/// Stand-in for the asset loader: unit handles with per-family sizes
fn placeholder_mesh(id: ObjectId) -> RunnerResult<Mesh<()>> {
    let size = match id.family {
        Family::Terrain => Vec3::new(10.0, 1.0, 6.0),
        Family::Cactus => Vec3::new(1.0, 2.0, 1.0),
        Family::Crow => Vec3::new(1.5, 0.8, 0.8),
        Family::Cloud => Vec3::new(6.0, 2.0, 3.0),
        Family::Obstacle => Vec3::new(1.5, 1.5, 1.5),
    };
    Ok(Mesh::new((), size))
}

fn run_session(settings: Settings, scores_path: Option<&Path>) -> RunnerResult<()> {
    let high_scores = match scores_path {
        Some(path) => HighScores::load(path)?,
        None => HighScores::new(),
    };
    let mut runner = Runner::new(settings, placeholder_mesh)?.with_high_scores(high_scores);
    runner.set_display(Aabb::new(Vec3::new(-24.0, 0.0, 0.0), Vec3::new(24.0, 24.0, 0.0)));
    runner
        .clock_mut()
        .on_pause(|_| log::info!("[ui] pause overlay shown"));
    runner
        .clock_mut()
        .on_resume(|_| log::info!("[ui] pause overlay hidden"));
    runner.run();

    let frames = (SESSION_SECS / FRAME_DT) as u32;
    let pause_at = frames / 3;
    let resume_at = pause_at + 120;
    let mut relocated = 0;
    let mut exhausted = 0;

    for frame in 0..frames {
        if frame == pause_at || frame == resume_at {
            runner.handle(InputCommand::TogglePause);
        }
        let report = runner.frame(FRAME_DT, None);
        relocated += report.recycled.relocated;
        exhausted += report.recycled.exhausted;

        if frame % 600 == 0 {
            log::info!(
                "t={:>5.1}s hour={:>5.2} day={:.2} ambient={:.2?} score={}",
                frame as f32 * FRAME_DT,
                runner.day_night().hour(),
                runner.day_night().day_factor(),
                report.lighting.ambient_color.to_array(),
                runner.score()
            );
        }
    }

    runner.end_run();
    if let Some(path) = scores_path {
        runner.high_scores().save(path)?;
    }
    for pool in runner.pools() {
        log::info!(
            "{:>8}: {} objects, overlaps={}",
            pool.family(),
            pool.len(),
            pool.has_overlaps()
        );
    }
    log::info!(
        "Session done: score {} (rank {:?}), {} relocations ({} without a clear slot)",
        runner.score(),
        runner.last_rank(),
        relocated,
        exhausted
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Dune Runner (headless) starting...");

    let args: Vec<String> = std::env::args().collect();
    let settings = match args.get(1) {
        Some(path) => match Settings::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings from {}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };

    match run_session(settings, args.get(2).map(Path::new)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
