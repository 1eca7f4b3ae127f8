#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Castle Defence session.

mod terminal;

use std::{cell::RefCell, rc::Rc, time::Duration};

use anyhow::{Context, Result};
use castle_defence_core::{Event, Rules};
use castle_defence_rendering::{
    Color, FrameInput, Palette, Presentation, RenderingBackend, Scene,
};
use castle_defence_simulation::Session;
use castle_defence_world::{query, SetupError};
use clap::Parser;
use rand::Rng;
use tracing::{debug, error, info};

use crate::terminal::TerminalBackend;

#[derive(Parser, Debug)]
#[command(
    name = "castle-defence",
    version,
    about = "Run a headless Castle Defence session"
)]
struct Cli {
    /// Seed for the castle layout and every random decision.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// Stop after this many frames even if no session ended.
    #[arg(long, default_value_t = 20_000)]
    frames: u64,

    /// Click the lowest-slot unit every N frames.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    click_every: Option<u32>,

    /// Sessions to play back to back; each restart keeps the seeded stream.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    sessions: u32,

    /// Share of a cell edge covered by an obstacle block, in (0, 1].
    #[arg(long, default_value_t = Palette::DEFAULT_OBSTACLE_SCALE)]
    obstacle_scale: f32,

    /// Print the final grid as text.
    #[arg(long)]
    print_grid: bool,
}

/// Restart failure raised inside the frame loop, surfaced once the backend returns.
type RestartFailure = Rc<RefCell<Option<SetupError>>>;

/// Entry point for the Castle Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    debug!(?cli, "parsed arguments");

    let palette = build_palette(&cli)?;
    let session =
        Session::seeded(Rules::default(), cli.seed).context("failed to lay out the castle grid")?;
    println!("{}", query::welcome_banner(session.world()));

    let scene = Scene::from_snapshots(
        session.grid(),
        &session.units(),
        &session.snapshot(),
        palette,
    );
    let presentation = Presentation::new(
        format!("Castle Defence (seed {})", cli.seed),
        Color::from_rgb_u8(245, 245, 245),
        scene,
    );
    let backend = TerminalBackend::new(
        Duration::from_secs(1) / cli.fps,
        cli.frames,
        cli.click_every,
        cli.print_grid,
    );

    let failure = RestartFailure::default();
    backend.run(
        presentation,
        drive_sessions(session, cli.sessions, Rc::clone(&failure)),
    )?;

    let restart_failure = failure.borrow_mut().take();
    match restart_failure {
        Some(error) => Err(error).context("failed to restart session"),
        None => Ok(()),
    }
}

fn build_palette(cli: &Cli) -> Result<Palette> {
    Palette::default()
        .with_obstacle_scale(cli.obstacle_scale)
        .context("invalid --obstacle-scale")
}

/// Builds the per-frame update that ticks `session` and restarts it until
/// `sessions` have been played.
///
/// A failed restart is recorded in `failure` and leaves the session terminal,
/// which stops the backend.
fn drive_sessions<R>(
    mut session: Session<R>,
    sessions: u32,
    failure: RestartFailure,
) -> impl FnMut(Duration, FrameInput, &mut Scene) + 'static
where
    R: Rng + 'static,
{
    let mut remaining = sessions.saturating_sub(1);
    move |dt, input, scene| {
        let events = session.tick(dt, input.click);
        log_progress(&events);

        if remaining > 0 && failure.borrow().is_none() {
            if let Some(outcome) = session.outcome() {
                info!(?outcome, remaining, "starting next session");
                match session.restart() {
                    Ok(()) => {
                        remaining -= 1;
                        scene.rebuild_grid(session.grid());
                    }
                    Err(restart_error) => {
                        error!(error = %restart_error, "failed to restart session");
                        *failure.borrow_mut() = Some(restart_error);
                    }
                }
            }
        }

        scene.refresh(&session.units(), &session.snapshot());
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn log_progress(events: &[Event]) {
    for event in events {
        match event {
            Event::WaveStarted { wave, units } => {
                info!(wave = wave.get(), units = *units, "wave started");
            }
            Event::WaveCleared { wave } => info!(wave = wave.get(), "wave cleared"),
            Event::UnitBreached {
                unit,
                structure_health,
            } => debug!(
                unit = unit.get(),
                structure_health = *structure_health,
                "unit breached"
            ),
            _ => {}
        }
    }
}
