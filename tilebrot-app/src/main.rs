mod app_dir;
mod config;
mod error;
mod format;
mod navigation;
mod plane_name;

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use tilebrot_core::{PlaneState, ViewParams, INSIDE};
use tilebrot_engine::{ComputeOutcome, Engine, EngineConfig};

use config::{AppConfig, WORKERS_ENV};
use error::AppError;
use format::human_number;
use navigation::{navigate, next_zoom, pan, zoom_at, BudgetStep, Pan, Target};

/// How often the progress line is refreshed while a generation runs.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Parser, Debug)]
#[command(author, version, about = "Compute views of the Mandelbrot set, tile by tile")]
struct Arguments {
    /// Start from the view encoded in this file name
    /// (`set_<ts>_<center>_<zoom>_<mode>_.png`).
    #[arg(long, short = 'p')]
    plane: Option<String>,

    /// Return to the default view before any other move.
    #[arg(long)]
    home: bool,

    /// Pan before the first compute; repeat to pan further.
    #[arg(long, value_enum)]
    pan: Vec<Pan>,

    /// Recentre on pixel X Y and zoom in one √2 step before the first
    /// compute.
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    zoom_at: Vec<u32>,

    /// Adjust the iteration budget before the first compute.
    #[arg(long, value_enum)]
    budget: Option<BudgetStep>,

    /// After the first compute, zoom this many √2 steps (negative zooms
    /// out), recomputing after each step.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    zoom_steps: i32,

    /// Finally compute the view off-screen at this multiple of the grid
    /// size.
    #[arg(long)]
    scale: Option<u32>,

    /// Configuration file. Defaults to `tilebrot.json` next to the
    /// executable.
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let arguments = Arguments::parse();
    match run(arguments) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(arguments: Arguments) -> Result<(), AppError> {
    info!("Starting Tilebrot");

    let config_path = arguments.config.unwrap_or_else(app_dir::config_path);
    let app_config = AppConfig::load(&config_path);
    let workers_env = std::env::var(WORKERS_ENV).ok();
    let engine_config = app_config.engine_config(workers_env.as_deref());

    let view = ViewParams::initial(app_config.width, app_config.height)?;
    let engine = Engine::new(engine_config.clone(), view)?;
    engine.set_iteration_budget(app_config.max_steps)?;
    engine.set_color_mode(app_config.color_mode);

    if let Some(name) = arguments.plane.as_deref() {
        // A bad name leaves the default view in place.
        match plane_name::decode(name) {
            Ok(plane) => engine.apply_plane_state(&plane)?,
            Err(e) => warn!("Ignoring plane file {name:?}: {e}"),
        }
    }

    if arguments.home {
        navigate(&engine, Target::home())?;
    }
    for direction in arguments.pan {
        navigate(&engine, pan(&engine.view(), direction))?;
    }
    if let [x, y] = arguments.zoom_at[..] {
        let view = engine.view();
        if view.contains(x as i64, y as i64) {
            navigate(&engine, zoom_at(&view, x, y, 1))?;
        } else {
            warn!(x, y, "Zoom point lies off the grid");
        }
    }
    if let Some(step) = arguments.budget {
        engine.set_iteration_budget(step.apply(engine.view().max_steps))?;
    }

    report(&engine, &compute_with_progress(&engine)?);

    let direction = arguments.zoom_steps.signum();
    for _ in 0..arguments.zoom_steps.unsigned_abs() {
        let current = engine.view();
        let target = Target {
            zoom: next_zoom(current.zoom, direction),
            center: current.center,
        };
        if !navigate(&engine, target)? {
            info!("Zoom limit reached");
            break;
        }
        report(&engine, &compute_with_progress(&engine)?);
    }

    let plane = engine.plane_state();
    println!("file name: {}", plane_name::file_name_now(&plane));

    if let Some(scale) = arguments.scale {
        compute_off_screen(&engine_config, &engine.view(), &plane, scale)?;
    }
    Ok(())
}

/// Request a compute and log progress until it is done.
fn compute_with_progress(engine: &Engine) -> Result<ComputeOutcome, AppError> {
    let handle = engine.request_compute()?;
    while !handle.is_finished() {
        thread::sleep(PROGRESS_INTERVAL);
        let (done, total) = engine.progress();
        info!(
            "Computing {}/{} tiles ({})",
            done,
            total,
            engine.phase().label()
        );
    }
    Ok(handle.wait()?)
}

/// Compute `plane` on a separate, larger engine, leaving `engine` alone.
fn compute_off_screen(
    config: &EngineConfig,
    view: &ViewParams,
    plane: &PlaneState,
    scale: u32,
) -> Result<(), AppError> {
    if scale < 1 {
        return Err(AppError::InvalidScale(scale));
    }
    let width = view.width.saturating_mul(scale);
    let height = view.height.saturating_mul(scale);
    info!(width, height, "Computing off-screen");

    let config = config.clone().with_neighborhood_refresh(false);
    let off_screen = Engine::new(config, ViewParams::initial(width, height)?)?;
    off_screen.set_iteration_budget(view.max_steps)?;
    off_screen.apply_plane_state(plane)?;
    let outcome = off_screen.compute()?;
    report(&off_screen, &outcome);
    Ok(())
}

fn report(engine: &Engine, outcome: &ComputeOutcome) {
    let Some(stats) = outcome.report() else {
        println!("request rejected: another compute was already queued");
        return;
    };
    let view = engine.view();
    let grid = engine.grid();
    let inside = grid.to_vec().iter().filter(|&&v| v == INSIDE).count();

    println!(
        "generation {}{}: {}/{} tiles, {} border-traced, {} evaluations in {} ms",
        stats.generation,
        if stats.cancelled { " (cancelled)" } else { "" },
        stats.tiles_computed,
        stats.tiles_total,
        stats.tiles_border_traced,
        human_number(stats.evaluations as f64),
        stats.elapsed.as_millis(),
    );
    println!(
        "  {}x{} at {} zoom {} budget {} ({}), {:.1}% inside",
        view.width,
        view.height,
        view.center,
        human_number(view.zoom),
        human_number(view.max_steps as f64),
        engine.color_mode().label(),
        100.0 * inside as f64 / grid.len().max(1) as f64,
    );
}
