use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::JoinHandle;

use tracing::{debug, info};

use tilebrot_core::{
    ColorMode, Complex, CoreError, Evaluator, Mandelbrot, PlaneState, ViewParams,
};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::generation::{Coordinator, Generation, Phase};
use crate::grid::Grid;
use crate::reproject::{reproject_grid, reproject_neighborhood, Neighborhood};
use crate::scheduler::{run_generation, ComputeReport};
use crate::tile::TileOrder;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A consistent view of the engine's state: parameters, shading mode, and
/// the grid that belongs to them.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub view: ViewParams,
    pub color_mode: ColorMode,
    pub grid: Arc<Grid>,
}

/// How a compute request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeOutcome {
    /// Every tile ran.
    Completed(ComputeReport),
    /// A newer request took over part way through.
    Cancelled(ComputeReport),
    /// Another request was already queued; nothing was done.
    Rejected,
}

impl ComputeOutcome {
    pub fn report(&self) -> Option<&ComputeReport> {
        match self {
            Self::Completed(r) | Self::Cancelled(r) => Some(r),
            Self::Rejected => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// A compute request running on its own thread.
#[derive(Debug)]
pub struct ComputeHandle {
    handle: JoinHandle<crate::Result<ComputeOutcome>>,
}

impl ComputeHandle {
    /// Block until the request has been admitted and run, or turned away.
    pub fn wait(self) -> crate::Result<ComputeOutcome> {
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The tiled compute engine: one viewport, its grid, and the machinery
/// that keeps the grid filled as the viewport moves.
///
/// Cheap to clone; clones share the same state. Generic over the evaluator
/// for static dispatch.
pub struct Engine<E = Mandelbrot> {
    inner: Arc<Inner<E>>,
}

struct Inner<E> {
    evaluator: Arc<E>,
    config: EngineConfig,
    order: TileOrder,
    state: RwLock<ViewState>,
    coordinator: Coordinator,
    neighborhood: Neighborhood,
}

impl<E> Clone for Engine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Engine<Mandelbrot> {
    /// An engine over the Mandelbrot set.
    pub fn new(config: EngineConfig, view: ViewParams) -> crate::Result<Self> {
        Self::with_evaluator(Mandelbrot, config, view)
    }
}

impl<E> Engine<E>
where
    E: Evaluator + Send + Sync + 'static,
{
    pub fn with_evaluator(
        evaluator: E,
        config: EngineConfig,
        view: ViewParams,
    ) -> crate::Result<Self> {
        config.validate()?;
        let grid = Grid::new(view.width, view.height)?;
        let engine = Self {
            inner: Arc::new(Inner {
                evaluator: Arc::new(evaluator),
                order: TileOrder::new(config.tiles_per_side),
                state: RwLock::new(ViewState {
                    view,
                    color_mode: ColorMode::default(),
                    grid: Arc::new(grid),
                }),
                coordinator: Coordinator::new(),
                neighborhood: Neighborhood::new()?,
                config,
            }),
        };
        if engine.inner.config.neighborhood_refresh {
            engine.inner.neighborhood.spawn_refresh(
                Arc::clone(&engine.inner.evaluator),
                view,
            )?;
        }
        info!(
            width = view.width,
            height = view.height,
            workers = engine.inner.config.workers,
            tiles = engine.inner.order.len(),
            "Engine ready"
        );
        Ok(engine)
    }

    // -- Compute --------------------------------------------------------------

    /// Run a compute generation for the current view and wait for it.
    ///
    /// Supersedes any running generation. Returns
    /// [`ComputeOutcome::Rejected`] straight away if another request is
    /// already waiting its turn; that request will pick up the current view
    /// when it runs.
    pub fn compute(&self) -> crate::Result<ComputeOutcome> {
        let inner = &*self.inner;
        let Some(admission) = inner.coordinator.admit(inner.order.len()) else {
            debug!("Compute request turned away, another is already queued");
            return Ok(ComputeOutcome::Rejected);
        };

        let (view, grid) = {
            let state = inner.read_state();
            (state.view, Arc::clone(&state.grid))
        };
        let report = run_generation(
            &inner.evaluator,
            view,
            grid,
            &inner.order,
            &admission.generation,
            inner.coordinator.progress(),
            inner.config.workers,
        )?;

        Ok(if report.cancelled {
            ComputeOutcome::Cancelled(report)
        } else {
            ComputeOutcome::Completed(report)
        })
    }

    /// Start [`compute`](Self::compute) on a background thread and return
    /// at once.
    pub fn request_compute(&self) -> crate::Result<ComputeHandle> {
        let engine = self.clone();
        let handle = std::thread::Builder::new()
            .name("compute-request".into())
            .spawn(move || engine.compute())
            .map_err(|source| EngineError::Spawn {
                name: "compute-request",
                source,
            })?;
        Ok(ComputeHandle { handle })
    }

    // -- View changes ---------------------------------------------------------

    /// Reallocate the grid for a new size. The old contents are dropped;
    /// request a compute afterwards.
    pub fn resize(&self, width: u32, height: u32) -> crate::Result<()> {
        let mut state = self.inner.write_state();
        if state.view.width == width && state.view.height == height {
            return Ok(());
        }
        let view = state.view.resized(width, height)?;
        let grid = Grid::new(width, height)?;
        self.inner.coordinator.cancel();
        state.view = view;
        state.grid = Arc::new(grid);
        debug!(width, height, "Grid resized");
        Ok(())
    }

    /// Move the view to `zoom` and `center`, carrying over every pixel the
    /// old grid or the neighbourhood cache already knows.
    ///
    /// Readers see either the old grid or the finished new one. Request a
    /// compute afterwards to fill what could not be carried over.
    pub fn transform(&self, zoom: f64, center: Complex) -> crate::Result<()> {
        let mut state = self.inner.write_state();
        self.transform_locked(&mut state, zoom, center)
    }

    fn transform_locked(
        &self,
        state: &mut ViewState,
        zoom: f64,
        center: Complex,
    ) -> crate::Result<()> {
        let inner = &*self.inner;
        let old = state.view;
        let new = old.transformed(zoom, center)?;

        // The running generation writes a grid that is about to be orphaned.
        inner.coordinator.cancel();

        let cache = inner.neighborhood.current();
        let grid = reproject_grid(&old, &state.grid, &new, &cache)?;
        let next_cache = reproject_neighborhood(&old, &new, &cache)?;

        state.view = new;
        state.grid = Arc::new(grid);

        inner.neighborhood.replace(next_cache);
        if inner.config.neighborhood_refresh {
            inner
                .neighborhood
                .spawn_refresh(Arc::clone(&inner.evaluator), new)?;
        }
        debug!(
            zoom,
            center_re = center.re,
            center_im = center.im,
            "View transformed"
        );
        Ok(())
    }

    /// Change the escape-time cutoff. Request a compute afterwards.
    pub fn set_iteration_budget(&self, max_steps: u32) -> crate::Result<()> {
        if max_steps < 1 {
            return Err(CoreError::InvalidIterationBudget(max_steps).into());
        }
        self.inner.write_state().view.max_steps = max_steps;
        Ok(())
    }

    pub fn set_color_mode(&self, color_mode: ColorMode) {
        self.inner.write_state().color_mode = color_mode;
    }

    /// Jump to a saved state: transform to its centre and zoom and switch
    /// its colour mode, as one step.
    pub fn apply_plane_state(&self, plane: &PlaneState) -> crate::Result<()> {
        let mut state = self.inner.write_state();
        self.transform_locked(&mut state, plane.zoom(), plane.center())?;
        state.color_mode = plane.color_mode();
        Ok(())
    }

    /// The state to hand to the plane-state encoder.
    pub fn plane_state(&self) -> PlaneState {
        let state = self.inner.read_state();
        PlaneState::of_view(&state.view, state.color_mode)
    }

    // -- Readers --------------------------------------------------------------

    pub fn view(&self) -> ViewParams {
        self.inner.read_state().view
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.read_state().clone()
    }

    pub fn grid(&self) -> Arc<Grid> {
        Arc::clone(&self.inner.read_state().grid)
    }

    pub fn color_mode(&self) -> ColorMode {
        self.inner.read_state().color_mode
    }

    pub fn pixel_to_plane(&self, x: u32, y: u32) -> Complex {
        self.view().pixel_to_plane(x, y)
    }

    pub fn plane_to_pixel(&self, c: Complex) -> (i64, i64) {
        self.view().plane_to_pixel(c)
    }

    /// `(tiles done, total tiles)` for the current generation.
    pub fn progress(&self) -> (usize, usize) {
        self.inner.coordinator.progress().get()
    }

    /// Tiles in one generation.
    pub fn total_tiles(&self) -> usize {
        self.inner.order.len()
    }

    pub fn phase(&self) -> Phase {
        self.inner.coordinator.phase()
    }

    /// The most recently admitted generation.
    pub fn latest_generation(&self) -> Option<Arc<Generation>> {
        self.inner.coordinator.latest()
    }

    /// The neighbourhood cache as it stands.
    pub fn neighborhood(&self) -> Arc<Grid> {
        self.inner.neighborhood.current()
    }

    /// Wait for the latest background neighbourhood refresh to finish.
    /// Returns `false` if it panicked.
    pub fn settle_neighborhood(&self) -> bool {
        self.inner.neighborhood.settle()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }
}

impl<E> Inner<E> {
    fn read_state(&self) -> RwLockReadGuard<'_, ViewState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, ViewState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
