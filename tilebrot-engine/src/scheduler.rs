use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use tilebrot_core::{Evaluator, ViewParams};

use crate::generation::{Generation, Progress};
use crate::grid::Grid;
use crate::tile::{Tile, TileOrder};
use crate::trace::trace_tile;

/// What one generation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeReport {
    pub generation: u64,
    /// A newer request superseded this one before every tile ran.
    pub cancelled: bool,
    pub tiles_total: usize,
    pub tiles_computed: usize,
    /// Tiles counted off without running because of cancellation.
    pub tiles_skipped: usize,
    /// Tiles whose interior was filled from an all-inside border ring.
    pub tiles_border_traced: usize,
    pub evaluations: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct TileStats {
    computed: AtomicUsize,
    skipped: AtomicUsize,
    border_traced: AtomicUsize,
    evaluations: AtomicUsize,
}

/// Everything a worker needs to fill tiles of one generation.
struct Job<E> {
    evaluator: Arc<E>,
    view: ViewParams,
    grid: Arc<Grid>,
    generation: Arc<Generation>,
    progress: Arc<Progress>,
    stats: TileStats,
}

impl<E: Evaluator> Job<E> {
    fn run(&self, tile: Tile) {
        if self.generation.is_cancelled() {
            self.generation.begin_draining();
            self.stats.skipped.fetch_add(1, Ordering::Relaxed);
        } else {
            let result = trace_tile(&*self.evaluator, &self.view, &self.grid, tile);
            self.stats.computed.fetch_add(1, Ordering::Relaxed);
            self.stats
                .evaluations
                .fetch_add(result.evaluations, Ordering::Relaxed);
            if result.filled > 0 {
                self.stats.border_traced.fetch_add(1, Ordering::Relaxed);
            }
            self.progress.inc();
            trace!(
                generation = self.generation.id(),
                x0 = tile.x0,
                y0 = tile.y0,
                evaluations = result.evaluations,
                filled = result.filled,
                "Tile done"
            );
        }
        self.generation.complete(1);
    }
}

/// Fill `grid` for `view`, one generation's worth.
///
/// Spawns a dedicated pool of `workers` threads, hands it the tiles in ring
/// order for as long as the generation is live, counts off the rest once it
/// is superseded, and returns after every tile is accounted for. The pool is
/// torn down before returning, so no tile of this generation can write after
/// the next one starts.
pub(crate) fn run_generation<E>(
    evaluator: &Arc<E>,
    view: ViewParams,
    grid: Arc<Grid>,
    order: &TileOrder,
    generation: &Arc<Generation>,
    progress: &Arc<Progress>,
    workers: usize,
) -> crate::Result<ComputeReport>
where
    E: Evaluator + Send + Sync + 'static,
{
    let start = Instant::now();
    let total = order.len();
    progress.reset(total);

    let id = generation.id();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(move |i| format!("tile-worker-{id}-{i}"))
        .build();
    let pool = match pool {
        Ok(pool) => pool,
        Err(e) => {
            generation.complete(total);
            generation.finish();
            return Err(e.into());
        }
    };

    debug!(
        generation = id,
        workers,
        tiles = total,
        width = view.width,
        height = view.height,
        zoom = view.zoom,
        max_steps = view.max_steps,
        "Starting generation"
    );

    let job = Arc::new(Job {
        evaluator: Arc::clone(evaluator),
        view,
        grid,
        generation: Arc::clone(generation),
        progress: Arc::clone(progress),
        stats: TileStats::default(),
    });

    for (dispatched, index) in order.iter().enumerate() {
        if generation.is_cancelled() {
            let remaining = total - dispatched;
            generation.begin_draining();
            job.stats.skipped.fetch_add(remaining, Ordering::Relaxed);
            generation.complete(remaining);
            debug!(generation = id, remaining, "Generation superseded, draining");
            break;
        }
        let tile = Tile::locate(index, order.side(), view.width, view.height);
        let job = Arc::clone(&job);
        pool.spawn_fifo(move || job.run(tile));
    }

    generation.wait();
    drop(pool);

    let stats = &job.stats;
    let tiles_skipped = stats.skipped.load(Ordering::Relaxed);
    let cancelled = tiles_skipped > 0;
    if !cancelled {
        progress.finish();
    }
    generation.finish();

    let report = ComputeReport {
        generation: id,
        cancelled,
        tiles_total: total,
        tiles_computed: stats.computed.load(Ordering::Relaxed),
        tiles_skipped,
        tiles_border_traced: stats.border_traced.load(Ordering::Relaxed),
        evaluations: stats.evaluations.load(Ordering::Relaxed),
        elapsed: start.elapsed(),
    };
    info!(
        generation = id,
        elapsed_ms = report.elapsed.as_millis(),
        tiles_computed = report.tiles_computed,
        tiles_skipped = report.tiles_skipped,
        tiles_border_traced = report.tiles_border_traced,
        evaluations = report.evaluations,
        cancelled,
        "Generation complete"
    );
    Ok(report)
}
