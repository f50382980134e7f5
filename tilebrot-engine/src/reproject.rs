use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, trace, warn};

use tilebrot_core::view::neighborhood_contains;
use tilebrot_core::{Evaluator, ViewParams, NEIGHBORHOOD_RES};

use crate::error::EngineError;
use crate::grid::Grid;

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// Build the grid for `new` out of what is already known about `old`.
///
/// Each destination pixel is mapped to the plane under `new` and back to a
/// pixel under `old`. Pixels that land on the old grid copy its value;
/// the rest fall back to the neighbourhood cache (laid out around `old`),
/// and anything beyond that stays `0`.
pub fn reproject_grid(
    old: &ViewParams,
    old_grid: &Grid,
    new: &ViewParams,
    neighborhood: &Grid,
) -> crate::Result<Grid> {
    let grid = Grid::new(new.width, new.height)?;
    let mut from_grid = 0usize;
    let mut from_cache = 0usize;

    for y in 0..new.height {
        for x in 0..new.width {
            let c = new.pixel_to_plane(x, y);
            let (sx, sy) = old.plane_to_pixel(c);
            let value = if old.contains(sx, sy) {
                from_grid += 1;
                old_grid.get(old.index(sx as u32, sy as u32))
            } else {
                let (nx, ny) = old.plane_to_neighborhood(c);
                if !neighborhood_contains(nx, ny) {
                    continue;
                }
                from_cache += 1;
                neighborhood.get(ny as usize * NEIGHBORHOOD_RES as usize + nx as usize)
            };
            grid.set(new.index(x, y), value);
        }
    }

    trace!(
        from_grid,
        from_cache,
        unresolved = new.pixel_count() - from_grid - from_cache,
        "Grid reprojected"
    );
    Ok(grid)
}

/// Carry the neighbourhood cache from `old` over to `new`.
///
/// Starts from an unchanged copy, then overwrites every cell whose point
/// was covered by the old cache. Content decays over repeated transforms;
/// the background refresh replaces it anyway.
pub fn reproject_neighborhood(
    old: &ViewParams,
    new: &ViewParams,
    neighborhood: &Grid,
) -> crate::Result<Grid> {
    let dest = neighborhood.duplicate()?;
    for y in 0..NEIGHBORHOOD_RES {
        for x in 0..NEIGHBORHOOD_RES {
            let c = new.neighborhood_to_plane(x, y);
            let (sx, sy) = old.plane_to_neighborhood(c);
            if neighborhood_contains(sx, sy) {
                let src = sy as usize * NEIGHBORHOOD_RES as usize + sx as usize;
                let dst = y as usize * NEIGHBORHOOD_RES as usize + x as usize;
                dest.set(dst, neighborhood.get(src));
            }
        }
    }
    Ok(dest)
}

/// Evaluate every neighbourhood cell for `view`, row by row, until done or
/// until `superseded` says a newer refresh has taken over.
///
/// Returns `true` if the whole cache was written.
pub fn refresh_neighborhood<E: Evaluator>(
    evaluator: &E,
    view: &ViewParams,
    cache: &Grid,
    superseded: impl Fn() -> bool,
) -> bool {
    for y in 0..NEIGHBORHOOD_RES {
        if superseded() {
            return false;
        }
        for x in 0..NEIGHBORHOOD_RES {
            let value = evaluator
                .evaluate(view.neighborhood_to_plane(x, y), view.max_steps)
                .value();
            cache.set(y as usize * NEIGHBORHOOD_RES as usize + x as usize, value);
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Neighbourhood cache
// ---------------------------------------------------------------------------

/// The off-screen fallback consulted when a transform exposes pixels the
/// old grid never covered.
///
/// Advisory only. The background refresh writes straight into the cache
/// it was started on and never takes a lock the transform path needs; a
/// newer refresh or transform simply supersedes it.
pub struct Neighborhood {
    cache: Mutex<Arc<Grid>>,
    refresh_epoch: Arc<AtomicU64>,
    refresh: Mutex<Option<JoinHandle<()>>>,
}

impl Neighborhood {
    pub fn new() -> crate::Result<Self> {
        Ok(Self {
            cache: Mutex::new(Arc::new(Grid::new(NEIGHBORHOOD_RES, NEIGHBORHOOD_RES)?)),
            refresh_epoch: Arc::new(AtomicU64::new(0)),
            refresh: Mutex::new(None),
        })
    }

    /// The cache as it stands.
    pub fn current(&self) -> Arc<Grid> {
        Arc::clone(&self.cache.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Install a replacement cache, superseding any refresh in flight.
    pub fn replace(&self, grid: Grid) {
        self.refresh_epoch.fetch_add(1, Ordering::AcqRel);
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(grid);
    }

    /// Recompute the current cache for `view` on a background thread.
    pub fn spawn_refresh<E>(&self, evaluator: Arc<E>, view: ViewParams) -> crate::Result<()>
    where
        E: Evaluator + Send + Sync + 'static,
    {
        let epoch = self.refresh_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let refresh_epoch = Arc::clone(&self.refresh_epoch);
        let cache = self.current();

        let handle = std::thread::Builder::new()
            .name("neighborhood-refresh".into())
            .spawn(move || {
                let superseded = || refresh_epoch.load(Ordering::Acquire) != epoch;
                let complete = refresh_neighborhood(&*evaluator, &view, &cache, superseded);
                debug!(complete, zoom = view.zoom, "Neighborhood refresh finished");
            })
            .map_err(|source| EngineError::Spawn {
                name: "neighborhood-refresh",
                source,
            })?;

        // Older handles belong to superseded refreshes; they finish on
        // their own.
        *self.refresh.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    /// Block until the most recent refresh has finished. Returns `false`
    /// if that refresh panicked.
    pub fn settle(&self) -> bool {
        let handle = self
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return true;
        };
        if handle.join().is_err() {
            warn!("Neighborhood refresh thread panicked");
            return false;
        }
        true
    }
}
