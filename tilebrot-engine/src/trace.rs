use tilebrot_core::{Evaluator, ViewParams, INSIDE};

use crate::grid::Grid;
use crate::tile::Tile;

/// Counters from filling one tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileTrace {
    /// Pixels handed to the evaluator.
    pub evaluations: usize,
    /// Pixels set to inside without being evaluated.
    pub filled: usize,
}

/// Fill `tile` of `grid` by peeling border rings from the outside in.
///
/// Each ring (top row, bottom row, left and right columns) is evaluated in
/// full. As soon as a whole ring comes back inside, everything it encloses
/// is assumed inside too and written as [`INSIDE`] without evaluation.
///
/// This leans on the set being connected with no holes: a ring of inside
/// points cannot surround escaping ones. Thin filaments that cross a tile
/// without touching the ring can still be lost; that inaccuracy is accepted
/// for skipping the bulk of the work inside large solid regions.
pub fn trace_tile<E: Evaluator>(
    evaluator: &E,
    view: &ViewParams,
    grid: &Grid,
    tile: Tile,
) -> TileTrace {
    let mut evaluations = 0usize;
    let mut eval = |x: u32, y: u32| -> bool {
        evaluations += 1;
        let result = evaluator.evaluate(view.pixel_to_plane(x, y), view.max_steps);
        grid.set(view.index(x, y), result.value());
        result.is_inside()
    };

    let Tile {
        mut x0,
        mut x1,
        mut y0,
        mut y1,
    } = tile;

    while x0 < x1 && y0 < y1 {
        let mut ring_inside = true;

        for x in x0..x1 {
            ring_inside &= eval(x, y0);
            if y1 - 1 > y0 {
                ring_inside &= eval(x, y1 - 1);
            }
        }
        for y in y0 + 1..y1 - 1 {
            ring_inside &= eval(x0, y);
            if x1 - 1 > x0 {
                ring_inside &= eval(x1 - 1, y);
            }
        }

        x0 += 1;
        y0 += 1;
        x1 -= 1;
        y1 -= 1;

        if ring_inside {
            break;
        }
    }

    let mut filled = 0usize;
    for y in y0..y1 {
        for x in x0..x1 {
            grid.set(view.index(x, y), INSIDE);
            filled += 1;
        }
    }

    TileTrace {
        evaluations,
        filled,
    }
}
