use std::sync::Arc;

/// Default number of tiles along each side of the grid.
pub const TILES_PER_SIDE: u32 = 32;

/// A rectangle of grid pixels, half-open on the high end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub x0: u32,
    pub x1: u32,
    pub y0: u32,
    pub y1: u32,
}

impl Tile {
    /// The tile at column `col`, row `row` of an `n × n` split of a
    /// `width × height` grid.
    ///
    /// Boundaries are proportional, so every pixel lands in exactly one
    /// tile even when the size is not a multiple of `n`. Grids smaller than
    /// `n` produce some empty tiles.
    pub fn locate(index: TileIndex, n: u32, width: u32, height: u32) -> Self {
        let split = |i: u32, len: u32| ((i as u64 * len as u64) / n as u64) as u32;
        Self {
            x0: split(index.col, width),
            x1: split(index.col + 1, width),
            y0: split(index.row, height),
            y1: split(index.row + 1, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    /// Number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }
}

/// Column/row position of a tile in the `n × n` arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileIndex {
    pub col: u32,
    pub row: u32,
}

/// The dispatch order for an `n × n` tile arrangement: concentric rings
/// growing out of the central tiles, so the middle of the frame fills
/// first.
///
/// Built once per tile count and shared by every generation.
#[derive(Debug, Clone)]
pub struct TileOrder {
    side: u32,
    order: Arc<[TileIndex]>,
}

impl TileOrder {
    pub fn new(side: u32) -> Self {
        let n = side as i64;
        let mut order: Vec<TileIndex> = (0..side)
            .flat_map(|row| (0..side).map(move |col| TileIndex { col, row }))
            .collect();

        // Offsets are doubled so the centre of an even split sits on a
        // tile corner without going fractional.
        order.sort_by_key(|t| {
            let dx = (2 * t.col as i64 + 1 - n).abs();
            let dy = (2 * t.row as i64 + 1 - n).abs();
            (dx.max(dy), dx * dx + dy * dy, t.row, t.col)
        });

        Self {
            side,
            order: order.into(),
        }
    }

    /// Tiles along each side.
    pub fn side(&self) -> u32 {
        self.side
    }

    /// Total number of tiles; the progress denominator.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.order.iter().copied()
    }

    /// Ring number of a tile: 0 for the central tiles.
    pub fn ring(&self, index: TileIndex) -> u32 {
        let n = self.side as i64;
        let dx = (2 * index.col as i64 + 1 - n).abs();
        let dy = (2 * index.row as i64 + 1 - n).abs();
        (dx.max(dy) / 2) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles(n: u32, width: u32, height: u32) -> Vec<Tile> {
        TileOrder::new(n)
            .iter()
            .map(|i| Tile::locate(i, n, width, height))
            .collect()
    }

    #[test]
    fn tiles_cover_grid_exactly_once() {
        for (n, w, h) in [(32, 200, 150), (32, 1536, 1024), (4, 7, 5), (1, 8, 8), (32, 10, 10)] {
            let mut covered = vec![0u8; (w * h) as usize];
            for tile in tiles(n, w, h) {
                for y in tile.y0..tile.y1 {
                    for x in tile.x0..tile.x1 {
                        covered[(y * w + x) as usize] += 1;
                    }
                }
            }
            assert!(
                covered.iter().all(|&c| c == 1),
                "{n} tiles per side over {w}×{h} must cover each pixel once"
            );
        }
    }

    #[test]
    fn total_tiles_is_side_squared() {
        assert_eq!(TileOrder::new(TILES_PER_SIDE).len(), 1024);
        assert_eq!(TileOrder::new(1).len(), 1);
    }

    #[test]
    fn central_four_tiles_come_first() {
        let order = TileOrder::new(8);
        let first: Vec<_> = order.iter().take(4).map(|t| (t.col, t.row)).collect();
        for pos in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            assert!(first.contains(&pos), "{pos:?} should be among the first four");
        }
    }

    #[test]
    fn rings_never_shrink() {
        let order = TileOrder::new(TILES_PER_SIDE);
        let rings: Vec<u32> = order.iter().map(|t| order.ring(t)).collect();
        assert!(rings.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(rings[0], 0);
        assert_eq!(*rings.last().unwrap(), TILES_PER_SIDE / 2 - 1);
    }

    #[test]
    fn each_ring_is_a_square_shell() {
        let order = TileOrder::new(6);
        let count = |r| order.iter().filter(|&t| order.ring(t) == r).count();
        assert_eq!(count(0), 4);
        assert_eq!(count(1), 12);
        assert_eq!(count(2), 20);
    }

    #[test]
    fn order_visits_every_tile_once() {
        let order = TileOrder::new(5);
        let mut seen = vec![false; 25];
        for t in order.iter() {
            let i = (t.row * 5 + t.col) as usize;
            assert!(!seen[i]);
            seen[i] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}
