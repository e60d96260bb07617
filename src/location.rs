use crate::constants::*;
use serde::*;

/// Position of a tile (coarse, buildability resolution).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
pub struct TilePosition {
    pub x: i32,
    pub y: i32,
}

/// Position of a walk cell (fine resolution, 4x4 per tile).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
pub struct WalkPosition {
    pub x: i32,
    pub y: i32,
}

impl TilePosition {
    pub const fn new(x: i32, y: i32) -> Self {
        TilePosition { x, y }
    }

    /// Top-left walk cell of this tile.
    #[inline]
    pub fn to_walk(self) -> WalkPosition {
        WalkPosition::new(self.x * WALK_PER_TILE, self.y * WALK_PER_TILE)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        TilePosition::new(self.x + dx, self.y + dy)
    }

    /// Integer octile-style approximation of the euclidean distance.
    pub fn approx_distance(self, other: Self) -> i32 {
        approx_distance(self.x - other.x, self.y - other.y)
    }

    pub fn square_distance(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Exact straight-line distance in tiles.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.square_distance(other) as f64).sqrt()
    }
}

impl WalkPosition {
    pub const fn new(x: i32, y: i32) -> Self {
        WalkPosition { x, y }
    }

    /// Tile containing this walk cell.
    #[inline]
    pub fn to_tile(self) -> TilePosition {
        TilePosition::new(
            self.x.div_euclid(WALK_PER_TILE),
            self.y.div_euclid(WALK_PER_TILE),
        )
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        WalkPosition::new(self.x + dx, self.y + dy)
    }

    pub fn chebyshev_distance(self, other: Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Integer distance approximation that never under-estimates by more than
/// a few percent. Used wherever the analysis compares tile distances
/// against fixed thresholds.
pub fn approx_distance(dx: i32, dy: i32) -> i32 {
    let mut min = dx.abs();
    let mut max = dy.abs();
    if max < min {
        std::mem::swap(&mut min, &mut max);
    }

    if min < (max >> 2) {
        return max;
    }

    let min_calc = (3 * min) >> 3;
    (min_calc >> 5) + min_calc + max - (max >> 4) - (max >> 6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_distance_is_exact_on_axes() {
        assert_eq!(approx_distance(0, 6), 6);
        assert_eq!(approx_distance(-6, 0), 6);
        assert_eq!(approx_distance(0, 0), 0);
    }

    #[test]
    fn approx_distance_close_to_euclidean() {
        for dx in -20..=20 {
            for dy in -20..=20 {
                let exact = ((dx * dx + dy * dy) as f64).sqrt();
                let approx = approx_distance(dx, dy) as f64;
                assert!((approx - exact).abs() <= exact * 0.1 + 1.0, "{} {}", dx, dy);
            }
        }
    }

    #[test]
    fn tile_walk_conversion() {
        let tile = TilePosition::new(3, 5);
        assert_eq!(tile.to_walk(), WalkPosition::new(12, 20));
        assert_eq!(WalkPosition::new(15, 23).to_tile(), tile);
    }
}
