//! Tile identity within a quadtree tiling scheme
//!
//! A `TileKey` addresses one tile by row, column and subdivision level.
//! Keys hash to compact cache keys for use by the tile caches.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Identity of a tile in the quadtree tiling scheme.
///
/// Level 0 is a single root tile; each level doubles the number of rows and
/// columns. (0, 0) is the south-west tile. Levels 0 through 31 are
/// representable; deeper levels would overflow the row/column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileKey {
    /// Row index, `0..rows_at_level(level)`
    pub row: u32,

    /// Column index, `0..columns_at_level(level)`
    pub column: u32,

    /// Quadtree subdivision level
    pub level: u32,
}

impl TileKey {
    /// Create a new tile key
    pub fn new(row: u32, column: u32, level: u32) -> Self {
        Self { row, column, level }
    }

    /// Number of rows (and columns) at a given level
    pub fn rows_at_level(level: u32) -> u32 {
        debug_assert!(level < 32, "tile level out of range: {level}");
        1 << level
    }

    /// The parent key one level up, or `None` for the root
    pub fn parent(&self) -> Option<TileKey> {
        if self.level == 0 {
            return None;
        }
        Some(TileKey::new(self.row / 2, self.column / 2, self.level - 1))
    }

    /// Morton (Z-order) code of this key, unique across levels
    ///
    /// Row and column bits are interleaved and offset by a per-level marker
    /// bit so that keys from different levels never collide.
    pub fn morton_code(&self) -> u64 {
        debug_assert!(self.level < 32, "tile level out of range: {}", self.level);
        let interleaved = part1by1(self.column) | (part1by1(self.row) << 1);
        (1u64 << (2 * self.level)) + interleaved
    }

    /// Compute a hash for this key (for cache keys)
    pub fn cache_key(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Spread the low 32 bits of `x` into the even bit positions of a u64
fn part1by1(x: u32) -> u64 {
    let mut x = x as u64;
    x &= 0x0000_0000_ffff_ffff;
    x = (x | (x << 16)) & 0x0000_ffff_0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff_00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rows_at_level() {
        assert_eq!(TileKey::rows_at_level(0), 1);
        assert_eq!(TileKey::rows_at_level(1), 2);
        assert_eq!(TileKey::rows_at_level(10), 1024);
    }

    #[test]
    fn test_parent() {
        let key = TileKey::new(5, 7, 3);
        assert_eq!(key.parent(), Some(TileKey::new(2, 3, 2)));
        assert_eq!(TileKey::new(0, 0, 0).parent(), None);
    }

    #[test]
    fn test_morton_codes_unique_across_levels() {
        let mut seen = HashSet::new();
        for level in 0..4 {
            let n = TileKey::rows_at_level(level);
            for row in 0..n {
                for column in 0..n {
                    let code = TileKey::new(row, column, level).morton_code();
                    assert!(seen.insert(code), "duplicate morton code {code}");
                }
            }
        }
    }

    #[test]
    fn test_morton_code_root() {
        assert_eq!(TileKey::new(0, 0, 0).morton_code(), 1);
        assert_eq!(TileKey::new(0, 0, 1).morton_code(), 4);
        assert_eq!(TileKey::new(0, 1, 1).morton_code(), 5);
        assert_eq!(TileKey::new(1, 0, 1).morton_code(), 6);
        assert_eq!(TileKey::new(1, 1, 1).morton_code(), 7);
    }

    #[test]
    fn test_deepest_supported_level() {
        assert_eq!(TileKey::rows_at_level(31), 1 << 31);

        let key = TileKey::new((1 << 31) - 1, 0, 31);
        assert_eq!(key.parent(), Some(TileKey::new((1 << 30) - 1, 0, 30)));
        assert!(key.morton_code() >= 1u64 << 62);
    }

    #[test]
    fn test_cache_key_stable() {
        let key = TileKey::new(3, 4, 5);
        assert_eq!(key.cache_key(), key.cache_key());
        assert_ne!(key.cache_key(), TileKey::new(4, 3, 5).cache_key());
    }
}
