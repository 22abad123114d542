use crate::coordinates::{GridSize, TileCoord};

/// Dense per-tile walkability, row-major in `z`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkabilityMask {
    size: GridSize,
    cells: Vec<bool>,
}

impl WalkabilityMask {
    pub fn all_walkable(size: GridSize) -> Self {
        Self {
            size,
            cells: vec![true; size.tile_count()],
        }
    }

    /// Everything walkable except `blocked`; out-of-range tiles are skipped.
    pub fn from_blocked<I>(size: GridSize, blocked: I) -> Self
    where
        I: IntoIterator<Item = TileCoord>,
    {
        let mut mask = Self::all_walkable(size);
        for tile in blocked {
            mask.set_walkable(tile, false);
        }
        mask
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Out-of-range tiles are never walkable.
    pub fn is_walkable(&self, tile: TileCoord) -> bool {
        self.size
            .tile_index(tile)
            .is_some_and(|index| self.cells[index])
    }

    pub fn set_walkable(&mut self, tile: TileCoord, walkable: bool) {
        if let Some(index) = self.size.tile_index(tile) {
            self.cells[index] = walkable;
        }
    }

    pub fn blocked_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, walkable)| !**walkable)
            .map(|(index, _)| self.size.tile_at_index(index))
    }

    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|walkable| **walkable).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_tiles_are_not_walkable() {
        let size = GridSize::new(3, 3);
        let mask = WalkabilityMask::from_blocked(size, [TileCoord::new(1, 1), TileCoord::new(8, 8)]);

        assert!(!mask.is_walkable(TileCoord::new(1, 1)));
        assert!(mask.is_walkable(TileCoord::new(0, 1)));
        assert!(!mask.is_walkable(TileCoord::new(-1, 0)));
        assert_eq!(mask.walkable_count(), 8);
        assert_eq!(mask.blocked_tiles().collect::<Vec<_>>(), vec![TileCoord::new(1, 1)]);
    }
}
