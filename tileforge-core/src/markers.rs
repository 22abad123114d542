use crate::coordinates::{GridSize, TileCoord, TileRegion};
use crate::events::HeightObserver;
use crate::height_field::HeightField;
use crate::paint::SOLID_OVERLAY_OFFSET;
use crate::walkability::WalkabilityMask;
use std::collections::HashMap;

/// Impassable markers. Each entry only remembers where its overlay sits.
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    tiles: HashMap<TileCoord, f32>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tile: TileCoord) -> bool {
        self.tiles.contains_key(&tile)
    }

    pub fn elevation(&self, tile: TileCoord) -> Option<f32> {
        self.tiles.get(&tile).copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Returns `true` when a new marker was created.
    pub fn mark(&mut self, tile: TileCoord, heights: &HeightField) -> bool {
        if !heights.size().contains(tile) || self.contains(tile) {
            return false;
        }
        let elevation = heights.average_corner_height(tile) + SOLID_OVERLAY_OFFSET;
        self.tiles.insert(tile, elevation);
        true
    }

    pub fn erase(&mut self, tile: TileCoord) -> bool {
        self.tiles.remove(&tile).is_some()
    }

    /// Adds or removes the marker on `tile`; returns whether it is present
    /// afterwards, or `None` for tiles outside the grid.
    pub fn toggle(&mut self, tile: TileCoord, heights: &HeightField) -> Option<bool> {
        if !heights.size().contains(tile) {
            return None;
        }
        if self.erase(tile) {
            Some(false)
        } else {
            Some(self.mark(tile, heights))
        }
    }

    pub fn clear_all(&mut self) -> Vec<TileCoord> {
        let mut released: Vec<TileCoord> = self.tiles.drain().map(|(tile, _)| tile).collect();
        released.sort();
        released
    }

    /// Marked tiles sorted for stable output.
    pub fn tiles(&self) -> Vec<TileCoord> {
        let mut tiles: Vec<TileCoord> = self.tiles.keys().copied().collect();
        tiles.sort();
        tiles
    }

    pub fn restore(&mut self, tiles: &[TileCoord], heights: &HeightField) {
        self.clear_all();
        for tile in tiles {
            self.mark(*tile, heights);
        }
    }

    pub fn commit(&self, size: GridSize) -> WalkabilityMask {
        WalkabilityMask::from_blocked(size, self.tiles.keys().copied())
    }
}

impl HeightObserver for MarkerLayer {
    fn heights_changed(&mut self, heights: &HeightField, region: TileRegion) {
        for tile in region.tiles() {
            if let Some(elevation) = self.tiles.get_mut(&tile) {
                *elevation = heights.average_corner_height(tile) + SOLID_OVERLAY_OFFSET;
            }
        }
    }
}
