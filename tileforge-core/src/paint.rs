use crate::coordinates::{TileCoord, TileRegion};
use crate::events::HeightObserver;
use crate::height_field::HeightField;
use std::collections::HashMap;

pub const SOLID_OVERLAY_OFFSET: f32 = 0.015;
pub const WATER_OVERLAY_OFFSET: f32 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileKind {
    Sand,
    Dirt,
    Grass,
    Stone,
    Gravel,
    Path,
    Water,
}

impl TileKind {
    pub const ALL: [TileKind; 7] = [
        TileKind::Sand,
        TileKind::Dirt,
        TileKind::Grass,
        TileKind::Stone,
        TileKind::Gravel,
        TileKind::Path,
        TileKind::Water,
    ];

    pub fn is_liquid(self) -> bool {
        matches!(self, TileKind::Water)
    }

    pub fn overlay_offset(self) -> f32 {
        if self.is_liquid() {
            WATER_OVERLAY_OFFSET
        } else {
            SOLID_OVERLAY_OFFSET
        }
    }

    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|kind| *kind == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaintedTile {
    pub kind: TileKind,
    /// World height the overlay sits at.
    pub elevation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintChange {
    Ignored,
    Unchanged,
    Created,
    /// The previous overlay was released before the new one was inserted.
    Replaced { previous: TileKind },
}

#[derive(Debug, Clone, Default)]
pub struct PaintLayer {
    tiles: HashMap<TileCoord, PaintedTile>,
}

impl PaintLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tile: TileCoord) -> Option<&PaintedTile> {
        self.tiles.get(&tile)
    }

    pub fn kind_at(&self, tile: TileCoord) -> Option<TileKind> {
        self.tiles.get(&tile).map(|painted| painted.kind)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn paint(&mut self, tile: TileCoord, kind: TileKind, heights: &HeightField) -> PaintChange {
        if !heights.size().contains(tile) {
            return PaintChange::Ignored;
        }

        let previous = match self.tiles.get(&tile) {
            Some(existing) if existing.kind == kind => return PaintChange::Unchanged,
            Some(existing) => Some(existing.kind),
            None => None,
        };
        if previous.is_some() {
            self.tiles.remove(&tile);
        }

        let elevation = heights.average_corner_height(tile) + kind.overlay_offset();
        self.tiles.insert(tile, PaintedTile { kind, elevation });

        match previous {
            Some(previous) => PaintChange::Replaced { previous },
            None => PaintChange::Created,
        }
    }

    pub fn erase(&mut self, tile: TileCoord) -> Option<TileKind> {
        self.tiles.remove(&tile).map(|painted| painted.kind)
    }

    /// Removes every entry and returns the released tiles.
    pub fn clear_all(&mut self) -> Vec<TileCoord> {
        let mut released: Vec<TileCoord> = self.tiles.drain().map(|(tile, _)| tile).collect();
        released.sort();
        released
    }

    /// Entries sorted by tile for stable output.
    pub fn serialize(&self) -> Vec<(TileCoord, TileKind)> {
        let mut entries: Vec<(TileCoord, TileKind)> = self
            .tiles
            .iter()
            .map(|(tile, painted)| (*tile, painted.kind))
            .collect();
        entries.sort();
        entries
    }

    pub fn restore(&mut self, entries: &[(TileCoord, TileKind)], heights: &HeightField) {
        self.clear_all();
        for (tile, kind) in entries {
            self.paint(*tile, *kind, heights);
        }
    }
}

impl HeightObserver for PaintLayer {
    fn heights_changed(&mut self, heights: &HeightField, region: TileRegion) {
        for tile in region.tiles() {
            if let Some(painted) = self.tiles.get_mut(&tile) {
                painted.elevation = heights.average_corner_height(tile) + painted.kind.overlay_offset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::GridSize;
    use crate::height_field::HeightLimits;

    fn field() -> HeightField {
        HeightField::new(GridSize::new(4, 4), HeightLimits::default())
    }

    #[test]
    fn repaint_with_other_kind_replaces_entry() {
        let heights = field();
        let mut layer = PaintLayer::new();
        let tile = TileCoord::new(1, 1);

        assert_eq!(layer.paint(tile, TileKind::Sand, &heights), PaintChange::Created);
        assert_eq!(
            layer.paint(tile, TileKind::Water, &heights),
            PaintChange::Replaced { previous: TileKind::Sand }
        );
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.kind_at(tile), Some(TileKind::Water));
    }

    #[test]
    fn repaint_with_same_kind_is_a_no_op() {
        let heights = field();
        let mut layer = PaintLayer::new();
        let tile = TileCoord::new(0, 3);
        layer.paint(tile, TileKind::Grass, &heights);
        assert_eq!(layer.paint(tile, TileKind::Grass, &heights), PaintChange::Unchanged);
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn out_of_range_paint_is_ignored() {
        let heights = field();
        let mut layer = PaintLayer::new();
        assert_eq!(
            layer.paint(TileCoord::new(4, 0), TileKind::Dirt, &heights),
            PaintChange::Ignored
        );
        assert!(layer.is_empty());
    }

    #[test]
    fn overlays_follow_height_changes() {
        let mut heights = field();
        let mut layer = PaintLayer::new();
        let tile = TileCoord::new(1, 1);
        layer.paint(tile, TileKind::Water, &heights);
        assert_eq!(layer.get(tile).unwrap().elevation, WATER_OVERLAY_OFFSET);

        let region = heights.set_tile_height(tile, 2.0).unwrap().unwrap();
        layer.heights_changed(&heights, region);
        let elevation = layer.get(tile).unwrap().elevation;
        assert!((elevation - (2.0 + WATER_OVERLAY_OFFSET)).abs() < 1e-5);
    }

    #[test]
    fn restore_replaces_previous_contents() {
        let heights = field();
        let mut layer = PaintLayer::new();
        layer.paint(TileCoord::new(3, 3), TileKind::Stone, &heights);

        let entries = vec![
            (TileCoord::new(0, 0), TileKind::Path),
            (TileCoord::new(9, 9), TileKind::Sand),
            (TileCoord::new(0, 1), TileKind::Gravel),
        ];
        layer.restore(&entries, &heights);

        assert_eq!(
            layer.serialize(),
            vec![
                (TileCoord::new(0, 0), TileKind::Path),
                (TileCoord::new(0, 1), TileKind::Gravel),
            ]
        );
    }

    #[test]
    fn kinds_cycle_through_all_variants() {
        let mut kind = TileKind::Sand;
        for _ in 0..TileKind::ALL.len() {
            kind = kind.next();
        }
        assert_eq!(kind, TileKind::Sand);
    }
}
