//! Shared-vertex height field with per-tile pins.
//!
//! Heights live on the `(W+1) x (H+1)` vertex lattice, so neighboring tiles
//! slope into each other automatically. A pinned tile locks its four corners
//! against edits coming from any tile that shares them.

use crate::config::EditorConfig;
use crate::coordinates::{GridSize, TileCoord, TileRegion, VertexCoord};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightLimits {
    pub step: f32,
    pub min: f32,
    pub max: f32,
}

impl HeightLimits {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            step: config.height_step,
            min: config.height_min,
            max: config.height_max,
        }
    }

    pub fn quantize(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        ((clamped / self.step).round() * self.step).clamp(self.min, self.max)
    }
}

impl Default for HeightLimits {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightEditError {
    NonFinite,
}

impl fmt::Display for HeightEditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeightEditError::NonFinite => f.write_str("height must be a finite number"),
        }
    }
}

impl Error for HeightEditError {}

#[derive(Debug, Clone)]
pub struct HeightField {
    size: GridSize,
    limits: HeightLimits,
    heights: Vec<f32>,
    pins: Vec<bool>,
}

impl HeightField {
    pub fn new(size: GridSize, limits: HeightLimits) -> Self {
        Self {
            size,
            limits,
            heights: vec![0.0; size.vertex_count()],
            pins: vec![false; size.tile_count()],
        }
    }

    /// Builds a field from serialized parts. Heights are re-quantized and
    /// missing entries default to zero.
    pub fn from_parts(
        size: GridSize,
        limits: HeightLimits,
        heights: &[f32],
        pins: &[bool],
    ) -> Self {
        let mut field = Self::new(size, limits);
        for (slot, value) in field.heights.iter_mut().zip(heights) {
            *slot = if value.is_finite() {
                limits.quantize(*value)
            } else {
                0.0
            };
        }
        for (slot, pinned) in field.pins.iter_mut().zip(pins) {
            *slot = *pinned;
        }
        field
    }

    pub fn reset(&mut self, size: GridSize) {
        self.size = size;
        self.heights = vec![0.0; size.vertex_count()];
        self.pins = vec![false; size.tile_count()];
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn limits(&self) -> HeightLimits {
        self.limits
    }

    /// Vertex heights, row-major in `z`.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn is_pinned(&self, tile: TileCoord) -> bool {
        self.size
            .tile_index(tile)
            .is_some_and(|index| self.pins[index])
    }

    /// A vertex is locked while any tile sharing it is pinned.
    pub fn is_vertex_locked(&self, vertex: VertexCoord) -> bool {
        vertex
            .adjacent_tiles()
            .into_iter()
            .any(|tile| self.is_pinned(tile))
    }

    pub fn pinned_tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.pins
            .iter()
            .enumerate()
            .filter(|(_, pinned)| **pinned)
            .map(|(index, _)| self.size.tile_at_index(index))
    }

    pub fn pin_count(&self) -> usize {
        self.pins.iter().filter(|pinned| **pinned).count()
    }

    /// Flips the pin on `tile` and returns the new state, or `None` when the
    /// tile is outside the grid.
    pub fn toggle_pin(&mut self, tile: TileCoord) -> Option<bool> {
        let index = self.size.tile_index(tile)?;
        self.pins[index] = !self.pins[index];
        Some(self.pins[index])
    }

    pub fn set_pinned(&mut self, tile: TileCoord, pinned: bool) -> bool {
        match self.size.tile_index(tile) {
            Some(index) if self.pins[index] != pinned => {
                self.pins[index] = pinned;
                true
            }
            _ => false,
        }
    }

    pub fn clear_pins(&mut self) {
        self.pins.iter_mut().for_each(|pinned| *pinned = false);
    }

    /// Writes `value` to every unlocked corner of `tile`.
    ///
    /// Returns the `tile ± 1` region when at least one vertex changed. Pinned
    /// and out-of-range tiles are ignored.
    pub fn set_tile_height(
        &mut self,
        tile: TileCoord,
        value: f32,
    ) -> Result<Option<TileRegion>, HeightEditError> {
        if !value.is_finite() {
            return Err(HeightEditError::NonFinite);
        }
        if !self.size.contains(tile) || self.is_pinned(tile) {
            return Ok(None);
        }

        let target = self.limits.quantize(value);
        let mut changed = false;
        for corner in tile.corners() {
            if self.is_vertex_locked(corner) {
                continue;
            }
            let Some(index) = self.size.vertex_index(corner) else {
                continue;
            };
            if self.heights[index] != target {
                self.heights[index] = target;
                changed = true;
            }
        }

        Ok(changed.then(|| TileRegion::around(tile, 1, self.size)))
    }

    /// Height at a vertex; coordinates outside the lattice are clamped onto it.
    pub fn sample(&self, vertex: VertexCoord) -> f32 {
        let x = vertex.x.clamp(0, self.size.width() as i32);
        let z = vertex.z.clamp(0, self.size.height() as i32);
        self.size
            .vertex_index(VertexCoord::new(x, z))
            .map_or(0.0, |index| self.heights[index])
    }

    pub fn corner_heights(&self, tile: TileCoord) -> [f32; 4] {
        tile.corners().map(|corner| self.sample(corner))
    }

    pub fn average_corner_height(&self, tile: TileCoord) -> f32 {
        self.corner_heights(tile).iter().sum::<f32>() * 0.25
    }

    /// Bilinear interpolation of the ground at world `(x, z)`.
    pub fn bilinear(&self, x: f32, z: f32) -> f32 {
        let width = self.size.width() as f32;
        let height = self.size.height() as f32;
        let gx = clamp_below(x + width / 2.0, width);
        let gz = clamp_below(z + height / 2.0, height);

        let ix = gx.floor();
        let iz = gz.floor();
        let fx = gx - ix;
        let fz = gz - iz;
        let (ix, iz) = (ix as i32, iz as i32);

        let h00 = self.sample(VertexCoord::new(ix, iz));
        let h10 = self.sample(VertexCoord::new(ix + 1, iz));
        let h01 = self.sample(VertexCoord::new(ix, iz + 1));
        let h11 = self.sample(VertexCoord::new(ix + 1, iz + 1));

        let near = h00 + (h10 - h00) * fx;
        let far = h01 + (h11 - h01) * fx;
        near + (far - near) * fz
    }
}

fn clamp_below(value: f32, upper: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, upper - 1e-4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(width: usize, height: usize) -> HeightField {
        HeightField::new(GridSize::new(width, height), HeightLimits::default())
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn set_tile_height_writes_all_free_corners() {
        let mut heights = field(4, 4);
        let region = heights
            .set_tile_height(TileCoord::new(1, 1), 1.0)
            .unwrap()
            .expect("heights changed");

        assert_eq!(region, TileRegion::around(TileCoord::new(1, 1), 1, heights.size()));
        for corner in TileCoord::new(1, 1).corners() {
            assert!(approx(heights.sample(corner), 1.0));
        }
        assert_eq!(heights.sample(VertexCoord::new(0, 0)), 0.0);
    }

    #[test]
    fn set_tile_height_quantizes_and_clamps() {
        let mut heights = field(3, 3);
        heights.set_tile_height(TileCoord::new(0, 0), 0.33).unwrap();
        assert!(approx(heights.sample(VertexCoord::new(0, 0)), 0.4));

        heights.set_tile_height(TileCoord::new(2, 2), 999.0).unwrap();
        assert_eq!(heights.sample(VertexCoord::new(3, 3)), 50.0);
    }

    #[test]
    fn rejects_non_finite_heights() {
        let mut heights = field(3, 3);
        assert_eq!(
            heights.set_tile_height(TileCoord::new(0, 0), f32::NAN),
            Err(HeightEditError::NonFinite)
        );
        assert_eq!(
            heights.set_tile_height(TileCoord::new(0, 0), f32::INFINITY),
            Err(HeightEditError::NonFinite)
        );
    }

    #[test]
    fn ignores_out_of_range_tiles() {
        let mut heights = field(3, 3);
        assert_eq!(heights.set_tile_height(TileCoord::new(3, 0), 1.0), Ok(None));
        assert_eq!(heights.set_tile_height(TileCoord::new(-1, 0), 1.0), Ok(None));
        assert_eq!(heights.toggle_pin(TileCoord::new(0, 7)), None);
    }

    #[test]
    fn pinned_tile_is_not_editable() {
        let mut heights = field(5, 5);
        heights.toggle_pin(TileCoord::new(2, 2));
        assert_eq!(heights.set_tile_height(TileCoord::new(2, 2), 1.0), Ok(None));
        assert_eq!(heights.corner_heights(TileCoord::new(2, 2)), [0.0; 4]);
    }

    #[test]
    fn neighbor_of_pin_only_moves_unshared_corners() {
        let mut heights = field(5, 5);
        heights.toggle_pin(TileCoord::new(2, 2));
        heights.set_tile_height(TileCoord::new(1, 2), 1.0).unwrap();

        assert!(approx(heights.sample(VertexCoord::new(1, 2)), 1.0));
        assert!(approx(heights.sample(VertexCoord::new(1, 3)), 1.0));
        assert_eq!(heights.sample(VertexCoord::new(2, 2)), 0.0);
        assert_eq!(heights.sample(VertexCoord::new(2, 3)), 0.0);
    }

    #[test]
    fn diagonal_neighbor_of_pin_loses_one_corner() {
        let mut heights = field(5, 5);
        heights.toggle_pin(TileCoord::new(2, 2));
        heights.set_tile_height(TileCoord::new(1, 1), 1.0).unwrap();

        assert_eq!(heights.sample(VertexCoord::new(2, 2)), 0.0);
        assert!(approx(heights.sample(VertexCoord::new(1, 1)), 1.0));
        assert!(approx(heights.sample(VertexCoord::new(2, 1)), 1.0));
        assert!(approx(heights.sample(VertexCoord::new(1, 2)), 1.0));
    }

    #[test]
    fn unpinning_releases_locks() {
        let mut heights = field(5, 5);
        assert_eq!(heights.toggle_pin(TileCoord::new(2, 2)), Some(true));
        assert!(heights.is_vertex_locked(VertexCoord::new(3, 3)));
        assert_eq!(heights.toggle_pin(TileCoord::new(2, 2)), Some(false));
        assert!(!heights.is_vertex_locked(VertexCoord::new(3, 3)));

        heights.set_tile_height(TileCoord::new(1, 2), 1.0).unwrap();
        assert!(approx(heights.sample(VertexCoord::new(2, 2)), 1.0));
    }

    #[test]
    fn random_edits_never_move_pinned_corners() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut heights = field(8, 8);
        let pinned = [TileCoord::new(3, 3), TileCoord::new(0, 7), TileCoord::new(6, 1)];
        for tile in pinned {
            heights.set_tile_height(tile, rng.f32() * 10.0).unwrap();
        }
        for tile in pinned {
            heights.toggle_pin(tile);
        }
        let before: Vec<[f32; 4]> = pinned.iter().map(|t| heights.corner_heights(*t)).collect();

        for _ in 0..500 {
            let tile = TileCoord::new(rng.i32(0..8), rng.i32(0..8));
            heights
                .set_tile_height(tile, rng.f32() * 100.0 - 50.0)
                .unwrap();
        }

        let after: Vec<[f32; 4]> = pinned.iter().map(|t| heights.corner_heights(*t)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn bilinear_interpolates_between_vertices() {
        let mut heights = field(4, 4);
        heights.set_tile_height(TileCoord::new(1, 1), 1.0).unwrap();

        // Vertex (2,2) sits at the world origin of a 4x4 grid.
        assert!(approx(heights.bilinear(0.0, 0.0), 1.0));
        // Center of tile (2,2) sees one raised corner out of four.
        assert!(approx(heights.bilinear(0.5, 0.5), 0.25));
        assert!(approx(heights.bilinear(-100.0, -100.0), 0.0));
    }

    #[test]
    fn from_parts_requantizes_and_zeroes_non_finite() {
        let size = GridSize::new(2, 2);
        let mut raw = vec![0.0; size.vertex_count()];
        raw[0] = 0.31;
        raw[1] = f32::NAN;
        let heights = HeightField::from_parts(size, HeightLimits::default(), &raw, &[true]);

        assert!(approx(heights.sample(VertexCoord::new(0, 0)), 0.4));
        assert_eq!(heights.sample(VertexCoord::new(1, 0)), 0.0);
        assert!(heights.is_pinned(TileCoord::new(0, 0)));
        assert!(!heights.is_pinned(TileCoord::new(1, 0)));
    }
}
