use serde::{Deserialize, Serialize};

pub const MIN_GRID_SIZE: usize = 2;
pub const MAX_GRID_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }

    /// Corner vertices in the order (x,z), (x+1,z), (x,z+1), (x+1,z+1).
    pub fn corners(self) -> [VertexCoord; 4] {
        [
            VertexCoord::new(self.x, self.z),
            VertexCoord::new(self.x + 1, self.z),
            VertexCoord::new(self.x, self.z + 1),
            VertexCoord::new(self.x + 1, self.z + 1),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexCoord {
    pub x: i32,
    pub z: i32,
}

impl VertexCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The up-to-four tiles sharing this vertex. Out-of-range entries are
    /// filtered by the caller.
    pub fn adjacent_tiles(self) -> [TileCoord; 4] {
        [
            TileCoord::new(self.x - 1, self.z - 1),
            TileCoord::new(self.x, self.z - 1),
            TileCoord::new(self.x - 1, self.z),
            TileCoord::new(self.x, self.z),
        ]
    }
}

/// Grid dimensions in tiles. Only built through [`GridSize::new`], so both
/// dimensions always sit in `[MIN_GRID_SIZE, MAX_GRID_SIZE]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize {
    width: usize,
    height: usize,
}

impl GridSize {
    /// Builds a size with both dimensions clamped to `[MIN_GRID_SIZE, MAX_GRID_SIZE]`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
            height: height.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_count(&self) -> usize {
        self.width * self.height
    }

    pub fn vertex_columns(&self) -> usize {
        self.width + 1
    }

    pub fn vertex_rows(&self) -> usize {
        self.height + 1
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_columns() * self.vertex_rows()
    }

    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x >= 0 && tile.z >= 0 && (tile.x as usize) < self.width && (tile.z as usize) < self.height
    }

    pub fn contains_vertex(&self, vertex: VertexCoord) -> bool {
        vertex.x >= 0
            && vertex.z >= 0
            && (vertex.x as usize) <= self.width
            && (vertex.z as usize) <= self.height
    }

    /// Row-major in `z`: `tz * W + tx`.
    pub fn tile_index(&self, tile: TileCoord) -> Option<usize> {
        self.contains(tile)
            .then(|| tile.z as usize * self.width + tile.x as usize)
    }

    /// Row-major in `z`: `vz * (W + 1) + vx`.
    pub fn vertex_index(&self, vertex: VertexCoord) -> Option<usize> {
        self.contains_vertex(vertex)
            .then(|| vertex.z as usize * self.vertex_columns() + vertex.x as usize)
    }

    pub fn tile_at_index(&self, index: usize) -> TileCoord {
        TileCoord::new((index % self.width) as i32, (index / self.width) as i32)
    }

    pub fn clamp_tile(&self, tile: TileCoord) -> TileCoord {
        TileCoord::new(
            tile.x.clamp(0, self.width as i32 - 1),
            tile.z.clamp(0, self.height as i32 - 1),
        )
    }

    pub fn center_tile(&self) -> TileCoord {
        TileCoord::new((self.width / 2) as i32, (self.height / 2) as i32)
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.tile_count()).map(|index| self.tile_at_index(index))
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(20, 20)
    }
}

/// Inclusive rectangle of tiles, always clipped to the grid it was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileRegion {
    pub min: TileCoord,
    pub max: TileCoord,
}

impl TileRegion {
    pub fn around(center: TileCoord, radius: i32, size: GridSize) -> Self {
        Self {
            min: size.clamp_tile(center.offset(-radius, -radius)),
            max: size.clamp_tile(center.offset(radius, radius)),
        }
    }

    pub fn whole(size: GridSize) -> Self {
        Self {
            min: TileCoord::new(0, 0),
            max: TileCoord::new(size.width() as i32 - 1, size.height() as i32 - 1),
        }
    }

    pub fn contains(&self, tile: TileCoord) -> bool {
        (self.min.x..=self.max.x).contains(&tile.x) && (self.min.z..=self.max.z).contains(&tile.z)
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + use<> {
        let (min, max) = (self.min, self.max);
        (min.z..=max.z).flat_map(move |z| (min.x..=max.x).map(move |x| TileCoord::new(x, z)))
    }
}

/// Center of tile `(tx, tz)` on the centered world plane.
pub fn tile_to_world(tile: TileCoord, size: GridSize) -> [f32; 2] {
    [
        tile.x as f32 - size.width() as f32 / 2.0 + 0.5,
        tile.z as f32 - size.height() as f32 / 2.0 + 0.5,
    ]
}

pub fn world_to_tile(x: f32, z: f32, size: GridSize) -> TileCoord {
    let tx = (x + size.width() as f32 / 2.0).floor();
    let tz = (z + size.height() as f32 / 2.0).floor();
    // NaN saturates to 0 in the cast, which the clamp keeps in range.
    size.clamp_tile(TileCoord::new(tx as i32, tz as i32))
}

/// World position of a vertex on the centered plane.
pub fn vertex_to_world(vertex: VertexCoord, size: GridSize) -> [f32; 2] {
    [
        vertex.x as f32 - size.width() as f32 / 2.0,
        vertex.z as f32 - size.height() as f32 / 2.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_round_trips_through_world_space() {
        for (width, height) in [(2, 2), (5, 5), (7, 4), (200, 13)] {
            let size = GridSize::new(width, height);
            for tile in size.tiles() {
                let [x, z] = tile_to_world(tile, size);
                assert_eq!(world_to_tile(x + 0.001, z + 0.001, size), tile);
            }
        }
    }

    #[test]
    fn tile_to_world_centers_the_grid() {
        let size = GridSize::new(4, 4);
        assert_eq!(tile_to_world(TileCoord::new(0, 0), size), [-1.5, -1.5]);
        assert_eq!(tile_to_world(TileCoord::new(3, 3), size), [1.5, 1.5]);
    }

    #[test]
    fn world_to_tile_clamps_outside_points() {
        let size = GridSize::new(5, 3);
        assert_eq!(world_to_tile(-100.0, 100.0, size), TileCoord::new(0, 2));
        assert_eq!(world_to_tile(f32::NAN, 0.0, size).x, 0);
    }

    #[test]
    fn grid_size_clamps_dimensions() {
        let size = GridSize::new(0, 500);
        assert_eq!((size.width(), size.height()), (2, 200));

        let smallest = GridSize::new(0, 0);
        assert_eq!(smallest.clamp_tile(TileCoord::new(-5, 9)), TileCoord::new(0, 1));
    }

    #[test]
    fn indices_are_row_major_in_z() {
        let size = GridSize::new(5, 4);
        assert_eq!(size.tile_index(TileCoord::new(1, 2)), Some(2 * 5 + 1));
        assert_eq!(size.vertex_index(VertexCoord::new(1, 2)), Some(2 * 6 + 1));
        assert_eq!(size.vertex_index(VertexCoord::new(5, 4)), Some(size.vertex_count() - 1));
        assert_eq!(size.tile_index(TileCoord::new(5, 0)), None);
        assert_eq!(size.tile_at_index(11), TileCoord::new(1, 2));
    }

    #[test]
    fn region_around_is_clipped() {
        let size = GridSize::new(4, 4);
        let region = TileRegion::around(TileCoord::new(0, 3), 1, size);
        assert_eq!(region.min, TileCoord::new(0, 2));
        assert_eq!(region.max, TileCoord::new(1, 3));
        assert_eq!(region.tiles().count(), 4);
    }
}
