//! Vertical walls along edges that border a pinned tile.

use crate::coordinates::{GridSize, TileCoord, TileRegion, VertexCoord, vertex_to_world};
use crate::events::HeightObserver;
use crate::height_field::HeightField;
use std::collections::BTreeMap;

pub const CLIFF_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeAxis {
    /// Constant `x`, running from vertex `(x, z)` to `(x, z + 1)`.
    AlongZ,
    /// Constant `z`, running from vertex `(x, z)` to `(x + 1, z)`.
    AlongX,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CliffEdge {
    pub axis: EdgeAxis,
    pub x: i32,
    pub z: i32,
}

impl CliffEdge {
    pub fn along_z(x: i32, z: i32) -> Self {
        Self { axis: EdgeAxis::AlongZ, x, z }
    }

    pub fn along_x(x: i32, z: i32) -> Self {
        Self { axis: EdgeAxis::AlongX, x, z }
    }

    /// Tiles on the low and high side of the edge.
    pub fn tiles(&self) -> (TileCoord, TileCoord) {
        match self.axis {
            EdgeAxis::AlongZ => (TileCoord::new(self.x - 1, self.z), TileCoord::new(self.x, self.z)),
            EdgeAxis::AlongX => (TileCoord::new(self.x, self.z - 1), TileCoord::new(self.x, self.z)),
        }
    }

    pub fn endpoints(&self) -> (VertexCoord, VertexCoord) {
        let start = VertexCoord::new(self.x, self.z);
        match self.axis {
            EdgeAxis::AlongZ => (start, VertexCoord::new(self.x, self.z + 1)),
            EdgeAxis::AlongX => (start, VertexCoord::new(self.x + 1, self.z)),
        }
    }

    /// The two corners of `tile` on the opposite side from this edge.
    fn far_vertices(&self, tile: TileCoord) -> [VertexCoord; 2] {
        let (low, _) = self.tiles();
        let on_low_side = tile == low;
        match (self.axis, on_low_side) {
            (EdgeAxis::AlongZ, true) => [VertexCoord::new(self.x - 1, self.z), VertexCoord::new(self.x - 1, self.z + 1)],
            (EdgeAxis::AlongZ, false) => [VertexCoord::new(self.x + 1, self.z), VertexCoord::new(self.x + 1, self.z + 1)],
            (EdgeAxis::AlongX, true) => [VertexCoord::new(self.x, self.z - 1), VertexCoord::new(self.x + 1, self.z - 1)],
            (EdgeAxis::AlongX, false) => [VertexCoord::new(self.x, self.z + 1), VertexCoord::new(self.x + 1, self.z + 1)],
        }
    }

    /// Edges of `tile` whose other side is also inside the grid.
    pub fn interior_edges_of(tile: TileCoord, size: GridSize) -> impl Iterator<Item = CliffEdge> {
        [
            CliffEdge::along_z(tile.x, tile.z),
            CliffEdge::along_z(tile.x + 1, tile.z),
            CliffEdge::along_x(tile.x, tile.z),
            CliffEdge::along_x(tile.x, tile.z + 1),
        ]
        .into_iter()
        .filter(move |edge| {
            let (low, high) = edge.tiles();
            size.contains(low) && size.contains(high)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cliff {
    pub edge: CliffEdge,
    /// World-space `[x, z]` of the edge endpoints.
    pub start: [f32; 2],
    pub end: [f32; 2],
    pub bottom: f32,
    pub top: f32,
    /// Unit normal facing away from the pinned side.
    pub normal: [f32; 3],
}

impl Cliff {
    pub fn span(&self) -> f32 {
        self.top - self.bottom
    }
}

#[derive(Debug, Clone, Default)]
pub struct CliffBuilder {
    cliffs: BTreeMap<CliffEdge, Cliff>,
}

impl CliffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cliffs(&self) -> impl Iterator<Item = &Cliff> {
        self.cliffs.values()
    }

    pub fn cliff(&self, edge: CliffEdge) -> Option<&Cliff> {
        self.cliffs.get(&edge)
    }

    pub fn len(&self) -> usize {
        self.cliffs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cliffs.is_empty()
    }

    pub fn clear(&mut self) {
        self.cliffs.clear();
    }

    pub fn rebuild_all(&mut self, heights: &HeightField) {
        self.cliffs.clear();
        self.rebuild_region(heights, TileRegion::whole(heights.size()));
    }

    /// Recomputes every edge incident to a tile in `region`.
    pub fn rebuild_region(&mut self, heights: &HeightField, region: TileRegion) {
        let size = heights.size();
        for tile in region.tiles() {
            for edge in CliffEdge::interior_edges_of(tile, size) {
                match build_cliff(heights, edge) {
                    Some(cliff) => {
                        self.cliffs.insert(edge, cliff);
                    }
                    None => {
                        self.cliffs.remove(&edge);
                    }
                }
            }
        }
    }
}

impl HeightObserver for CliffBuilder {
    fn heights_changed(&mut self, heights: &HeightField, region: TileRegion) {
        self.rebuild_region(heights, region);
    }
}

fn build_cliff(heights: &HeightField, edge: CliffEdge) -> Option<Cliff> {
    let (low, high) = edge.tiles();
    let low_pinned = heights.is_pinned(low);
    let high_pinned = heights.is_pinned(high);
    if !low_pinned && !high_pinned {
        return None;
    }

    let (v0, v1) = edge.endpoints();
    let mut samples = vec![heights.sample(v0), heights.sample(v1)];
    // An unpinned neighbor slopes away from the plateau edge; the wall covers
    // the rise to its far corners.
    for (tile, pinned) in [(low, low_pinned), (high, high_pinned)] {
        if !pinned {
            samples.extend(edge.far_vertices(tile).map(|v| heights.sample(v)));
        }
    }

    let bottom = samples.iter().copied().fold(f32::INFINITY, f32::min);
    let top = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if top - bottom < CLIFF_EPSILON {
        return None;
    }

    let size = heights.size();
    let facing_high = if low_pinned == high_pinned {
        heights.average_corner_height(high) < heights.average_corner_height(low)
    } else {
        low_pinned
    };
    let sign = if facing_high { 1.0 } else { -1.0 };
    let normal = match edge.axis {
        EdgeAxis::AlongZ => [sign, 0.0, 0.0],
        EdgeAxis::AlongX => [0.0, 0.0, sign],
    };

    Some(Cliff {
        edge,
        start: vertex_to_world(v0, size),
        end: vertex_to_world(v1, size),
        bottom,
        top,
        normal,
    })
}
