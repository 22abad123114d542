//! Grid A* over a walkability mask.
//!
//! The open set is a binary heap with lazy deletion: improved nodes are pushed
//! again and stale entries are dropped on pop by comparing against the best
//! `g` recorded for the node.

use crate::config::EditorConfig;
use crate::coordinates::{GridSize, TileCoord};
use crate::walkability::WalkabilityMask;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const SQRT_2: f64 = std::f64::consts::SQRT_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    Manhattan,
    Euclidean,
    Chebyshev,
    Octile,
}

impl Heuristic {
    pub fn estimate(self, from: TileCoord, to: TileCoord) -> f64 {
        let dx = f64::from((to.x - from.x).abs());
        let dz = f64::from((to.z - from.z).abs());
        match self {
            Heuristic::Manhattan => dx + dz,
            Heuristic::Euclidean => (dx * dx + dz * dz).sqrt(),
            Heuristic::Chebyshev => dx.max(dz),
            Heuristic::Octile => dx.max(dz) + (SQRT_2 - 1.0) * dx.min(dz),
        }
    }
}

/// How diagonal steps treat the two orthogonal tiles they pass between,
/// when corner cutting is disallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerRule {
    /// At least one orthogonal neighbor must be walkable.
    #[default]
    Brush,
    /// Both orthogonal neighbors must be walkable.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathOptions {
    pub allow_diagonal: bool,
    pub dont_cross_corners: bool,
    pub corner_rule: CornerRule,
    pub heuristic: Option<Heuristic>,
    pub weight: f64,
}

impl PathOptions {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            allow_diagonal: config.allow_diagonal,
            dont_cross_corners: config.dont_cross_corners,
            corner_rule: config.corner_rule,
            heuristic: config.heuristic,
            weight: f64::from(config.heuristic_weight),
        }
    }

    pub fn orthogonal() -> Self {
        Self {
            allow_diagonal: false,
            ..Self::default()
        }
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic.unwrap_or(if self.allow_diagonal {
            Heuristic::Octile
        } else {
            Heuristic::Manhattan
        })
    }
}

impl Default for PathOptions {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    f: f64,
    g: f64,
    sequence: u64,
    index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // Reversed so the max-heap pops the lowest f, then the earliest insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

const ORTHOGONAL_STEPS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL_STEPS: [(i32, i32); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

#[derive(Debug, Clone, Default)]
pub struct PathPlanner {
    options: PathOptions,
}

impl PathPlanner {
    pub fn new(options: PathOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PathOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: PathOptions) {
        self.options = options;
    }

    /// Tiles from `start` to `goal`, both inclusive. Empty when either
    /// endpoint is blocked or no route exists.
    pub fn find_path(
        &self,
        mask: &WalkabilityMask,
        start: TileCoord,
        goal: TileCoord,
    ) -> Vec<TileCoord> {
        if !mask.is_walkable(start) || !mask.is_walkable(goal) {
            return Vec::new();
        }

        let size = mask.size();
        let (Some(start_index), Some(goal_index)) = (size.tile_index(start), size.tile_index(goal))
        else {
            return Vec::new();
        };

        let heuristic = self.options.heuristic();
        let weight = self.options.weight;
        let node_count = size.tile_count();
        let mut g_scores = vec![f64::INFINITY; node_count];
        let mut parents: Vec<Option<usize>> = vec![None; node_count];
        let mut closed = vec![false; node_count];
        let mut open = BinaryHeap::new();
        let mut sequence = 0u64;

        g_scores[start_index] = 0.0;
        open.push(OpenEntry {
            f: weight * heuristic.estimate(start, goal),
            g: 0.0,
            sequence,
            index: start_index,
        });

        while let Some(entry) = open.pop() {
            if closed[entry.index] || entry.g > g_scores[entry.index] {
                continue;
            }
            closed[entry.index] = true;

            if entry.index == goal_index {
                return reconstruct(&parents, goal_index, size);
            }

            let current = size.tile_at_index(entry.index);
            for (next, cost) in self.neighbors(mask, current) {
                let Some(next_index) = size.tile_index(next) else {
                    continue;
                };
                let tentative = entry.g + cost;
                if tentative >= g_scores[next_index] {
                    continue;
                }
                g_scores[next_index] = tentative;
                parents[next_index] = Some(entry.index);
                closed[next_index] = false;
                sequence += 1;
                open.push(OpenEntry {
                    f: tentative + weight * heuristic.estimate(next, goal),
                    g: tentative,
                    sequence,
                    index: next_index,
                });
            }
        }

        Vec::new()
    }

    /// Total step cost of `path` under the active neighborhood.
    pub fn path_cost(path: &[TileCoord]) -> f64 {
        path.windows(2)
            .map(|pair| {
                let diagonal = pair[0].x != pair[1].x && pair[0].z != pair[1].z;
                if diagonal { SQRT_2 } else { 1.0 }
            })
            .sum()
    }

    fn neighbors(&self, mask: &WalkabilityMask, tile: TileCoord) -> Vec<(TileCoord, f64)> {
        let mut neighbors = Vec::with_capacity(8);
        for (dx, dz) in ORTHOGONAL_STEPS {
            let next = tile.offset(dx, dz);
            if mask.is_walkable(next) {
                neighbors.push((next, 1.0));
            }
        }

        if !self.options.allow_diagonal {
            return neighbors;
        }

        for (dx, dz) in DIAGONAL_STEPS {
            let next = tile.offset(dx, dz);
            if !mask.is_walkable(next) {
                continue;
            }
            if self.options.dont_cross_corners {
                let side_x = mask.is_walkable(tile.offset(dx, 0));
                let side_z = mask.is_walkable(tile.offset(0, dz));
                let admitted = match self.options.corner_rule {
                    CornerRule::Brush => side_x || side_z,
                    CornerRule::Strict => side_x && side_z,
                };
                if !admitted {
                    continue;
                }
            }
            neighbors.push((next, SQRT_2));
        }

        neighbors
    }
}

fn reconstruct(
    parents: &[Option<usize>],
    goal_index: usize,
    size: GridSize,
) -> Vec<TileCoord> {
    let mut path = vec![size.tile_at_index(goal_index)];
    let mut current = goal_index;
    while let Some(parent) = parents[current] {
        path.push(size.tile_at_index(parent));
        current = parent;
    }
    path.reverse();
    path
}
