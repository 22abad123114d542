use crate::coordinates::{GridSize, TileCoord, tile_to_world};
use crate::height_field::HeightField;
use crate::pathfinding::PathPlanner;
use crate::walkability::WalkabilityMask;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

pub const ARRIVAL_DISTANCE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Idle,
    Moving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveRejectedReason {
    AlreadyMoving,
    OutOfRange,
    AlreadyThere,
    Frozen,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRejected {
    pub reason: MoveRejectedReason,
}

impl MoveRejected {
    pub fn new(reason: MoveRejectedReason) -> Self {
        Self { reason }
    }

    pub fn message(&self) -> &'static str {
        match self.reason {
            MoveRejectedReason::AlreadyMoving => "agent is already moving",
            MoveRejectedReason::OutOfRange => "target tile is outside the grid",
            MoveRejectedReason::AlreadyThere => "agent is already on the target tile",
            MoveRejectedReason::Frozen => "tap-to-move is frozen",
            MoveRejectedReason::Unreachable => "no walkable path to the target tile",
        }
    }
}

impl fmt::Display for MoveRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Error for MoveRejected {}

/// Motion produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentStep {
    pub position: [f32; 3],
    pub delta: [f32; 3],
    pub tile: TileCoord,
    pub arrived: bool,
}

#[derive(Debug, Clone)]
pub struct CharacterAgent {
    tile: TileCoord,
    position: [f32; 3],
    path: VecDeque<TileCoord>,
    speed: f32,
    radius: f32,
}

impl CharacterAgent {
    pub fn new(tile: TileCoord, heights: &HeightField, speed: f32, radius: f32) -> Self {
        let mut agent = Self {
            tile,
            position: [0.0; 3],
            path: VecDeque::new(),
            speed,
            radius,
        };
        agent.snap_to(tile, heights);
        agent
    }

    pub fn state(&self) -> AgentState {
        if self.path.is_empty() {
            AgentState::Idle
        } else {
            AgentState::Moving
        }
    }

    pub fn is_moving(&self) -> bool {
        self.state() == AgentState::Moving
    }

    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    pub fn position(&self) -> [f32; 3] {
        self.position
    }

    /// Remaining tiles, excluding the one the agent last arrived on.
    pub fn path(&self) -> impl Iterator<Item = &TileCoord> {
        self.path.iter()
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Places the agent on `tile` (clamped into the grid) and drops any path.
    pub fn snap_to(&mut self, tile: TileCoord, heights: &HeightField) {
        let tile = heights.size().clamp_tile(tile);
        let [x, z] = tile_to_world(tile, heights.size());
        self.tile = tile;
        self.path.clear();
        self.position = [x, heights.bilinear(x, z) + self.radius, z];
    }

    /// Re-derives the agent's height after the ground under it changed.
    pub fn reground(&mut self, heights: &HeightField) {
        let [x, _, z] = self.position;
        self.position[1] = heights.bilinear(x, z) + self.radius;
    }

    /// Plans from the current tile and queues the result; returns the number
    /// of tiles left to walk.
    pub fn request_path(
        &mut self,
        target: TileCoord,
        mask: &WalkabilityMask,
        planner: &PathPlanner,
        size: GridSize,
    ) -> Result<usize, MoveRejected> {
        if self.is_moving() {
            return Err(MoveRejected::new(MoveRejectedReason::AlreadyMoving));
        }
        if !size.contains(target) {
            return Err(MoveRejected::new(MoveRejectedReason::OutOfRange));
        }
        if target == self.tile {
            return Err(MoveRejected::new(MoveRejectedReason::AlreadyThere));
        }

        let path = planner.find_path(mask, self.tile, target);
        if path.len() < 2 {
            return Err(MoveRejected::new(MoveRejectedReason::Unreachable));
        }

        self.path = path.into_iter().skip(1).collect();
        Ok(self.path.len())
    }

    /// Advances toward the queued tiles by at most `speed * dt`. Leftover
    /// travel after reaching a tile carries into the next one.
    pub fn tick(&mut self, dt: f32, heights: &HeightField) -> Option<AgentStep> {
        if !self.is_moving() || !dt.is_finite() || dt <= 0.0 {
            return None;
        }

        let size = heights.size();
        let start = self.position;
        let mut budget = self.speed * dt;
        let mut arrived = false;

        while budget > 0.0 {
            let Some(next) = self.path.front().copied() else {
                break;
            };
            let [tx, tz] = tile_to_world(next, size);
            let dx = tx - self.position[0];
            let dz = tz - self.position[2];
            let remaining = (dx * dx + dz * dz).sqrt();

            if remaining <= budget {
                budget -= remaining;
                self.position[0] = tx;
                self.position[2] = tz;
            } else {
                let scale = budget / remaining;
                self.position[0] += dx * scale;
                self.position[2] += dz * scale;
                budget = 0.0;
                if remaining * (1.0 - scale) >= ARRIVAL_DISTANCE {
                    break;
                }
            }
            self.tile = next;
            self.path.pop_front();
            arrived = true;
        }

        self.reground(heights);
        let position = self.position;
        Some(AgentStep {
            position,
            delta: [
                position[0] - start[0],
                position[1] - start[1],
                position[2] - start[2],
            ],
            tile: self.tile,
            arrived: arrived && self.path.is_empty(),
        })
    }
}
