pub mod agent;
pub mod cliffs;
pub mod codec;
pub mod config;
pub mod coordinates;
pub mod editor;
pub mod events;
pub mod height_field;
pub mod markers;
pub mod modes;
pub mod paint;
pub mod pathfinding;
pub mod walkability;

pub use agent::{AgentState, AgentStep, CharacterAgent, MoveRejected, MoveRejectedReason};
pub use cliffs::{Cliff, CliffBuilder, CliffEdge, EdgeAxis};
pub use codec::{CodecError, PROJECT_VERSION, ProjectDocument, ProjectSnapshot};
pub use config::EditorConfig;
pub use coordinates::{
    GridSize, MAX_GRID_SIZE, MIN_GRID_SIZE, TileCoord, TileRegion, VertexCoord, tile_to_world,
    world_to_tile,
};
pub use editor::Editor;
pub use events::{EditorEvent, EventQueue, HeightObserver};
pub use height_field::{HeightEditError, HeightField, HeightLimits};
pub use markers::MarkerLayer;
pub use modes::{EditorMode, FreezeLocked, ModeArbiter, PointerAction};
pub use paint::{PaintChange, PaintLayer, TileKind};
pub use pathfinding::{CornerRule, Heuristic, PathOptions, PathPlanner};
pub use walkability::WalkabilityMask;
