//! The editor owns the grid and every layer built on it.
//!
//! Lifecycle: `Editor::new` → `regenerate`/`load_*` any number of times →
//! drop. All mutation goes through `&mut Editor`, so observers never see a
//! half-applied change.

use crate::agent::{AgentStep, CharacterAgent, MoveRejected, MoveRejectedReason};
use crate::cliffs::CliffBuilder;
use crate::codec::{self, CodecError, ProjectSnapshot};
use crate::config::EditorConfig;
use crate::coordinates::{GridSize, TileCoord, TileRegion};
use crate::events::{EditorEvent, EventQueue, HeightObserver};
use crate::height_field::{HeightEditError, HeightField, HeightLimits};
use crate::markers::MarkerLayer;
use crate::modes::{EditorMode, FreezeLocked, ModeArbiter, ModeTransition, PointerAction};
use crate::paint::{PaintChange, PaintLayer, TileKind};
use crate::pathfinding::{PathOptions, PathPlanner};
use crate::walkability::WalkabilityMask;
use log::{debug, info, warn};

pub struct Editor {
    config: EditorConfig,
    heights: HeightField,
    cliffs: CliffBuilder,
    paint: PaintLayer,
    markers: MarkerLayer,
    mask: WalkabilityMask,
    planner: PathPlanner,
    agent: CharacterAgent,
    arbiter: ModeArbiter,
    events: EventQueue,
}

impl Editor {
    pub fn new(config: EditorConfig, width: usize, height: usize) -> Self {
        let config = config.normalized();
        let size = GridSize::new(width, height);
        let heights = HeightField::new(size, HeightLimits::from_config(&config));
        let agent = CharacterAgent::new(
            size.center_tile(),
            &heights,
            config.agent_speed,
            config.agent_radius,
        );

        Self {
            planner: PathPlanner::new(PathOptions::from_config(&config)),
            heights,
            cliffs: CliffBuilder::new(),
            paint: PaintLayer::new(),
            markers: MarkerLayer::new(),
            mask: WalkabilityMask::all_walkable(size),
            agent,
            arbiter: ModeArbiter::new(),
            events: EventQueue::new(),
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn size(&self) -> GridSize {
        self.heights.size()
    }

    pub fn heights(&self) -> &HeightField {
        &self.heights
    }

    pub fn cliffs(&self) -> &CliffBuilder {
        &self.cliffs
    }

    pub fn paint_layer(&self) -> &PaintLayer {
        &self.paint
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    /// The last committed mask; edits in marking mode are not visible here
    /// until marking is left.
    pub fn walkability(&self) -> &WalkabilityMask {
        &self.mask
    }

    pub fn agent(&self) -> &CharacterAgent {
        &self.agent
    }

    pub fn mode(&self) -> EditorMode {
        self.arbiter.mode()
    }

    pub fn freeze_tap_to_move(&self) -> bool {
        self.arbiter.freeze_tap_to_move()
    }

    pub fn freeze_locked(&self) -> bool {
        self.arbiter.freeze_locked()
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain()
    }

    pub fn regenerate(&mut self, width: usize, height: usize) {
        let size = GridSize::new(width, height);
        self.regenerate_with_seed(width, height, size.center_tile());
    }

    /// Replaces the grid and every layer; the agent is placed on `seed`.
    pub fn regenerate_with_seed(&mut self, width: usize, height: usize, seed: TileCoord) {
        let size = GridSize::new(width, height);
        self.release_overlays();

        self.heights.reset(size);
        self.cliffs.clear();
        self.mask = WalkabilityMask::all_walkable(size);
        self.agent.snap_to(seed, &self.heights);
        let transition = self.arbiter.set_mode(EditorMode::NormalMove);

        info!("regenerated {}x{} grid", size.width(), size.height());
        self.events.push(EditorEvent::Regenerated {
            width: size.width(),
            height: size.height(),
        });
        self.publish_transition(transition);
        self.push_agent_moved([0.0; 3]);
    }

    /// Dispatches a tap on `tile` according to the active mode. Returns
    /// whether anything changed.
    pub fn pointer_tile(&mut self, tile: TileCoord) -> bool {
        match self.arbiter.route(tile) {
            PointerAction::MoveAgent(target) => match self.request_move(target) {
                Ok(_) => true,
                Err(err) => {
                    debug!("move to {:?} ignored: {}", target, err);
                    false
                }
            },
            PointerAction::ToggleMarker(target) => self.toggle_marker(target).is_some(),
            PointerAction::Paint(target, kind) => {
                !matches!(self.paint(target, kind), PaintChange::Ignored | PaintChange::Unchanged)
            }
            PointerAction::SetHeight(target, value) => match self.set_tile_height(target, value) {
                Ok(changed) => changed,
                Err(err) => {
                    debug!("height edit on {:?} ignored: {}", target, err);
                    false
                }
            },
            PointerAction::TogglePin(target) => self.toggle_pin(target).is_some(),
            PointerAction::Frozen => {
                debug!("tap on {:?} ignored: movement is frozen", tile);
                false
            }
        }
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        let mode = match mode {
            EditorMode::HeightEdit {
                pinning,
                desired_height,
            } => EditorMode::HeightEdit {
                pinning,
                desired_height: self.quantized_or_zero(desired_height),
            },
            other => other,
        };

        let transition = self.arbiter.set_mode(mode);
        if !transition.changed() {
            return;
        }
        if transition.commit_markers {
            self.commit_markers();
        }
        self.publish_transition(transition);
    }

    pub fn set_pinning(&mut self, pinning: bool) {
        if self.arbiter.set_pinning(pinning) {
            self.events.push(EditorEvent::ModeChanged);
        }
    }

    pub fn set_desired_height(&mut self, height: f32) {
        let height = self.quantized_or_zero(height);
        if self.arbiter.set_desired_height(height) {
            self.events.push(EditorEvent::ModeChanged);
        }
    }

    pub fn set_freeze_tap_to_move(&mut self, freeze: bool) -> Result<(), FreezeLocked> {
        self.arbiter.set_freeze_tap_to_move(freeze)?;
        self.events.push(EditorEvent::ModeChanged);
        Ok(())
    }

    /// Returns whether any vertex changed.
    pub fn set_tile_height(&mut self, tile: TileCoord, value: f32) -> Result<bool, HeightEditError> {
        let Some(region) = self.heights.set_tile_height(tile, value)? else {
            return Ok(false);
        };
        self.heights_changed(region);
        Ok(true)
    }

    /// Returns the new pin state, or `None` for tiles outside the grid.
    pub fn toggle_pin(&mut self, tile: TileCoord) -> Option<bool> {
        let pinned = self.heights.toggle_pin(tile)?;
        let region = TileRegion::around(tile, 1, self.size());
        self.cliffs.rebuild_region(&self.heights, region);
        self.events.push(EditorEvent::PinChanged { tile, pinned });
        self.events.push(EditorEvent::CliffsRebuilt { region });
        Some(pinned)
    }

    pub fn paint(&mut self, tile: TileCoord, kind: TileKind) -> PaintChange {
        let change = self.paint.paint(tile, kind, &self.heights);
        match change {
            PaintChange::Created => {
                self.events.push(EditorEvent::PaintChanged { tile, kind: Some(kind) });
            }
            PaintChange::Replaced { .. } => {
                self.events.push(EditorEvent::PaintChanged { tile, kind: None });
                self.events.push(EditorEvent::PaintChanged { tile, kind: Some(kind) });
            }
            PaintChange::Ignored | PaintChange::Unchanged => {}
        }
        change
    }

    pub fn erase_paint(&mut self, tile: TileCoord) -> Option<TileKind> {
        let erased = self.paint.erase(tile)?;
        self.events.push(EditorEvent::PaintChanged { tile, kind: None });
        Some(erased)
    }

    /// Adds or removes a marker; the walkability mask only changes on commit.
    pub fn toggle_marker(&mut self, tile: TileCoord) -> Option<bool> {
        let present = self.markers.toggle(tile, &self.heights)?;
        self.events.push(EditorEvent::MarkersChanged { tile, present });
        Some(present)
    }

    /// Publishes the marker layer as the mask the planner uses.
    pub fn commit_markers(&mut self) -> &WalkabilityMask {
        self.mask = self.markers.commit(self.size());
        debug!(
            "committed walkability mask with {} blocked tiles",
            self.markers.len()
        );
        &self.mask
    }

    pub fn request_move(&mut self, target: TileCoord) -> Result<usize, MoveRejected> {
        if self.arbiter.freeze_tap_to_move() {
            return Err(MoveRejected::new(MoveRejectedReason::Frozen));
        }
        let size = self.size();
        self.agent
            .request_path(target, &self.mask, &self.planner, size)
    }

    /// Path preview against the committed mask; does not move the agent.
    pub fn plan_path(&self, from: TileCoord, to: TileCoord) -> Vec<TileCoord> {
        self.planner.find_path(&self.mask, from, to)
    }

    pub fn tick(&mut self, dt: f32) -> Option<AgentStep> {
        let step = self.agent.tick(dt, &self.heights)?;
        self.events.push(EditorEvent::AgentMoved {
            position: step.position,
            delta: step.delta,
            tile: step.tile,
        });
        Some(step)
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            size: self.size(),
            character: self.agent.tile(),
            freeze_tap_to_move: self.arbiter.freeze_tap_to_move(),
            markers: self.markers.tiles(),
            tiles: self.paint.serialize(),
            height_step: self.heights.limits().step,
            pins: (0..self.size().tile_count())
                .map(|index| self.heights.is_pinned(self.size().tile_at_index(index)))
                .collect(),
            heights: self.heights.heights().to_vec(),
        }
    }

    pub fn save_json(&self) -> Result<String, CodecError> {
        let json = codec::to_json_string(&self.snapshot())?;
        info!("saved project ({} bytes)", json.len());
        Ok(json)
    }

    /// Loads a project. On error the editor is left untouched.
    pub fn load_json(&mut self, json: &str) -> Result<(), CodecError> {
        match codec::from_json_str(json) {
            Ok(snapshot) => {
                self.restore(&snapshot);
                Ok(())
            }
            Err(err) => {
                warn!("failed to load project: {}", err);
                Err(err)
            }
        }
    }

    pub fn restore(&mut self, snapshot: &ProjectSnapshot) {
        let size = snapshot.size;
        let heights = HeightField::from_parts(
            size,
            HeightLimits::from_config(&self.config),
            &snapshot.heights,
            &snapshot.pins,
        );
        let mut cliffs = CliffBuilder::new();
        cliffs.rebuild_all(&heights);
        let mut paint = PaintLayer::new();
        paint.restore(&snapshot.tiles, &heights);
        let mut markers = MarkerLayer::new();
        markers.restore(&snapshot.markers, &heights);
        let mask = markers.commit(size);

        self.release_overlays();
        let transition = self.arbiter.set_mode(EditorMode::NormalMove);
        let _ = self.arbiter.set_freeze_tap_to_move(snapshot.freeze_tap_to_move);

        self.heights = heights;
        self.cliffs = cliffs;
        self.paint = paint;
        self.markers = markers;
        self.mask = mask;
        self.agent.snap_to(snapshot.character, &self.heights);

        info!(
            "loaded {}x{} project: {} painted, {} markers, {} pins",
            size.width(),
            size.height(),
            self.paint.len(),
            self.markers.len(),
            self.heights.pin_count()
        );
        self.events.push(EditorEvent::Regenerated {
            width: size.width(),
            height: size.height(),
        });
        for (tile, kind) in self.paint.serialize() {
            self.events.push(EditorEvent::PaintChanged { tile, kind: Some(kind) });
        }
        for tile in self.markers.tiles() {
            self.events.push(EditorEvent::MarkersChanged { tile, present: true });
        }
        self.events.push(EditorEvent::CliffsRebuilt {
            region: TileRegion::whole(size),
        });
        self.publish_transition(transition);
        self.push_agent_moved([0.0; 3]);
    }

    /// Renderer events for a mode change; always ends with `ModeChanged`.
    fn publish_transition(&mut self, transition: ModeTransition) {
        if transition.entered_height_edit {
            self.events.push(EditorEvent::PinOverlaysVisible(true));
        }
        if transition.left_height_edit {
            self.events.push(EditorEvent::PinOverlaysVisible(false));
        }
        if transition.changed() {
            info!("mode: {} -> {}", transition.previous.label(), transition.current.label());
        }
        self.events.push(EditorEvent::ModeChanged);
    }

    fn heights_changed(&mut self, region: TileRegion) {
        let observers: [&mut dyn HeightObserver; 3] =
            [&mut self.cliffs, &mut self.paint, &mut self.markers];
        for observer in observers {
            observer.heights_changed(&self.heights, region);
        }
        self.agent.reground(&self.heights);

        self.events.push(EditorEvent::HeightsUpdated { region });
        self.events.push(EditorEvent::CliffsRebuilt { region });
        self.events.push(EditorEvent::OverlaysReseated { region });
        self.push_agent_moved([0.0; 3]);
    }

    fn release_overlays(&mut self) {
        for tile in self.paint.clear_all() {
            self.events.push(EditorEvent::PaintChanged { tile, kind: None });
        }
        for tile in self.markers.clear_all() {
            self.events.push(EditorEvent::MarkersChanged { tile, present: false });
        }
    }

    fn push_agent_moved(&mut self, delta: [f32; 3]) {
        self.events.push(EditorEvent::AgentMoved {
            position: self.agent.position(),
            delta,
            tile: self.agent.tile(),
        });
    }

    fn quantized_or_zero(&self, value: f32) -> f32 {
        if value.is_finite() {
            self.config.quantize_height(value)
        } else {
            0.0
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        let size = GridSize::default();
        Self::new(EditorConfig::default(), size.width(), size.height())
    }
}
