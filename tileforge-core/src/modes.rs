//! Exclusive editing modes and pointer routing.

use crate::coordinates::TileCoord;
use crate::paint::TileKind;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorMode {
    NormalMove,
    Marking,
    Painting(TileKind),
    HeightEdit { pinning: bool, desired_height: f32 },
}

impl EditorMode {
    pub fn is_editing(&self) -> bool {
        !matches!(self, EditorMode::NormalMove)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EditorMode::NormalMove => "move",
            EditorMode::Marking => "mark",
            EditorMode::Painting(_) => "paint",
            EditorMode::HeightEdit { pinning: false, .. } => "height",
            EditorMode::HeightEdit { pinning: true, .. } => "pin",
        }
    }

    fn same_family(&self, other: &EditorMode) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// What a pointer tap on a tile should do in the current mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    MoveAgent(TileCoord),
    ToggleMarker(TileCoord),
    Paint(TileCoord, TileKind),
    SetHeight(TileCoord, f32),
    TogglePin(TileCoord),
    /// Movement is frozen; the tap is swallowed.
    Frozen,
}

/// Side effects the owner must apply after a mode change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeTransition {
    pub previous: EditorMode,
    pub current: EditorMode,
    /// Marking was left; the marker layer must be committed.
    pub commit_markers: bool,
    pub entered_height_edit: bool,
    pub left_height_edit: bool,
}

impl ModeTransition {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeLocked;

impl fmt::Display for FreezeLocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("tap-to-move freeze is locked while an editing mode is active")
    }
}

impl Error for FreezeLocked {}

#[derive(Debug, Clone)]
pub struct ModeArbiter {
    mode: EditorMode,
    freeze_tap_to_move: bool,
    freeze_before_edit: bool,
}

impl ModeArbiter {
    pub fn new() -> Self {
        Self {
            mode: EditorMode::NormalMove,
            freeze_tap_to_move: false,
            freeze_before_edit: false,
        }
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn freeze_tap_to_move(&self) -> bool {
        self.freeze_tap_to_move
    }

    /// The user-facing freeze control is locked while editing.
    pub fn freeze_locked(&self) -> bool {
        self.mode.is_editing()
    }

    pub fn set_freeze_tap_to_move(&mut self, freeze: bool) -> Result<(), FreezeLocked> {
        if self.freeze_locked() {
            return Err(FreezeLocked);
        }
        self.freeze_tap_to_move = freeze;
        Ok(())
    }

    pub fn set_mode(&mut self, next: EditorMode) -> ModeTransition {
        let previous = self.mode;
        let mut transition = ModeTransition {
            previous,
            current: next,
            commit_markers: false,
            entered_height_edit: false,
            left_height_edit: false,
        };
        if previous == next {
            return transition;
        }

        let leaving_family = !previous.same_family(&next);
        if leaving_family {
            transition.commit_markers = matches!(previous, EditorMode::Marking);
            transition.left_height_edit = matches!(previous, EditorMode::HeightEdit { .. });
            transition.entered_height_edit = matches!(next, EditorMode::HeightEdit { .. });
        }

        if !previous.is_editing() && next.is_editing() {
            self.freeze_before_edit = self.freeze_tap_to_move;
        }
        if next.is_editing() {
            self.freeze_tap_to_move = true;
        } else if previous.is_editing() {
            self.freeze_tap_to_move = if transition.left_height_edit {
                false
            } else {
                self.freeze_before_edit
            };
        }

        self.mode = next;
        transition
    }

    /// Switches between sculpting and pin toggling; ignored outside height edit.
    pub fn set_pinning(&mut self, pinning: bool) -> bool {
        match &mut self.mode {
            EditorMode::HeightEdit { pinning: current, .. } => {
                *current = pinning;
                true
            }
            _ => false,
        }
    }

    pub fn set_desired_height(&mut self, height: f32) -> bool {
        match &mut self.mode {
            EditorMode::HeightEdit { desired_height, .. } => {
                *desired_height = height;
                true
            }
            _ => false,
        }
    }

    pub fn route(&self, tile: TileCoord) -> PointerAction {
        match self.mode {
            EditorMode::NormalMove if self.freeze_tap_to_move => PointerAction::Frozen,
            EditorMode::NormalMove => PointerAction::MoveAgent(tile),
            EditorMode::Marking => PointerAction::ToggleMarker(tile),
            EditorMode::Painting(kind) => PointerAction::Paint(tile, kind),
            EditorMode::HeightEdit { pinning: true, .. } => PointerAction::TogglePin(tile),
            EditorMode::HeightEdit { desired_height, .. } => {
                PointerAction::SetHeight(tile, desired_height)
            }
        }
    }
}

impl Default for ModeArbiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEIGHT_EDIT: EditorMode = EditorMode::HeightEdit {
        pinning: false,
        desired_height: 1.0,
    };

    #[test]
    fn editing_modes_force_and_lock_freeze() {
        let mut arbiter = ModeArbiter::new();
        assert!(!arbiter.freeze_tap_to_move());

        arbiter.set_mode(EditorMode::Marking);
        assert!(arbiter.freeze_tap_to_move());
        assert!(arbiter.freeze_locked());
        assert_eq!(arbiter.set_freeze_tap_to_move(false), Err(FreezeLocked));
        assert!(arbiter.freeze_tap_to_move());
    }

    #[test]
    fn painting_exits_marking_with_commit() {
        let mut arbiter = ModeArbiter::new();
        arbiter.set_mode(EditorMode::Marking);
        let transition = arbiter.set_mode(EditorMode::Painting(TileKind::Sand));
        assert!(transition.commit_markers);
        assert_eq!(arbiter.mode(), EditorMode::Painting(TileKind::Sand));

        let transition = arbiter.set_mode(EditorMode::Painting(TileKind::Water));
        assert!(!transition.commit_markers);
        assert!(transition.changed());
    }

    #[test]
    fn height_edit_exit_unfreezes_movement() {
        let mut arbiter = ModeArbiter::new();
        arbiter.set_freeze_tap_to_move(true).unwrap();
        let transition = arbiter.set_mode(HEIGHT_EDIT);
        assert!(transition.entered_height_edit);

        let transition = arbiter.set_mode(EditorMode::NormalMove);
        assert!(transition.left_height_edit);
        assert!(!arbiter.freeze_tap_to_move());
        assert!(!arbiter.freeze_locked());
    }

    #[test]
    fn leaving_marking_restores_user_freeze() {
        let mut arbiter = ModeArbiter::new();
        arbiter.set_freeze_tap_to_move(true).unwrap();
        arbiter.set_mode(EditorMode::Marking);
        let transition = arbiter.set_mode(EditorMode::NormalMove);
        assert!(transition.commit_markers);
        assert!(arbiter.freeze_tap_to_move());
    }

    #[test]
    fn routes_taps_by_mode() {
        let mut arbiter = ModeArbiter::new();
        let tile = TileCoord::new(1, 2);
        assert_eq!(arbiter.route(tile), PointerAction::MoveAgent(tile));

        arbiter.set_mode(EditorMode::Painting(TileKind::Grass));
        assert_eq!(arbiter.route(tile), PointerAction::Paint(tile, TileKind::Grass));

        arbiter.set_mode(HEIGHT_EDIT);
        assert_eq!(arbiter.route(tile), PointerAction::SetHeight(tile, 1.0));
        assert!(arbiter.set_pinning(true));
        assert_eq!(arbiter.route(tile), PointerAction::TogglePin(tile));

        arbiter.set_mode(EditorMode::NormalMove);
        arbiter.set_freeze_tap_to_move(true).unwrap();
        assert_eq!(arbiter.route(tile), PointerAction::Frozen);
    }

    #[test]
    fn sub_mode_changes_stay_inside_height_edit() {
        let mut arbiter = ModeArbiter::new();
        assert!(!arbiter.set_pinning(true));
        assert!(!arbiter.set_desired_height(3.0));

        arbiter.set_mode(HEIGHT_EDIT);
        let transition = arbiter.set_mode(EditorMode::HeightEdit {
            pinning: true,
            desired_height: 2.0,
        });
        assert!(!transition.entered_height_edit);
        assert!(!transition.left_height_edit);
    }
}
