use crate::coordinates::{TileCoord, TileRegion};
use crate::height_field::HeightField;
use crate::paint::TileKind;

/// Notifications for the renderer. The editor queues them in the order the
/// underlying mutations happened; the front end drains them once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    Regenerated { width: usize, height: usize },
    HeightsUpdated { region: TileRegion },
    CliffsRebuilt { region: TileRegion },
    OverlaysReseated { region: TileRegion },
    PaintChanged { tile: TileCoord, kind: Option<TileKind> },
    MarkersChanged { tile: TileCoord, present: bool },
    PinChanged { tile: TileCoord, pinned: bool },
    PinOverlaysVisible(bool),
    AgentMoved { position: [f32; 3], delta: [f32; 3], tile: TileCoord },
    ModeChanged,
}

#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<EditorEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EditorEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Subscriber for synchronous height-change notifications. Observers get
/// read access to the field and never hold a reference back to it.
pub trait HeightObserver {
    fn heights_changed(&mut self, heights: &HeightField, region: TileRegion);
}
