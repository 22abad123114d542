use crate::height_field::HeightLimits;
use crate::pathfinding::{CornerRule, Heuristic};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HEIGHT_STEP: f32 = 0.2;
pub const DEFAULT_HEIGHT_MIN: f32 = -50.0;
pub const DEFAULT_HEIGHT_MAX: f32 = 50.0;
pub const DEFAULT_AGENT_SPEED: f32 = 5.0;
pub const DEFAULT_AGENT_RADIUS: f32 = 0.35;

/// Tunables recognized by the editor. Missing fields in a config file keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub height_step: f32,
    pub height_min: f32,
    pub height_max: f32,
    /// Tiles per second.
    pub agent_speed: f32,
    /// Height of the avatar's center above the ground.
    pub agent_radius: f32,
    pub allow_diagonal: bool,
    pub dont_cross_corners: bool,
    pub heuristic_weight: f32,
    /// `None` picks Manhattan for 4-connected and Octile for 8-connected search.
    pub heuristic: Option<Heuristic>,
    pub corner_rule: CornerRule,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            height_step: DEFAULT_HEIGHT_STEP,
            height_min: DEFAULT_HEIGHT_MIN,
            height_max: DEFAULT_HEIGHT_MAX,
            agent_speed: DEFAULT_AGENT_SPEED,
            agent_radius: DEFAULT_AGENT_RADIUS,
            allow_diagonal: true,
            dont_cross_corners: true,
            heuristic_weight: 1.0,
            heuristic: None,
            corner_rule: CornerRule::Brush,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.normalized())
    }

    /// Replaces unusable values with defaults so downstream math stays finite.
    pub fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if !self.height_step.is_finite() || self.height_step <= 0.0 {
            self.height_step = defaults.height_step;
        }
        if !self.height_min.is_finite() {
            self.height_min = defaults.height_min;
        }
        if !self.height_max.is_finite() {
            self.height_max = defaults.height_max;
        }
        if self.height_min > self.height_max {
            std::mem::swap(&mut self.height_min, &mut self.height_max);
        }
        if !self.agent_speed.is_finite() || self.agent_speed <= 0.0 {
            self.agent_speed = defaults.agent_speed;
        }
        if !self.agent_radius.is_finite() || self.agent_radius < 0.0 {
            self.agent_radius = defaults.agent_radius;
        }
        if !self.heuristic_weight.is_finite() || self.heuristic_weight < 0.0 {
            self.heuristic_weight = defaults.heuristic_weight;
        }
        self
    }

    /// Clamps to the height range and snaps to the step.
    pub fn quantize_height(&self, value: f32) -> f32 {
        HeightLimits::from_config(self).quantize(value)
    }
}
