use macroquad::prelude::*;

#[derive(Debug, Clone)]
pub struct AvatarDrawConfig {
    pub radius_tiles: f32,
    pub outline_px: f32,
    /// Screen offset of the ground shadow per world unit of elevation.
    pub shadow_lift_px: f32,
    pub max_shadow_offset_tiles: f32,
    /// Wedge length past the body, fraction of radius.
    pub nose_ratio: f32,
    pub body_color: Color,
    pub outline_color: Color,
    pub shadow_color: Color,
}

impl Default for AvatarDrawConfig {
    fn default() -> Self {
        Self {
            radius_tiles: 0.35,
            outline_px: 2.0,
            shadow_lift_px: 4.0,
            max_shadow_offset_tiles: 0.5,
            nose_ratio: 0.6,
            body_color: WHITE,
            outline_color: BLACK,
            shadow_color: Color::from_rgba(0, 0, 0, 90),
        }
    }
}

/// Keeps the last planar direction of travel so an idle avatar still faces
/// where it was going.
#[derive(Debug, Clone, Copy)]
pub struct Heading(Vec2);

impl Heading {
    pub fn new() -> Self {
        Self(vec2(1.0, 0.0))
    }

    pub fn update(&mut self, delta: [f32; 3]) {
        let planar = vec2(delta[0], delta[2]);
        if planar.length_squared() > f32::EPSILON {
            self.0 = planar.normalize_or_zero();
        }
    }

    pub fn direction(&self) -> Vec2 {
        self.0
    }
}

impl Default for Heading {
    fn default() -> Self {
        Self::new()
    }
}

/// Screen offset of the shadow for an avatar standing `elevation` above the
/// ground plane.
pub fn shadow_offset(elevation: f32, tile_px: f32, config: &AvatarDrawConfig) -> Vec2 {
    let limit = config.max_shadow_offset_tiles * tile_px;
    let lift = (elevation * config.shadow_lift_px).clamp(-limit, limit);
    vec2(lift, lift)
}

pub fn draw_avatar(
    heading: Heading,
    center_screen: Vec2,
    elevation: f32,
    tile_px: f32,
    config: &AvatarDrawConfig,
) {
    let radius_px = (config.radius_tiles * tile_px).max(2.0);
    let shadow = center_screen + shadow_offset(elevation, tile_px, config);
    draw_ellipse(shadow.x, shadow.y, radius_px, radius_px * 0.6, 0.0, config.shadow_color);

    let direction = heading.direction();
    let side = direction.perp() * (radius_px * 0.5);
    let tip = center_screen + direction * (radius_px * (1.0 + config.nose_ratio));
    let base = center_screen + direction * (radius_px * 0.5);
    draw_triangle(tip, base + side, base - side, config.outline_color);

    draw_circle(center_screen.x, center_screen.y, radius_px, config.body_color);
    draw_circle_lines(
        center_screen.x,
        center_screen.y,
        radius_px,
        config.outline_px,
        config.outline_color,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_ignores_vertical_only_motion() {
        let mut heading = Heading::new();
        heading.update([0.0, 0.0, -2.0]);
        assert_eq!(heading.direction(), vec2(0.0, -1.0));

        heading.update([0.0, 0.5, 0.0]);
        assert_eq!(heading.direction(), vec2(0.0, -1.0));
    }

    #[test]
    fn shadow_offset_is_bounded() {
        let config = AvatarDrawConfig::default();
        assert_eq!(shadow_offset(0.0, 32.0, &config), Vec2::ZERO);
        assert_eq!(shadow_offset(1.0, 32.0, &config), vec2(4.0, 4.0));
        assert_eq!(shadow_offset(50.0, 32.0, &config), vec2(16.0, 16.0));
        assert_eq!(shadow_offset(-50.0, 32.0, &config), vec2(-16.0, -16.0));
    }
}
