use macroquad::prelude::{Color, Vec2, draw_line, draw_poly, draw_poly_lines};
use std::f32::consts::FRAC_PI_4;

pub const MARKER_COLOR: Color = Color::from_rgba(200, 40, 40, 255);
pub const PIN_COLOR: Color = Color::from_rgba(0, 53, 146, 255);

/// Draw a diamond at a screen-space center using vector primitives to stay crisp when zoomed.
pub fn draw_marker_at_screen(center: Vec2, tile_px: f32) {
    let half = tile_px * 0.5;
    let margin = tile_px * 0.2;
    let radius = (half - margin).max(1.0);
    draw_poly(center.x, center.y, 4, radius, FRAC_PI_4, MARKER_COLOR);
}

pub fn draw_pin_at_screen(center: Vec2, tile_px: f32) {
    let radius = (tile_px * 0.2).max(2.0);
    draw_poly_lines(center.x, center.y, 4, radius, 0.0, 2.0, PIN_COLOR);
    draw_line(
        center.x - radius,
        center.y,
        center.x + radius,
        center.y,
        1.0,
        PIN_COLOR,
    );
}

/// Thickness grows with the cliff span so tall walls stand out.
pub fn draw_cliff_at_screen(start: Vec2, end: Vec2, span: f32, tile_px: f32, color: Color) {
    let thickness = (tile_px * 0.08 * (1.0 + span).min(4.0)).max(1.0);
    draw_line(start.x, start.y, end.x, end.y, thickness, color);
}
