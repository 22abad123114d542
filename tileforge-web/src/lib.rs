use log::{debug, info, warn};
#[cfg(target_arch = "wasm32")]
use macroquad::miniquad;
use macroquad::prelude::*;
use std::error::Error;
use std::fmt;
use std::io;
use std::path::Path;
use tileforge_core::codec::CodecError;
use tileforge_core::coordinates::vertex_to_world;
use tileforge_core::{
    Editor, EditorConfig, EditorEvent, EditorMode, GridSize, MAX_GRID_SIZE, MIN_GRID_SIZE,
    TileCoord, TileKind, tile_to_world,
};

use crate::avatar::{AvatarDrawConfig, Heading, draw_avatar};
use crate::overlay_draw::{draw_cliff_at_screen, draw_marker_at_screen, draw_pin_at_screen};

mod avatar;
mod overlay_draw;

const CONFIG_PATH: &str = "tileforge.json";
const PROJECT_PATH: &str = "tileforge-project.json";
const DEFAULT_GRID_SIZE: usize = 20;
const GRID_SIZE_STEP: usize = 2;
const TILE_PIXEL_SIZE: f32 = 32.0;
const BASE_ZOOM_AT_POWER_ZERO: f32 = 1f32;
const MIN_ZOOM_POWER: i32 = -20;
const MAX_ZOOM_POWER: i32 = 15;
const ZOOM_FACTOR: f32 = 1.1;
const FIXED_STEP_SECONDS: f32 = 1.0 / 60.0;
const HEIGHT_SHADE_RANGE: f32 = 10.0;
const CLIFF_COLOR: Color = Color::from_rgba(60, 40, 30, 255);
const GRID_LINE_COLOR: Color = Color::from_rgba(0, 0, 0, 60);

#[derive(Debug)]
pub enum ProjectFileError {
    Io(io::Error),
    Codec(CodecError),
}

impl fmt::Display for ProjectFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectFileError::Io(err) => write!(f, "project file I/O failed: {}", err),
            ProjectFileError::Codec(err) => write!(f, "project file is invalid: {}", err),
        }
    }
}

impl Error for ProjectFileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProjectFileError::Io(err) => Some(err),
            ProjectFileError::Codec(err) => Some(err),
        }
    }
}

impl From<io::Error> for ProjectFileError {
    fn from(err: io::Error) -> Self {
        ProjectFileError::Io(err)
    }
}

impl From<CodecError> for ProjectFileError {
    fn from(err: CodecError) -> Self {
        ProjectFileError::Codec(err)
    }
}

pub fn save_project(editor: &Editor, path: impl AsRef<Path>) -> Result<(), ProjectFileError> {
    let json = editor.save_json()?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Reads and applies a project file. The editor is untouched on any error.
pub fn load_project(editor: &mut Editor, path: impl AsRef<Path>) -> Result<(), ProjectFileError> {
    let json = std::fs::read_to_string(path)?;
    editor.load_json(&json)?;
    Ok(())
}

fn load_config() -> EditorConfig {
    let json = match std::fs::read_to_string(CONFIG_PATH) {
        Ok(json) => json,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return EditorConfig::default(),
        Err(err) => {
            warn!("could not read {}: {}", CONFIG_PATH, err);
            return EditorConfig::default();
        }
    };
    match EditorConfig::from_json_str(&json) {
        Ok(config) => {
            info!("loaded {}", CONFIG_PATH);
            config
        }
        Err(err) => {
            warn!("ignoring {}: {}", CONFIG_PATH, err);
            EditorConfig::default()
        }
    }
}

fn log_ui_action(label: &str) {
    info!(target: "ui", "{}", label);
}

#[cfg(target_arch = "wasm32")]
struct MiniquadLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for MiniquadLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            log::Level::Error => miniquad::error!("{}: {}", record.target(), record.args()),
            _ => miniquad::info!("{}: {}", record.target(), record.args()),
        }
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
static LOGGER: MiniquadLogger = MiniquadLogger;

#[cfg(target_arch = "wasm32")]
fn init_logging() {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn zoom_scale_from_power(power: i32) -> f32 {
    BASE_ZOOM_AT_POWER_ZERO * ZOOM_FACTOR.powi(power)
}

fn clamp_zoom_power(power: i32) -> i32 {
    power.clamp(MIN_ZOOM_POWER, MAX_ZOOM_POWER)
}

fn kind_color(kind: TileKind) -> Color {
    match kind {
        TileKind::Sand => Color::from_rgba(219, 199, 142, 255),
        TileKind::Dirt => Color::from_rgba(120, 84, 52, 255),
        TileKind::Grass => Color::from_rgba(86, 148, 64, 255),
        TileKind::Stone => Color::from_rgba(128, 128, 132, 255),
        TileKind::Gravel => Color::from_rgba(160, 150, 140, 255),
        TileKind::Path => Color::from_rgba(190, 160, 110, 255),
        TileKind::Water => Color::from_rgba(52, 110, 190, 220),
    }
}

/// Unpainted ground gets lighter with height.
fn ground_color(height: f32) -> Color {
    let t = ((height / HEIGHT_SHADE_RANGE) * 0.5 + 0.5).clamp(0.0, 1.0);
    let level = 0.25 + 0.5 * t;
    Color::new(level, level * 0.95, level * 0.85, 1.0)
}

/// Screen placement of the centered world plane.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Camera {
    offset: Vec2,
    zoom_power: i32,
}

impl Camera {
    fn new() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom_power: 0,
        }
    }

    fn tile_px(&self) -> f32 {
        TILE_PIXEL_SIZE * zoom_scale_from_power(self.zoom_power)
    }

    fn world_to_screen(&self, world: [f32; 2]) -> Vec2 {
        vec2(world[0], world[1]) * self.tile_px() + self.offset
    }

    fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.tile_px()
    }

    /// The tile under `screen`, or `None` outside the grid.
    fn tile_at_screen(&self, screen: Vec2, size: GridSize) -> Option<TileCoord> {
        let world = self.screen_to_world(screen);
        let tx = (world.x + size.width() as f32 / 2.0).floor() as i32;
        let tz = (world.y + size.height() as f32 / 2.0).floor() as i32;
        let tile = TileCoord::new(tx, tz);
        size.contains(tile).then_some(tile)
    }

    fn zoom_at(&mut self, next_zoom_power: i32, focus: Vec2) {
        let clamped_power = clamp_zoom_power(next_zoom_power);
        if clamped_power == self.zoom_power {
            return;
        }
        let world_at_focus = self.screen_to_world(focus);
        self.zoom_power = clamped_power;
        self.offset = focus - world_at_focus * self.tile_px();
    }
}

pub struct GameState {
    editor: Editor,
    camera: Camera,
    camera_initialized: bool,
    last_right_drag_pos: Option<Vec2>,
    avatar_draw: AvatarDrawConfig,
    heading: Heading,
    paint_kind: TileKind,
    pending_size: GridSize,
    pin_overlays_visible: bool,
    status: String,
    fps: f32,
    fps_frame_count: u32,
    fps_last_update_time: f64,
}

impl GameState {
    pub fn new(config: EditorConfig) -> Self {
        let editor = Editor::new(config, DEFAULT_GRID_SIZE, DEFAULT_GRID_SIZE);
        let pending_size = editor.size();
        Self {
            editor,
            camera: Camera::new(),
            camera_initialized: false,
            last_right_drag_pos: None,
            avatar_draw: AvatarDrawConfig::default(),
            heading: Heading::new(),
            paint_kind: TileKind::Grass,
            pending_size,
            pin_overlays_visible: false,
            status: String::new(),
            fps: 0.0,
            fps_frame_count: 0,
            fps_last_update_time: get_time(),
        }
    }

    fn initialize_camera_center(&mut self) {
        if !self.camera_initialized {
            self.camera.offset = vec2(screen_width() / 2.0, screen_height() / 2.0);
            self.camera_initialized = true;
        }
    }

    fn fixed_update(&mut self) {
        self.editor.tick(FIXED_STEP_SECONDS);
    }

    fn drain_editor_events(&mut self) {
        for event in self.editor.drain_events() {
            match event {
                EditorEvent::AgentMoved { delta, .. } => self.heading.update(delta),
                EditorEvent::PinOverlaysVisible(visible) => self.pin_overlays_visible = visible,
                EditorEvent::ModeChanged => {
                    self.status = self.mode_status();
                    log_ui_action(&self.status);
                }
                EditorEvent::Regenerated { width, height } => {
                    self.pending_size = GridSize::new(width, height);
                }
                other => debug!("{:?}", other),
            }
        }
    }

    fn mode_status(&self) -> String {
        let freeze = if self.editor.freeze_tap_to_move() {
            " [frozen]"
        } else {
            ""
        };
        match self.editor.mode() {
            EditorMode::Painting(kind) => format!("mode: paint {:?}{}", kind, freeze),
            EditorMode::HeightEdit {
                pinning,
                desired_height,
            } => format!(
                "mode: {} {:.2}{}",
                if pinning { "pin" } else { "height" },
                desired_height,
                freeze
            ),
            mode => format!("mode: {}{}", mode.label(), freeze),
        }
    }

    fn handle_keys(&mut self) {
        let ctrl = is_key_down(KeyCode::LeftControl) || is_key_down(KeyCode::RightControl);
        if ctrl && is_key_pressed(KeyCode::S) {
            self.save();
            return;
        }
        if ctrl && is_key_pressed(KeyCode::O) {
            self.load();
            return;
        }

        let desired_height = match self.editor.mode() {
            EditorMode::HeightEdit { desired_height, .. } => desired_height,
            _ => 0.0,
        };
        let step = self.editor.config().height_step;

        if is_key_pressed(KeyCode::Key1) {
            self.editor.set_mode(EditorMode::NormalMove);
        } else if is_key_pressed(KeyCode::Key2) {
            self.editor.set_mode(EditorMode::Marking);
        } else if is_key_pressed(KeyCode::Key3) {
            self.editor.set_mode(EditorMode::Painting(self.paint_kind));
        } else if is_key_pressed(KeyCode::Key4) {
            self.editor.set_mode(EditorMode::HeightEdit {
                pinning: false,
                desired_height,
            });
        } else if is_key_pressed(KeyCode::P) {
            if let EditorMode::HeightEdit { pinning, .. } = self.editor.mode() {
                self.editor.set_pinning(!pinning);
            }
        } else if is_key_pressed(KeyCode::Up) {
            self.editor.set_desired_height(desired_height + step);
        } else if is_key_pressed(KeyCode::Down) {
            self.editor.set_desired_height(desired_height - step);
        } else if is_key_pressed(KeyCode::Tab) {
            self.paint_kind = self.paint_kind.next();
            if let EditorMode::Painting(_) = self.editor.mode() {
                self.editor.set_mode(EditorMode::Painting(self.paint_kind));
            }
        } else if is_key_pressed(KeyCode::F) {
            let freeze = !self.editor.freeze_tap_to_move();
            if let Err(err) = self.editor.set_freeze_tap_to_move(freeze) {
                log_ui_action(&err.to_string());
            }
        } else if is_key_pressed(KeyCode::Equal) {
            self.resize_pending(GRID_SIZE_STEP as isize);
        } else if is_key_pressed(KeyCode::Minus) {
            self.resize_pending(-(GRID_SIZE_STEP as isize));
        } else if is_key_pressed(KeyCode::R) {
            let (width, height) = (self.pending_size.width(), self.pending_size.height());
            log_ui_action(&format!("regenerate {}x{}", width, height));
            self.editor.regenerate(width, height);
        }
    }

    fn resize_pending(&mut self, delta: isize) {
        let next = |value: usize| {
            value
                .saturating_add_signed(delta)
                .clamp(MIN_GRID_SIZE, MAX_GRID_SIZE)
        };
        self.pending_size = GridSize::new(
            next(self.pending_size.width()),
            next(self.pending_size.height()),
        );
    }

    fn save(&mut self) {
        match save_project(&self.editor, PROJECT_PATH) {
            Ok(()) => log_ui_action(&format!("saved {}", PROJECT_PATH)),
            Err(err) => warn!("save failed: {}", err),
        }
    }

    fn load(&mut self) {
        match load_project(&mut self.editor, PROJECT_PATH) {
            Ok(()) => log_ui_action(&format!("loaded {}", PROJECT_PATH)),
            Err(err) => warn!("load failed: {}", err),
        }
    }

    fn handle_mouse_wheel_zoom(&mut self) {
        let (_wheel_x, wheel_y) = mouse_wheel();
        if wheel_y == 0.0 {
            return;
        }

        let power_delta = wheel_y.signum() as i32;
        let (mouse_x, mouse_y) = mouse_position();
        self.camera
            .zoom_at(self.camera.zoom_power + power_delta, vec2(mouse_x, mouse_y));
    }

    fn handle_right_mouse_drag(&mut self) {
        let is_dragging = is_mouse_button_down(MouseButton::Right);
        let (mouse_x, mouse_y) = mouse_position();
        let current = vec2(mouse_x, mouse_y);

        if is_dragging {
            if let Some(last) = self.last_right_drag_pos {
                self.camera.offset += current - last;
            }
            self.last_right_drag_pos = Some(current);
        } else {
            self.last_right_drag_pos = None;
        }
    }

    fn handle_left_click(&mut self) {
        if !is_mouse_button_pressed(MouseButton::Left) {
            return;
        }
        let (mouse_x, mouse_y) = mouse_position();
        let Some(tile) = self
            .camera
            .tile_at_screen(vec2(mouse_x, mouse_y), self.editor.size())
        else {
            return;
        };
        if !self.editor.pointer_tile(tile) {
            debug!("tap on {:?} had no effect", tile);
        }
    }

    fn update_fps_if_due(&mut self) {
        let now = get_time();
        self.fps_frame_count += 1;
        let elapsed = now - self.fps_last_update_time;
        if elapsed >= 1.0 {
            self.fps = self.fps_frame_count as f32 / elapsed as f32;
            self.fps_frame_count = 0;
            self.fps_last_update_time = now;
        }
    }

    fn render(&self) {
        clear_background(BLACK);
        let tile_px = self.camera.tile_px();
        let size = self.editor.size();
        let heights = self.editor.heights();

        for tile in size.tiles() {
            let [cx, cz] = tile_to_world(tile, size);
            let top_left = self.camera.world_to_screen([cx - 0.5, cz - 0.5]);
            let color = match self.editor.paint_layer().kind_at(tile) {
                Some(kind) => kind_color(kind),
                None => ground_color(heights.average_corner_height(tile)),
            };
            draw_rectangle(top_left.x, top_left.y, tile_px, tile_px, color);
            draw_rectangle_lines(top_left.x, top_left.y, tile_px, tile_px, 1.0, GRID_LINE_COLOR);

            let center = self.camera.world_to_screen([cx, cz]);
            if self.editor.markers().contains(tile) {
                draw_marker_at_screen(center, tile_px);
            }
            if self.pin_overlays_visible && heights.is_pinned(tile) {
                draw_pin_at_screen(center, tile_px);
            }
        }

        for cliff in self.editor.cliffs().cliffs() {
            draw_cliff_at_screen(
                self.camera.world_to_screen(cliff.start),
                self.camera.world_to_screen(cliff.end),
                cliff.span(),
                tile_px,
                CLIFF_COLOR,
            );
        }

        let mut previous = self.editor.agent().position();
        for tile in self.editor.agent().path() {
            let next = tile_to_world(*tile, size);
            let from = self.camera.world_to_screen([previous[0], previous[2]]);
            let to = self.camera.world_to_screen(next);
            draw_line(from.x, from.y, to.x, to.y, 2.0, YELLOW);
            previous = [next[0], 0.0, next[1]];
        }

        let [x, y, z] = self.editor.agent().position();
        draw_avatar(
            self.heading,
            self.camera.world_to_screen([x, z]),
            y,
            tile_px,
            &self.avatar_draw,
        );

        self.render_hud(size);
    }

    fn render_hud(&self, size: GridSize) {
        let agent = self.editor.agent();
        let lines = [
            self.status.clone(),
            format!(
                "grid: {}x{} (next: {}x{})",
                size.width(), size.height(), self.pending_size.width(), self.pending_size.height()
            ),
            format!(
                "agent: {}, {} height {:.2}",
                agent.tile().x,
                agent.tile().z,
                agent.position()[1]
            ),
            format!("paint kind: {:?}", self.paint_kind),
            format!("cliffs: {}", self.editor.cliffs().len()),
            format!("fps: {:.1}", self.fps),
        ];
        for (row, text) in lines.iter().enumerate() {
            draw_text(text, 20.0, 40.0 + row as f32 * 24.0, 24.0, WHITE);
        }

        let (mouse_x, mouse_y) = mouse_position();
        if let Some(tile) = self.camera.tile_at_screen(vec2(mouse_x, mouse_y), size) {
            let corner = vertex_to_world(tile.corners()[0], size);
            draw_text(
                &format!(
                    "mouse: {}, {} (corner {:.1}, {:.1})",
                    tile.x, tile.z, corner[0], corner[1]
                ),
                20.0,
                40.0 + lines.len() as f32 * 24.0,
                24.0,
                WHITE,
            );
        }
    }
}

pub async fn run() {
    install_panic_hook();
    init_logging();
    let mut game = GameState::new(load_config());
    game.initialize_camera_center();
    game.drain_editor_events();
    let mut accumulator = 0.0_f32;

    loop {
        // Consume real elapsed time in fixed-size simulation steps.
        accumulator += get_frame_time();
        while accumulator >= FIXED_STEP_SECONDS {
            game.fixed_update();
            accumulator -= FIXED_STEP_SECONDS;
        }

        game.handle_keys();
        game.handle_mouse_wheel_zoom();
        game.handle_right_mouse_drag();
        game.handle_left_click();
        game.drain_editor_events();
        game.update_fps_if_due();

        game.render();

        next_frame().await;
    }
}

#[cfg(target_arch = "wasm32")]
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let msg = info.to_string();
        if let Some(location) = info.location() {
            miniquad::error!("panic at {}:{}: {}", location.file(), location.line(), msg);
        } else {
            miniquad::error!("panic: {}", msg);
        }
    }));
}

#[cfg(not(target_arch = "wasm32"))]
fn install_panic_hook() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_picks_tiles_and_rejects_outside_clicks() {
        let camera = Camera {
            offset: vec2(400.0, 300.0),
            zoom_power: 0,
        };
        let size = GridSize::new(4, 4);

        let center = camera.world_to_screen(tile_to_world(TileCoord::new(3, 1), size));
        assert_eq!(camera.tile_at_screen(center, size), Some(TileCoord::new(3, 1)));
        assert_eq!(camera.tile_at_screen(vec2(0.0, 0.0), size), None);
    }

    #[test]
    fn zoom_keeps_focus_point_fixed() {
        let mut camera = Camera {
            offset: vec2(100.0, 50.0),
            zoom_power: 0,
        };
        let focus = vec2(250.0, 175.0);
        let before = camera.screen_to_world(focus);
        camera.zoom_at(3, focus);
        let after = camera.screen_to_world(focus);

        assert_eq!(camera.zoom_power, 3);
        assert!((before - after).length() < 1e-4);
        camera.zoom_at(100, focus);
        assert_eq!(camera.zoom_power, MAX_ZOOM_POWER);
    }

    #[test]
    fn project_file_round_trip() {
        let path = std::env::temp_dir().join(format!("tileforge-test-{}.json", std::process::id()));
        let mut editor = Editor::new(EditorConfig::default(), 6, 6);
        editor.set_mode(EditorMode::Painting(TileKind::Stone));
        editor.pointer_tile(TileCoord::new(1, 4));
        editor.set_mode(EditorMode::NormalMove);

        save_project(&editor, &path).unwrap();
        let mut restored = Editor::new(EditorConfig::default(), 2, 2);
        load_project(&mut restored, &path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(restored.snapshot(), editor.snapshot());
    }

    #[test]
    fn missing_project_file_is_an_io_error() {
        let mut editor = Editor::default();
        let before = editor.snapshot();
        let err = load_project(&mut editor, "/nonexistent/tileforge/project.json").unwrap_err();
        assert!(matches!(err, ProjectFileError::Io(_)));
        assert_eq!(editor.snapshot(), before);
    }
}
