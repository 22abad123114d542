//! Project document encoding.
//!
//! Saving goes through the typed [`ProjectDocument`]. Loading parses into a
//! `serde_json::Value` first and decodes field by field so that malformed
//! entries can be skipped instead of failing the whole file.

use crate::coordinates::{GridSize, MAX_GRID_SIZE, MIN_GRID_SIZE, TileCoord};
use crate::paint::TileKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

pub const PROJECT_VERSION: u32 = 10;
pub const MIN_PROJECT_VERSION: u32 = 4;

/// Engine-facing contents of a project file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectSnapshot {
    pub size: GridSize,
    pub character: TileCoord,
    pub freeze_tap_to_move: bool,
    pub markers: Vec<TileCoord>,
    pub tiles: Vec<(TileCoord, TileKind)>,
    pub height_step: f32,
    /// Row-major in `z`, `W * H` entries.
    pub pins: Vec<bool>,
    /// Row-major in `z`, `(W + 1) * (H + 1)` entries.
    pub heights: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub version: u32,
    pub grid: GridSection,
    pub character: CharacterSection,
    pub settings: SettingsSection,
    pub markers: Vec<[i32; 2]>,
    pub terrain: TerrainSection,
    pub height: HeightSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSection {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterSection {
    pub tx: i32,
    pub tz: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSection {
    pub freeze_tap_to_move: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainSection {
    pub tiles: Vec<(i32, i32, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeightSection {
    pub step: f32,
    /// `[H][W]`, outer axis is `z`.
    pub pin_tiles: Vec<Vec<bool>>,
    /// `[H + 1][W + 1]`, outer axis is `z`.
    pub height_grid: Vec<Vec<f32>>,
}

#[derive(Debug)]
pub enum CodecError {
    Json(serde_json::Error),
    NotAnObject,
    MissingGrid,
    InvalidDimensions,
    UnsupportedVersion(u32),
}

impl CodecError {
    pub fn message(&self) -> &'static str {
        match self {
            CodecError::Json(_) => "project file is not valid JSON",
            CodecError::NotAnObject => "project file must contain a JSON object",
            CodecError::MissingGrid => "project file has no grid section",
            CodecError::InvalidDimensions => "project grid size is not a finite number",
            CodecError::UnsupportedVersion(_) => "project file version is too old",
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Json(err) => write!(f, "{} ({})", self.message(), err),
            CodecError::UnsupportedVersion(version) => {
                write!(f, "{} (version {})", self.message(), version)
            }
            _ => f.write_str(self.message()),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CodecError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Json(err)
    }
}

pub fn kind_name(kind: TileKind) -> &'static str {
    match kind {
        TileKind::Sand => "sand",
        TileKind::Dirt => "dirt",
        TileKind::Grass => "grass",
        TileKind::Stone => "stone",
        TileKind::Gravel => "gravel",
        TileKind::Path => "path",
        TileKind::Water => "water",
    }
}

pub fn parse_kind(name: &str) -> Option<TileKind> {
    TileKind::ALL
        .into_iter()
        .find(|kind| kind_name(*kind) == name)
}

impl ProjectDocument {
    pub fn from_snapshot(snapshot: &ProjectSnapshot) -> Self {
        let size = snapshot.size;
        let pin_tiles = (0..size.height())
            .map(|z| {
                (0..size.width())
                    .map(|x| snapshot.pins.get(z * size.width() + x).copied().unwrap_or(false))
                    .collect()
            })
            .collect();
        let height_grid = (0..size.vertex_rows())
            .map(|z| {
                (0..size.vertex_columns())
                    .map(|x| {
                        snapshot
                            .heights
                            .get(z * size.vertex_columns() + x)
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect();

        Self {
            version: PROJECT_VERSION,
            grid: GridSection {
                width: size.width(),
                height: size.height(),
            },
            character: CharacterSection {
                tx: snapshot.character.x,
                tz: snapshot.character.z,
            },
            settings: SettingsSection {
                freeze_tap_to_move: snapshot.freeze_tap_to_move,
            },
            markers: snapshot.markers.iter().map(|tile| [tile.x, tile.z]).collect(),
            terrain: TerrainSection {
                tiles: snapshot
                    .tiles
                    .iter()
                    .map(|(tile, kind)| (tile.x, tile.z, kind_name(*kind).to_string()))
                    .collect(),
            },
            height: HeightSection {
                step: snapshot.height_step,
                pin_tiles,
                height_grid,
            },
        }
    }
}

pub fn to_json_string(snapshot: &ProjectSnapshot) -> Result<String, CodecError> {
    Ok(serde_json::to_string_pretty(&ProjectDocument::from_snapshot(snapshot))?)
}

pub fn from_json_str(json: &str) -> Result<ProjectSnapshot, CodecError> {
    let value: Value = serde_json::from_str(json)?;
    decode(&value)
}

/// Tolerant decode: unknown fields are ignored, missing optional sections
/// fall back to empty, non-finite numbers read as zero, and malformed list
/// entries are skipped.
pub fn decode(value: &Value) -> Result<ProjectSnapshot, CodecError> {
    let root = value.as_object().ok_or(CodecError::NotAnObject)?;

    if let Some(version) = root.get("version").and_then(Value::as_f64) {
        if version.is_finite() && version < f64::from(MIN_PROJECT_VERSION) {
            return Err(CodecError::UnsupportedVersion(version.max(0.0) as u32));
        }
    }

    let grid = root
        .get("grid")
        .and_then(Value::as_object)
        .ok_or(CodecError::MissingGrid)?;
    let width = dimension(grid.get("width"))?;
    let height = dimension(grid.get("height"))?;
    let size = GridSize::new(width, height);

    let character = section(root, "character")
        .map(|character| {
            TileCoord::new(
                integer(character.get("tx")),
                integer(character.get("tz")),
            )
        })
        .map(|tile| size.clamp_tile(tile))
        .unwrap_or(TileCoord::new(0, 0));

    let freeze_tap_to_move = section(root, "settings")
        .and_then(|settings| settings.get("freezeTapToMove"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let markers = array(root.get("markers"))
        .filter_map(|entry| {
            let pair = entry.as_array()?;
            let tile = TileCoord::new(strict_integer(pair.first())?, strict_integer(pair.get(1))?);
            size.contains(tile).then_some(tile)
        })
        .collect();

    let tiles = array(section(root, "terrain").and_then(|terrain| terrain.get("tiles")))
        .filter_map(|entry| {
            let triple = entry.as_array()?;
            let tile = TileCoord::new(strict_integer(triple.first())?, strict_integer(triple.get(1))?);
            let kind = parse_kind(triple.get(2)?.as_str()?)?;
            size.contains(tile).then_some((tile, kind))
        })
        .collect();

    let height_section = section(root, "height");
    let height_step = height_section
        .and_then(|height| height.get("step"))
        .and_then(Value::as_f64)
        .filter(|step| step.is_finite() && *step > 0.0)
        .map(|step| step as f32)
        .unwrap_or(crate::config::DEFAULT_HEIGHT_STEP);

    let pin_rows: Vec<&Value> = array(height_section.and_then(|height| height.get("pinTiles"))).collect();
    let mut pins = vec![false; size.tile_count()];
    for z in 0..size.height() {
        for x in 0..size.width() {
            pins[z * size.width() + x] = cell(&pin_rows, z, x)
                .and_then(Value::as_bool)
                .unwrap_or(false);
        }
    }

    let height_rows: Vec<&Value> =
        array(height_section.and_then(|height| height.get("heightGrid"))).collect();
    let mut heights = vec![0.0; size.vertex_count()];
    for z in 0..size.vertex_rows() {
        for x in 0..size.vertex_columns() {
            heights[z * size.vertex_columns() + x] = cell(&height_rows, z, x)
                .map(|value| finite_or_zero(value.as_f64()) as f32)
                .unwrap_or(0.0);
        }
    }

    Ok(ProjectSnapshot {
        size,
        character,
        freeze_tap_to_move,
        markers,
        tiles,
        height_step,
        pins,
        heights,
    })
}

fn section<'a>(root: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    root.get(key).and_then(Value::as_object)
}

fn array(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

fn cell<'a>(rows: &[&'a Value], row: usize, column: usize) -> Option<&'a Value> {
    rows.get(row)?.as_array()?.get(column)
}

fn dimension(value: Option<&Value>) -> Result<usize, CodecError> {
    let raw = value
        .and_then(Value::as_f64)
        .filter(|raw| raw.is_finite())
        .ok_or(CodecError::InvalidDimensions)?;
    Ok(raw.round().clamp(MIN_GRID_SIZE as f64, MAX_GRID_SIZE as f64) as usize)
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(0.0)
}

fn integer(value: Option<&Value>) -> i32 {
    finite_or_zero(value.and_then(Value::as_f64)).round() as i32
}

fn strict_integer(value: Option<&Value>) -> Option<i32> {
    let raw = value?.as_f64()?;
    raw.is_finite().then(|| raw.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot() -> ProjectSnapshot {
        let size = GridSize::new(3, 2);
        let mut heights = vec![0.0; size.vertex_count()];
        heights[0] = -0.4;
        heights[size.vertex_count() - 1] = 1.2;
        let mut pins = vec![false; size.tile_count()];
        pins[size.tile_index(TileCoord::new(2, 1)).unwrap()] = true;

        ProjectSnapshot {
            size,
            character: TileCoord::new(1, 1),
            freeze_tap_to_move: true,
            markers: vec![TileCoord::new(0, 1)],
            tiles: vec![(TileCoord::new(2, 0), TileKind::Gravel)],
            height_step: 0.2,
            pins,
            heights,
        }
    }

    #[test]
    fn document_uses_transposed_row_layout() {
        let document = ProjectDocument::from_snapshot(&snapshot());
        assert_eq!(document.version, PROJECT_VERSION);
        assert_eq!(document.height.pin_tiles.len(), 2);
        assert_eq!(document.height.pin_tiles[0].len(), 3);
        assert!(document.height.pin_tiles[1][2]);
        assert_eq!(document.height.height_grid.len(), 3);
        assert_eq!(document.height.height_grid[0].len(), 4);
        assert_eq!(document.height.height_grid[2][3], 1.2);
        assert_eq!(document.terrain.tiles[0].2, "gravel");
    }

    #[test]
    fn json_round_trip_preserves_snapshot() {
        let original = snapshot();
        let json = to_json_string(&original).unwrap();
        assert_eq!(from_json_str(&json).unwrap(), original);
    }

    #[test]
    fn missing_grid_fails() {
        let err = decode(&json!({ "version": 10 })).unwrap_err();
        assert!(matches!(err, CodecError::MissingGrid));
        assert!(matches!(decode(&json!([1, 2])).unwrap_err(), CodecError::NotAnObject));
    }

    #[test]
    fn non_numeric_dimensions_fail() {
        let err = decode(&json!({ "grid": { "width": "wide", "height": 4 } })).unwrap_err();
        assert!(matches!(err, CodecError::InvalidDimensions));
    }

    #[test]
    fn old_versions_are_rejected() {
        let err = decode(&json!({ "version": 3, "grid": { "width": 4, "height": 4 } })).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedVersion(3)));
    }

    #[test]
    fn minimal_legacy_document_fills_defaults() {
        let decoded = decode(&json!({
            "version": 4,
            "grid": { "width": 500, "height": 1 },
            "extra": { "ignored": true }
        }))
        .unwrap();

        assert_eq!(decoded.size, GridSize::new(200, 2));
        assert_eq!(decoded.character, TileCoord::new(0, 0));
        assert!(!decoded.freeze_tap_to_move);
        assert!(decoded.markers.is_empty() && decoded.tiles.is_empty());
        assert!(decoded.heights.iter().all(|h| *h == 0.0));
        assert_eq!(decoded.heights.len(), decoded.size.vertex_count());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let decoded = decode(&json!({
            "grid": { "width": 4, "height": 4 },
            "character": { "tx": 99, "tz": "x" },
            "markers": [[1, 1], [1], "nope", [9, 9], [2, 3]],
            "terrain": { "tiles": [[0, 0, "sand"], [1, 0, "lava"], [2, 0], [3, 3, "water"]] },
            "height": { "heightGrid": [[0.4, "high", null], [1.0]] }
        }))
        .unwrap();

        assert_eq!(decoded.character, TileCoord::new(3, 0));
        assert_eq!(decoded.markers, vec![TileCoord::new(1, 1), TileCoord::new(2, 3)]);
        assert_eq!(
            decoded.tiles,
            vec![
                (TileCoord::new(0, 0), TileKind::Sand),
                (TileCoord::new(3, 3), TileKind::Water),
            ]
        );
        assert_eq!(decoded.heights[0], 0.4);
        assert_eq!(decoded.heights[1], 0.0);
        assert_eq!(decoded.heights[5], 1.0);
    }

    #[test]
    fn kind_names_round_trip() {
        for kind in TileKind::ALL {
            assert_eq!(parse_kind(kind_name(kind)), Some(kind));
        }
        assert_eq!(parse_kind("lava"), None);
    }
}
