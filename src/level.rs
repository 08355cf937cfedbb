use macroquad::prelude::*;
use serde::Deserialize;
use std::path::Path;

use crate::map::{LevelObject, TileMap};

const MAX_SPAWN_LIFT: usize = 8;

#[derive(Debug)]
pub enum LevelLoadError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl std::fmt::Display for LevelLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Yaml(err) => write!(f, "yaml error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Invalid(err) => write!(f, "invalid level: {err}"),
        }
    }
}

impl std::error::Error for LevelLoadError {}

impl From<std::io::Error> for LevelLoadError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for LevelLoadError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

impl From<serde_json::Error> for LevelLoadError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LevelDef {
    #[serde(default = "default_id")]
    pub id: String,
    pub rows: Vec<String>,
    #[serde(default)]
    pub spawn: Option<[i32; 2]>,
}

#[derive(Clone, Debug)]
pub struct Level {
    pub id: String,
    pub map: TileMap,
    pub spawn: Vec2,
}

impl Level {
    pub fn from_def(def: LevelDef) -> Result<Self, LevelLoadError> {
        if def.rows.is_empty() {
            return Err(LevelLoadError::Invalid(format!("{}: no rows", def.id)));
        }
        if def.rows[0].is_empty() {
            return Err(LevelLoadError::Invalid(format!("{}: zero width", def.id)));
        }
        let map = TileMap::from_rows(&def.rows);
        Ok(Self::assemble(def.id, map, def.spawn))
    }

    pub fn from_rows<S: AsRef<str>>(id: &str, rows: &[S]) -> Result<Self, LevelLoadError> {
        Self::from_def(LevelDef {
            id: id.to_string(),
            rows: rows.iter().map(|row| row.as_ref().to_string()).collect(),
            spawn: None,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, LevelLoadError> {
        let def: LevelDef = serde_yaml::from_str(raw)?;
        Self::from_def(def)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LevelLoadError> {
        let def: LevelDef = serde_json::from_str(raw)?;
        Self::from_def(def)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, LevelLoadError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let level = if is_json(path) {
            Self::from_json_str(&raw)?
        } else {
            Self::from_yaml_str(&raw)?
        };
        log::info!(
            "loaded level {} ({}x{}) from {}",
            level.id,
            level.map.width(),
            level.map.height(),
            path.display()
        );
        Ok(level)
    }

    pub fn objects(&self) -> Vec<LevelObject> {
        self.map.objects()
    }

    fn assemble(id: String, map: TileMap, spawn: Option<[i32; 2]>) -> Self {
        let spawn = spawn_point(&map, spawn);
        Self { id, map, spawn }
    }

    pub fn builtin() -> Self {
        const WIDTH: usize = 180;
        const HEIGHT: usize = 20;
        let ground_row = HEIGHT - 1;
        let grass_row = HEIGHT - 2;

        let mut rows = vec![vec!['.'; WIDTH]; HEIGHT];
        for col in 0..WIDTH {
            rows[grass_row][col] = 'G';
            rows[ground_row][col] = '#';
        }

        let platforms = [
            (HEIGHT - 6, 5, 10),
            (HEIGHT - 8, 25, 8),
            (HEIGHT - 6, 45, 12),
            (HEIGHT - 10, 70, 10),
            (HEIGHT - 7, 95, 14),
            (HEIGHT - 9, 125, 12),
            (HEIGHT - 6, 150, 10),
            (HEIGHT - 6, 162, 5),
        ];
        for (row, start, len) in platforms {
            for col in start..(start + len).min(WIDTH) {
                rows[row][col] = '#';
            }
        }

        for col in (35..44).step_by(2) {
            rows[HEIGHT - 4][col] = '#';
        }
        for col in 30..=32 {
            rows[grass_row][col] = 'X';
        }

        let enemies = [
            (8, HEIGHT - 7),
            (27, HEIGHT - 9),
            (50, HEIGHT - 7),
            (74, HEIGHT - 11),
            (98, HEIGHT - 8),
            (129, HEIGHT - 10),
            (152, HEIGHT - 7),
            (18, HEIGHT - 3),
            (60, HEIGHT - 3),
            (110, HEIGHT - 3),
        ];
        for (col, row) in enemies {
            rows[row][col] = 'E';
        }
        rows[HEIGHT - 3][12] = 'A';
        rows[HEIGHT - 7][140] = 'H';
        rows[HEIGHT - 3][WIDTH - 8] = 'B';

        let rows: Vec<String> = rows.into_iter().map(|row| row.into_iter().collect()).collect();
        let map = TileMap::from_rows(&rows);
        Self::assemble("level1".to_string(), map, Some([6, HEIGHT as i32 - 3]))
    }
}

fn spawn_point(map: &TileMap, explicit: Option<[i32; 2]>) -> Vec2 {
    let size = map.tile_size();
    let marker = map.objects().into_iter().find(|o| o.tag == 'P');
    let mut pos = match (marker, explicit) {
        (Some(marker), _) => marker.world_center(size),
        (None, Some([col, row])) => LevelObject { tag: 'P', row, col }.world_center(size),
        (None, None) => LevelObject {
            tag: 'P',
            row: map.height() as i32 - 3,
            col: 2,
        }
        .world_center(size),
    };
    for _ in 0..MAX_SPAWN_LIFT {
        if !map.is_solid_at_world(pos) {
            break;
        }
        pos.y -= size;
    }
    pos
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn default_id() -> String {
    "untitled".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::TILE_SIZE;
    use std::io::Write;

    #[test]
    fn marker_beats_explicit_spawn() {
        let level = Level::from_def(LevelDef {
            id: "t".into(),
            rows: vec!["....".into(), ".P..".into(), "####".into()],
            spawn: Some([3, 0]),
        })
        .unwrap();
        assert_eq!(level.spawn, vec2(1.5 * TILE_SIZE, 1.5 * TILE_SIZE));
    }

    #[test]
    fn spawn_inside_ground_is_lifted() {
        let level = Level::from_def(LevelDef {
            id: "t".into(),
            rows: vec!["....".into(), "....".into(), "####".into(), "####".into()],
            spawn: Some([1, 3]),
        })
        .unwrap();
        assert_eq!(level.spawn, vec2(1.5 * TILE_SIZE, 1.5 * TILE_SIZE));
    }

    #[test]
    fn default_spawn_column_two() {
        let level = Level::from_rows("t", &[".....", ".....", ".....", "....."]).unwrap();
        assert_eq!(level.spawn, vec2(2.5 * TILE_SIZE, 1.5 * TILE_SIZE));
    }

    #[test]
    fn degenerate_levels_are_rejected() {
        assert!(matches!(
            Level::from_rows::<&str>("t", &[]),
            Err(LevelLoadError::Invalid(_))
        ));
        assert!(matches!(
            Level::from_rows("t", &["", "###"]),
            Err(LevelLoadError::Invalid(_))
        ));
    }

    #[test]
    fn reads_yaml_and_json_files() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("a.yaml");
        let mut f = std::fs::File::create(&yaml).unwrap();
        writeln!(f, "id: yard\nrows:\n  - \"..E.\"\n  - \"GGGG\"\nspawn: [0, 0]").unwrap();
        let level = Level::load_from(&yaml).unwrap();
        assert_eq!(level.id, "yard");
        assert_eq!(level.map.width(), 4);
        assert_eq!(level.objects().len(), 1);

        let json = dir.path().join("b.json");
        std::fs::write(&json, "{\"rows\": [\"...\", \"###\"]}").unwrap();
        let level = Level::load_from(&json).unwrap();
        assert_eq!(level.id, "untitled");
        assert_eq!(level.map.height(), 2);

        let bad = dir.path().join("c.json");
        std::fs::write(&bad, "rows: [\"...\"]").unwrap();
        assert!(matches!(Level::load_from(&bad), Err(LevelLoadError::Json(_))));
    }

    #[test]
    fn builtin_level_has_expected_markers() {
        let level = Level::builtin();
        assert_eq!(level.map.width(), 180);
        assert_eq!(level.map.height(), 20);
        let objects = level.objects();
        let count = |tag| objects.iter().filter(|o| o.tag == tag).count();
        assert_eq!(count('E'), 10);
        assert_eq!(count('B'), 1);
        assert_eq!(count('A'), 1);
        assert_eq!(count('H'), 1);
        assert!(!level.map.is_solid_at_world(level.spawn));
    }
}
