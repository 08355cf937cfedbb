use macroquad::prelude::*;

pub const TILE_SIZE: f32 = 32.0;
pub const EMPTY_TILE: char = '.';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Material {
    Air,
    Grass,
    Ice,
    Sand,
    Dirt,
    Gravel,
    Water,
    Spikes,
    Unknown,
}

impl Material {
    pub const ALL: [Material; 9] = [
        Material::Air,
        Material::Grass,
        Material::Ice,
        Material::Sand,
        Material::Dirt,
        Material::Gravel,
        Material::Water,
        Material::Spikes,
        Material::Unknown,
    ];

    pub fn info(self) -> MaterialInfo {
        material_info(self)
    }

    pub fn is_solid(self) -> bool {
        material_info(self).solid
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialInfo {
    pub name: &'static str,
    pub solid: bool,
    pub friction: f32,
    pub destructible: bool,
    pub explosive: bool,
    pub max_health: i32,
    pub touch_damage: i32,
}

impl MaterialInfo {
    const fn new(name: &'static str, solid: bool, friction: f32) -> Self {
        Self {
            name,
            solid,
            friction,
            destructible: false,
            explosive: false,
            max_health: 0,
            touch_damage: 0,
        }
    }

    const fn destructible(mut self, max_health: i32) -> Self {
        self.destructible = true;
        self.max_health = max_health;
        self
    }

    const fn touch_damage(mut self, amount: i32) -> Self {
        self.touch_damage = amount;
        self
    }
}

pub fn material_info(material: Material) -> MaterialInfo {
    match material {
        Material::Grass => MaterialInfo::new("Grass", true, 0.9).destructible(40),
        Material::Ice => MaterialInfo::new("Ice", true, 0.98).destructible(30),
        Material::Sand => MaterialInfo::new("Sand", true, 0.6).destructible(30),
        Material::Dirt => MaterialInfo::new("Dirt", true, 0.85).destructible(50),
        Material::Gravel => MaterialInfo::new("Gravel", true, 0.8).destructible(35),
        Material::Water => MaterialInfo::new("Water", false, 0.4),
        Material::Spikes => MaterialInfo::new("Spikes", true, 0.2).touch_damage(25),
        Material::Air => MaterialInfo::new("Air", false, 1.0),
        Material::Unknown => MaterialInfo::new("Unknown", false, 1.0),
    }
}

pub fn material_for_char(ch: char) -> Material {
    match ch {
        '.' | 'A' | 'H' | 'P' => Material::Air,
        '#' => Material::Dirt,
        'G' => Material::Grass,
        'I' => Material::Ice,
        'S' => Material::Sand,
        'V' => Material::Gravel,
        'W' => Material::Water,
        'X' => Material::Spikes,
        _ => Material::Unknown,
    }
}

pub fn is_terrain_char(ch: char) -> bool {
    matches!(ch, '#' | 'G' | 'I' | 'S' | 'V' | 'W' | 'X')
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridIndex {
    pub x: i32,
    pub y: i32,
}

impl GridIndex {
    pub fn new(position: Vec2, tile_size: f32) -> Self {
        Self {
            x: (position.x / tile_size).floor() as i32,
            y: (position.y / tile_size).floor() as i32,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelObject {
    pub tag: char,
    pub row: i32,
    pub col: i32,
}

impl LevelObject {
    pub fn world_center(&self, tile_size: f32) -> Vec2 {
        vec2(
            self.col as f32 * tile_size + tile_size * 0.5,
            self.row as f32 * tile_size + tile_size * 0.5,
        )
    }
}

#[derive(Clone, Debug)]
pub struct TileMap {
    width: usize,
    height: usize,
    tile_size: f32,
    tiles: Vec<char>,
    materials: Vec<Material>,
}

impl TileMap {
    pub fn new(width: usize, height: usize) -> Self {
        let len = width * height;
        Self {
            width,
            height,
            tile_size: TILE_SIZE,
            tiles: vec![EMPTY_TILE; len],
            materials: vec![Material::Air; len],
        }
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let width = rows
            .first()
            .map(|row| row.as_ref().chars().count())
            .unwrap_or(0);
        let height = rows.len();
        let mut map = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.as_ref().chars().take(width).enumerate() {
                let i = map.idx(x, y);
                map.tiles[i] = ch;
            }
        }
        map.rebuild_materials();
        map
    }

    pub fn rebuild_materials(&mut self) {
        self.materials.clear();
        self.materials
            .extend(self.tiles.iter().map(|&ch| material_for_char(ch)));
    }

    pub fn set_tile(&mut self, row: i32, col: i32, ch: char) {
        if !self.in_bounds(row, col) {
            return;
        }
        let i = self.idx(col as usize, row as usize);
        self.tiles[i] = ch;
        self.materials[i] = material_for_char(ch);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn world_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width
    }

    pub fn tile_char(&self, row: i32, col: i32) -> char {
        if !self.in_bounds(row, col) {
            return EMPTY_TILE;
        }
        self.tiles[self.idx(col as usize, row as usize)]
    }

    pub fn material_at(&self, row: i32, col: i32) -> Material {
        if !self.in_bounds(row, col) {
            return Material::Air;
        }
        self.materials[self.idx(col as usize, row as usize)]
    }

    pub fn is_solid(&self, row: i32, col: i32) -> bool {
        self.material_at(row, col).is_solid()
    }

    pub fn grid_index(&self, position: Vec2) -> GridIndex {
        GridIndex::new(position, self.tile_size)
    }

    pub fn material_at_world(&self, position: Vec2) -> Material {
        let grid = self.grid_index(position);
        self.material_at(grid.y, grid.x)
    }

    pub fn is_solid_at_world(&self, position: Vec2) -> bool {
        self.material_at_world(position).is_solid()
    }

    pub fn tile_bounds(&self, row: i32, col: i32) -> Rect {
        Rect::new(
            col as f32 * self.tile_size,
            row as f32 * self.tile_size,
            self.tile_size,
            self.tile_size,
        )
    }

    pub fn objects(&self) -> Vec<LevelObject> {
        let mut out = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let ch = self.tiles[self.idx(x, y)];
                if ch == EMPTY_TILE || is_terrain_char(ch) {
                    continue;
                }
                out.push(LevelObject {
                    tag: ch,
                    row: y as i32,
                    col: x as i32,
                });
            }
        }
        out
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_material_has_info() {
        for material in Material::ALL {
            let info = material_info(material);
            assert!(!info.name.is_empty());
            assert!((0.0..=1.0).contains(&info.friction));
        }
        assert_eq!(material_info(Material::Spikes).touch_damage, 25);
        assert!(!Material::Water.is_solid());
        assert!(Material::Ice.is_solid());
    }

    #[test]
    fn out_of_bounds_is_air() {
        let map = TileMap::from_rows(&["##", "##"]);
        assert_eq!(map.material_at(-1, 0), Material::Air);
        assert_eq!(map.material_at(0, 2), Material::Air);
        assert_eq!(map.material_at(5, 5), Material::Air);
        assert!(!map.is_solid_at_world(vec2(-10.0, -10.0)));
        assert!(map.is_solid_at_world(vec2(10.0, 10.0)));
        assert_eq!(map.tile_char(9, 9), EMPTY_TILE);
    }

    #[test]
    fn set_tile_keeps_materials_in_sync() {
        let mut map = TileMap::from_rows(&["...", "###"]);
        assert!(!map.is_solid(0, 1));
        map.set_tile(0, 1, 'X');
        assert_eq!(map.material_at(0, 1), Material::Spikes);
        map.set_tile(1, 0, '.');
        assert!(!map.is_solid(1, 0));
    }

    #[test]
    fn rows_are_padded_to_first_width() {
        let map = TileMap::from_rows(&["#####", "#", "#######"]);
        assert_eq!(map.width(), 5);
        assert_eq!(map.tile_char(1, 3), EMPTY_TILE);
        assert_eq!(map.tile_char(2, 4), '#');
        assert_eq!(map.tile_char(2, 5), EMPTY_TILE);
    }

    #[test]
    fn objects_skip_terrain() {
        let map = TileMap::from_rows(&["P.E.B", "GGXWA"]);
        let tags: Vec<char> = map.objects().iter().map(|o| o.tag).collect();
        assert_eq!(tags, vec!['P', 'E', 'B', 'A']);
        let boss = map.objects()[2];
        assert_eq!(boss.world_center(TILE_SIZE), vec2(4.5 * TILE_SIZE, 0.5 * TILE_SIZE));
    }
}
