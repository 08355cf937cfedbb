use macroquad::prelude::*;

use crate::helpers::{Aabb, OVERLAP_EPSILON};
use crate::map::{Material, TileMap};

pub const DEFAULT_PASSES: u32 = 4;
pub const GROUND_PROBE: f32 = 0.5;
const ESCAPE_STEP: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolveOptions {
    pub half: Vec2,
    pub passes: u32,
    // Zero disables step-up.
    pub step_height: f32,
}

impl ResolveOptions {
    pub fn new(half: Vec2) -> Self {
        Self {
            half,
            passes: DEFAULT_PASSES,
            step_height: 0.0,
        }
    }

    pub fn square(radius: f32) -> Self {
        Self::new(vec2(radius, radius))
    }

    pub fn with_step(mut self, step_height: f32) -> Self {
        self.step_height = step_height.max(0.0);
        self
    }

    pub fn with_passes(mut self, passes: u32) -> Self {
        self.passes = passes.max(1);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileContact {
    pub material: Material,
    pub center: Vec2,
    pub damage: i32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Resolved {
    pub pos: Vec2,
    pub vel: Vec2,
    pub on_ground: bool,
    pub blocked_x: bool,
    pub hit_ceiling: bool,
    pub stepped: bool,
    pub ground: Option<Material>,
    pub hazard: Option<TileContact>,
}

struct Penetration {
    row: i32,
    col: i32,
    area: f32,
}

pub fn resolve_tiles(map: &TileMap, pos: Vec2, vel: Vec2, opts: &ResolveOptions) -> Resolved {
    let mut out = Resolved {
        pos,
        vel,
        on_ground: false,
        blocked_x: false,
        hit_ceiling: false,
        stepped: false,
        ground: None,
        hazard: None,
    };
    let mut candidates = Vec::new();

    for _ in 0..opts.passes.max(1) {
        collect_penetrations(map, out.pos, opts.half, &mut candidates);
        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| b.area.total_cmp(&a.area));

        for hit in &candidates {
            let tile = Aabb::from_rect(map.tile_bounds(hit.row, hit.col));
            let body = Aabb::from_center(out.pos, opts.half);
            // An earlier push this pass may already have cleared this tile.
            let Some(pen) = body.penetration(&tile) else {
                continue;
            };
            let material = map.material_at(hit.row, hit.col);
            let tile_center = tile.center();
            record_hazard(&mut out, material, tile_center);

            if pen.x < pen.y {
                if out.pos.x < tile_center.x {
                    out.pos.x -= pen.x + OVERLAP_EPSILON;
                    out.vel.x = out.vel.x.min(0.0);
                } else {
                    out.pos.x += pen.x + OVERLAP_EPSILON;
                    out.vel.x = out.vel.x.max(0.0);
                }
                out.blocked_x = true;
            } else if out.pos.y < tile_center.y {
                out.pos.y -= pen.y + OVERLAP_EPSILON;
                out.vel.y = out.vel.y.min(0.0);
                out.on_ground = true;
                out.ground = Some(material);
            } else {
                out.pos.y += pen.y + OVERLAP_EPSILON;
                out.vel.y = out.vel.y.max(0.0);
                out.hit_ceiling = true;
            }
        }
    }

    if aabb_hits_solid(map, out.pos, opts.half) {
        if let Some(free) = nearest_free(map, pos, opts.half) {
            settle_at(&mut out, pos, free);
        }
    }

    if out.blocked_x && !out.on_ground && opts.step_height > 0.0 {
        let stepped = vec2(pos.x, out.pos.y - opts.step_height);
        if !aabb_hits_solid(map, stepped, opts.half) {
            out.pos = stepped;
            out.vel.x = vel.x;
            out.blocked_x = false;
            out.stepped = true;
        }
    }

    if !out.on_ground && out.vel.y >= 0.0 {
        if let Some(material) = ground_below(map, out.pos, opts.half) {
            out.on_ground = true;
            out.ground = Some(material);
            out.vel.y = out.vel.y.min(0.0);
        }
    }

    out
}

pub fn aabb_hits_solid(map: &TileMap, center: Vec2, half: Vec2) -> bool {
    let body = Aabb::from_center(center, half);
    let (rows, cols) = tile_range(map, &body);
    for row in rows {
        for col in cols.clone() {
            if !map.is_solid(row, col) {
                continue;
            }
            let tile = Aabb::from_rect(map.tile_bounds(row, col));
            if body.penetration(&tile).is_some() {
                return true;
            }
        }
    }
    false
}

pub fn ground_below(map: &TileMap, center: Vec2, half: Vec2) -> Option<Material> {
    let body = Aabb::from_center(center, half);
    let probe = Aabb {
        left: body.left,
        right: body.right,
        top: body.bottom - OVERLAP_EPSILON,
        bottom: body.bottom + GROUND_PROBE,
    };
    let (rows, cols) = tile_range(map, &probe);
    let mut best: Option<(f32, Material)> = None;
    for row in rows {
        for col in cols.clone() {
            let material = map.material_at(row, col);
            if !material.is_solid() {
                continue;
            }
            let tile = Aabb::from_rect(map.tile_bounds(row, col));
            if tile.top < body.bottom - OVERLAP_EPSILON {
                continue;
            }
            let width = crate::helpers::overlap_1d(body.left, body.right, tile.left, tile.right);
            if width > OVERLAP_EPSILON && best.is_none_or(|(w, _)| width > w) {
                best = Some((width, material));
            }
        }
    }
    best.map(|(_, material)| material)
}

// Ring search around `origin` on a quarter-unit lattice, nearest ring first.
fn nearest_free(map: &TileMap, origin: Vec2, half: Vec2) -> Option<Vec2> {
    let rings = (map.tile_size() * 0.5 / ESCAPE_STEP) as i32;
    for ring in 1..=rings {
        let mut best: Option<(f32, Vec2)> = None;
        for i in -ring..=ring {
            for j in -ring..=ring {
                if i.abs() != ring && j.abs() != ring {
                    continue;
                }
                let offset = vec2(i as f32, j as f32) * ESCAPE_STEP;
                let candidate = origin + offset;
                if aabb_hits_solid(map, candidate, half) {
                    continue;
                }
                let d = offset.length_squared();
                if best.is_none_or(|(bd, _)| d < bd) {
                    best = Some((d, candidate));
                }
            }
        }
        if let Some((_, candidate)) = best {
            return Some(candidate);
        }
    }
    None
}

fn settle_at(out: &mut Resolved, origin: Vec2, free: Vec2) {
    let push = free - origin;
    out.pos = free;
    if push.x > 0.0 {
        out.vel.x = out.vel.x.max(0.0);
        out.blocked_x = true;
    } else if push.x < 0.0 {
        out.vel.x = out.vel.x.min(0.0);
        out.blocked_x = true;
    }
    if push.y < 0.0 {
        out.vel.y = out.vel.y.min(0.0);
    } else if push.y > 0.0 {
        out.vel.y = out.vel.y.max(0.0);
        out.hit_ceiling = true;
    }
    out.on_ground = false;
    out.ground = None;
}

fn collect_penetrations(map: &TileMap, center: Vec2, half: Vec2, out: &mut Vec<Penetration>) {
    out.clear();
    let body = Aabb::from_center(center, half);
    let (rows, cols) = tile_range(map, &body);
    for row in rows {
        for col in cols.clone() {
            if !map.is_solid(row, col) {
                continue;
            }
            let tile = Aabb::from_rect(map.tile_bounds(row, col));
            if let Some(pen) = body.penetration(&tile) {
                out.push(Penetration {
                    row,
                    col,
                    area: pen.x * pen.y,
                });
            }
        }
    }
}

fn record_hazard(out: &mut Resolved, material: Material, center: Vec2) {
    let damage = material.info().touch_damage;
    if damage <= 0 {
        return;
    }
    if out.hazard.is_none_or(|h| damage > h.damage) {
        out.hazard = Some(TileContact {
            material,
            center,
            damage,
        });
    }
}

fn tile_range(map: &TileMap, body: &Aabb) -> (std::ops::RangeInclusive<i32>, std::ops::RangeInclusive<i32>) {
    let size = map.tile_size();
    let max_col = map.width() as i32 - 1;
    let max_row = map.height() as i32 - 1;
    let min_c = ((body.left / size).floor() as i32).max(0);
    let max_c = ((body.right / size).floor() as i32).min(max_col);
    let min_r = ((body.top / size).floor() as i32).max(0);
    let max_r = ((body.bottom / size).floor() as i32).min(max_row);
    (min_r..=max_r, min_c..=max_c)
}
