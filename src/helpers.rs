use macroquad::prelude::*;

// Separation below this is treated as touching, not overlapping.
pub const OVERLAP_EPSILON: f32 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Aabb {
    pub fn from_center(center: Vec2, half: Vec2) -> Self {
        Self {
            left: center.x - half.x,
            top: center.y - half.y,
            right: center.x + half.x,
            bottom: center.y + half.y,
        }
    }

    pub fn from_rect(rect: Rect) -> Self {
        Self {
            left: rect.x,
            top: rect.y,
            right: rect.x + rect.w,
            bottom: rect.y + rect.h,
        }
    }

    pub fn center(&self) -> Vec2 {
        vec2((self.left + self.right) * 0.5, (self.top + self.bottom) * 0.5)
    }

    pub fn penetration(&self, other: &Aabb) -> Option<Vec2> {
        let x = overlap_1d(self.left, self.right, other.left, other.right);
        let y = overlap_1d(self.top, self.bottom, other.top, other.bottom);
        if x > OVERLAP_EPSILON && y > OVERLAP_EPSILON {
            Some(vec2(x, y))
        } else {
            None
        }
    }
}

pub fn overlap_1d(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> f32 {
    a_max.min(b_max) - a_min.max(b_min)
}

pub fn dist_sq(a: Vec2, b: Vec2) -> f32 {
    let d = b - a;
    d.x * d.x + d.y * d.y
}

pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

pub fn angle_dir(angle: f32) -> Vec2 {
    vec2(angle.cos(), angle.sin())
}

pub fn safe_direction(from: Vec2, to: Vec2) -> Option<Vec2> {
    let d = to - from;
    let len = d.length();
    if len > 1e-4 { Some(d / len) } else { None }
}

pub fn fan_angles(aim: f32, pellets: u32, spread: f32) -> Vec<f32> {
    match pellets {
        0 => Vec::new(),
        1 => vec![aim],
        n => (0..n)
            .map(|i| {
                let t = i as f32 / (n - 1) as f32;
                aim + (t - 0.5) * spread
            })
            .collect(),
    }
}

pub fn tick_down(timer_ms: &mut f32, dt_ms: f32) {
    if *timer_ms > 0.0 {
        *timer_ms = (*timer_ms - dt_ms).max(0.0);
    }
}

pub fn decay_per_tick(factor: f32, dt: f32) -> f32 {
    factor.powf(dt * 60.0)
}
