use macroquad::prelude::*;

use ratgame::entity::{Entity, EntityKind};
use ratgame::map::Material;
use ratgame::session::GameSession;
use ratgame::weapon::WeaponKind;
use ratgame::{GameConfig, InputState, Level};

const CONFIG_PATH: &str = "config/game.yaml";
const FIXED_STEP: f32 = 1.0 / 60.0;
const MAX_FRAME_DT: f32 = 0.1;
const CAMERA_DRAG: f32 = 5.0;
const CAMERA_FOV: f32 = 640.0;

fn window_conf() -> Conf {
    Conf {
        window_title: "ratgame".to_owned(),
        window_width: 1280,
        window_height: 720,
        sample_count: 1,
        ..Default::default()
    }
}

fn load_level_from_args() -> Level {
    let Some(path) = std::env::args().nth(1) else {
        return Level::builtin();
    };
    match Level::load_from(&path) {
        Ok(level) => level,
        Err(err) => {
            log::error!("level {path} failed to load: {err}; using the built-in level");
            Level::builtin()
        }
    }
}

fn poll_input(camera: &Camera2D) -> InputState {
    InputState {
        left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
        right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
        jump: is_key_down(KeyCode::Space),
        sprint: is_key_down(KeyCode::LeftShift) || is_key_down(KeyCode::RightShift),
        crouch: is_key_down(KeyCode::C) || is_key_down(KeyCode::S),
        fire: is_mouse_button_down(MouseButton::Left),
        reload: is_key_down(KeyCode::R),
        weapon1: is_key_down(KeyCode::Key1),
        weapon2: is_key_down(KeyCode::Key2),
        pause: is_key_down(KeyCode::Escape),
        restart: is_key_down(KeyCode::N),
        cursor: camera.screen_to_world(mouse_position().into()),
    }
}

fn drive_ragdoll(session: &mut GameSession, cursor: Vec2) {
    if session.player().is_alive() {
        return;
    }
    let player = session.player_mut();
    if is_mouse_button_pressed(MouseButton::Left) {
        player.ragdoll_drag_begin(cursor.x);
    } else if is_mouse_button_down(MouseButton::Left) {
        player.ragdoll_drag_move(cursor.x);
    }
    if is_mouse_button_released(MouseButton::Left) {
        player.ragdoll_drag_end();
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load_from(CONFIG_PATH).unwrap_or_else(|err| {
        log::error!("config {CONFIG_PATH} rejected: {err}; using defaults");
        GameConfig::default()
    });
    let mut session = GameSession::new(load_level_from_args(), config);

    let mut camera = Camera2D {
        target: session.player().position(),
        zoom: camera_zoom_for_fov(CAMERA_FOV),
        ..Default::default()
    };
    let mut accumulator = 0.0f32;

    loop {
        let frame_dt = get_frame_time().min(MAX_FRAME_DT);

        camera.zoom = camera_zoom_for_fov(CAMERA_FOV);
        let input = poll_input(&camera);
        drive_ragdoll(&mut session, input.cursor);

        accumulator += frame_dt;
        while accumulator >= FIXED_STEP {
            session.tick(FIXED_STEP, &input);
            accumulator -= FIXED_STEP;
        }

        let follow = 1.0 - (-CAMERA_DRAG * frame_dt).exp();
        camera.target += (session.player().position() - camera.target) * follow;

        set_camera(&camera);
        clear_background(Color::from_rgba(24, 26, 34, 255));
        let view = camera_view_rect(camera.target, CAMERA_FOV);
        draw_tiles(&session, view);
        draw_pickups(&session);
        draw_entities(&session);
        draw_bullets(&session);

        set_default_camera();
        draw_hud(&session);

        next_frame().await;
    }
}

fn material_color(material: Material) -> Option<Color> {
    match material {
        Material::Air | Material::Unknown => None,
        Material::Grass => Some(Color::from_rgba(70, 150, 60, 255)),
        Material::Dirt => Some(Color::from_rgba(110, 80, 50, 255)),
        Material::Ice => Some(Color::from_rgba(170, 220, 240, 255)),
        Material::Sand => Some(Color::from_rgba(220, 200, 130, 255)),
        Material::Gravel => Some(Color::from_rgba(130, 130, 130, 255)),
        Material::Water => Some(Color::from_rgba(40, 90, 200, 160)),
        Material::Spikes => Some(Color::from_rgba(200, 60, 60, 255)),
    }
}

fn draw_tiles(session: &GameSession, view: Rect) {
    let map = session.map();
    let size = map.tile_size();
    let col0 = (view.x / size).floor().max(0.0) as i32;
    let row0 = (view.y / size).floor().max(0.0) as i32;
    let col1 = ((view.x + view.w) / size).ceil() as i32;
    let row1 = ((view.y + view.h) / size).ceil() as i32;
    for row in row0..=row1.min(map.height() as i32 - 1) {
        for col in col0..=col1.min(map.width() as i32 - 1) {
            if let Some(color) = material_color(map.material_at(row, col)) {
                let r = map.tile_bounds(row, col);
                draw_rectangle(r.x, r.y, r.w, r.h, color);
            }
        }
    }
}

fn draw_pickups(session: &GameSession) {
    for pickup in session.pickups() {
        let color = match pickup.weapon {
            WeaponKind::Pistol => GOLD,
            WeaponKind::Shotgun => ORANGE,
        };
        draw_rectangle(pickup.pos.x - 8.0, pickup.pos.y - 8.0, 16.0, 16.0, color);
    }
}

fn draw_entities(session: &GameSession) {
    let player = session.player();
    let hitbox = player.world_hitbox();
    let tint = if player.damage_flash_ms() > 0.0 { RED } else { SKYBLUE };
    if player.ragdoll().active {
        let center = player.position();
        let params = DrawRectangleParams {
            offset: vec2(0.5, 0.5),
            rotation: player.ragdoll().body_angle,
            color: GRAY,
        };
        draw_rectangle_ex(center.x, center.y, hitbox.w, hitbox.h, params);
    } else {
        draw_rectangle(hitbox.x, hitbox.y, hitbox.w, hitbox.h, tint);
        let muzzle = player.muzzle_pos();
        draw_line(player.position().x, player.position().y - 20.0, muzzle.x, muzzle.y, 4.0, WHITE);
    }

    for view in session.entity_views().into_iter().skip(1) {
        let color = match (view.kind, view.alive) {
            (_, false) => DARKGRAY,
            (EntityKind::Boss, true) => PURPLE,
            _ => MAROON,
        };
        draw_rectangle(
            view.pos.x - view.radius,
            view.pos.y - view.radius,
            view.radius * 2.0,
            view.radius * 2.0,
            color,
        );
        if view.alive && view.health < view.max_health {
            let frac = view.health as f32 / view.max_health as f32;
            let w = view.radius * 2.0;
            let y = view.pos.y - view.radius - 8.0;
            draw_rectangle(view.pos.x - view.radius, y, w, 4.0, DARKGRAY);
            draw_rectangle(view.pos.x - view.radius, y, w * frac, 4.0, GREEN);
        }
    }
}

fn draw_bullets(session: &GameSession) {
    for bullet in session.bullets() {
        let color = if bullet.from_player { YELLOW } else { PINK };
        draw_circle(bullet.pos.x, bullet.pos.y, 3.0, color);
    }
}

fn draw_hud(session: &GameSession) {
    let hud = session.hud();
    draw_rectangle(20.0, 20.0, 200.0, 16.0, DARKGRAY);
    draw_rectangle(20.0, 20.0, 200.0 * hud.health_fraction, 16.0, RED);

    let weapon = hud.weapon.name();
    let mut line = format!("{weapon}  {} / {}", hud.magazine, hud.reserve);
    if hud.reload_progress < 1.0 {
        line.push_str(&format!("  reloading {:.0}%", hud.reload_progress * 100.0));
    }
    if !hud.shotgun_unlocked {
        line.push_str("  [shotgun locked]");
    }
    draw_text(&line, 20.0, 60.0, 26.0, WHITE);
    draw_text(&format!("FPS: {}", get_fps()), 20.0, 88.0, 20.0, GRAY);

    let banner = if !hud.alive {
        Some("You died - press N to restart")
    } else if session.is_paused() {
        Some("Paused")
    } else {
        None
    };
    if let Some(banner) = banner {
        let size = measure_text(banner, None, 40, 1.0);
        draw_text(
            banner,
            (screen_width() - size.width) * 0.5,
            screen_height() * 0.4,
            40.0,
            WHITE,
        );
    }
}

fn camera_zoom_for_fov(view_height: f32) -> Vec2 {
    let view_h = view_height.max(1.0);
    let aspect = screen_width().max(1.0) / screen_height().max(1.0);
    let view_w = view_h * aspect;
    vec2(2.0 / view_w, 2.0 / view_h)
}

fn camera_view_rect(target: Vec2, view_height: f32) -> Rect {
    let view_h = view_height.max(1.0);
    let aspect = screen_width().max(1.0) / screen_height().max(1.0);
    let view_w = view_h * aspect;
    Rect::new(target.x - view_w * 0.5, target.y - view_h * 0.5, view_w, view_h)
}
