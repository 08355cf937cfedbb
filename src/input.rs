use macroquad::prelude::*;

// `cursor` is in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub sprint: bool,
    pub crouch: bool,
    pub fire: bool,
    pub reload: bool,
    pub weapon1: bool,
    pub weapon2: bool,
    pub pause: bool,
    pub restart: bool,
    pub cursor: Vec2,
}

impl InputState {
    pub fn move_dir(&self) -> f32 {
        let mut dir = 0.0;
        if self.left {
            dir -= 1.0;
        }
        if self.right {
            dir += 1.0;
        }
        dir
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pressed {
    pub jump: bool,
    pub fire: bool,
    pub reload: bool,
    pub weapon1: bool,
    pub weapon2: bool,
    pub pause: bool,
    pub restart: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeTracker {
    prev: InputState,
}

impl EdgeTracker {
    pub fn step(&mut self, input: &InputState) -> Pressed {
        let prev = self.prev;
        self.prev = *input;
        Pressed {
            jump: input.jump && !prev.jump,
            fire: input.fire && !prev.fire,
            reload: input.reload && !prev.reload,
            weapon1: input.weapon1 && !prev.weapon1,
            weapon2: input.weapon2 && !prev.weapon2,
            pause: input.pause && !prev.pause,
            restart: input.restart && !prev.restart,
        }
    }
}
