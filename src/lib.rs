pub mod boss;
pub mod bullet;
pub mod collision;
pub mod config;
pub mod enemy;
pub mod entity;
pub mod helpers;
pub mod input;
pub mod level;
pub mod map;
pub mod pickup;
pub mod player;
pub mod session;
pub mod weapon;

pub use config::GameConfig;
pub use input::InputState;
pub use level::Level;
pub use session::GameSession;
