pub mod audio;
pub mod engine;
pub mod fs;
pub mod graphics;
pub mod math;
pub mod types;

#[cfg(feature = "host")]
pub mod host;

pub use engine::{Button, Engine, Game, ScreenMode};
pub use graphics::{MINIMAL_FONT, OUTLINE_FONT, Pen, Surface, TextAlign};
pub use types::{Point, Rect, Size, Vec2};

#[cfg(feature = "host")]
pub use host::EngineBuilder;
