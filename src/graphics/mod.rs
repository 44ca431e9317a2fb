// =============================================================================
// GRAPHICS — the software renderer
//
// Everything draws into a `Surface` on the CPU. The host only ever sees the
// finished screen surface.
// =============================================================================

pub mod blend;
mod blit;
pub mod color;
pub mod font;
pub mod image;
pub mod mode7;
mod primitive;
pub mod sprite;
mod surface;
pub mod text;
pub mod tilemap;

pub use blit::SpriteTransform;
pub use color::{Pen, PixelFormat, hsv_to_rgba, pack_rgb565, unpack_rgb565};
pub use font::{Font, FontStyle, MINIMAL_FONT, OUTLINE_FONT};
pub use image::ImageError;
pub use mode7::{Mode7Camera, mode7};
pub use primitive::orient2d;
pub use sprite::SpriteRef;
pub use surface::{Palette, Surface, palette_from_slice};
pub use text::{TextAlign, measure_text, wrap_text};
pub use tilemap::{
    Layer, RepeatMode, SimpleTileLayer, TileLayer, TileMapError, TiledMap, Tiles, TransformedTileLayer,
};
