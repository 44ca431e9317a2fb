// =============================================================================
// TILEMAP.RS — tile layers drawn from a spritesheet
//
// Each layer is a grid of 8×8 tile ids with optional per-tile transform bytes.
// A layer's `transform` maps screen coordinates to world (map pixel)
// coordinates: simple layers only honour its translation, transformed layers
// sample every screen pixel through it.
//
// Layers load from MTMX assets:
//
//   "MTMX"  magic
//   u16     header_length (tile data starts here)
//   u16     flags          bit 0: 16-bit tile ids, bit 1: transform bytes
//   u16     empty_tile
//   u16     width, height  (tiles)
//   u16     layers
//
// followed by every layer's tile ids and then every layer's transforms.
// =============================================================================

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use log::debug;
use thiserror::Error;

use super::blit::SpriteTransform;
use super::color::Pen;
use super::surface::Surface;
use crate::types::{Mat3, Point, Rect, Size, Vec2, mat3_translation, mat3_translation_of, transform_point};

pub const TILE_SIZE: i32 = 8;
pub const TMX_HEADER_LEN: usize = 16;
pub const TMX_16BIT: u16 = 0b01;
pub const TMX_TRANSFORMS: u16 = 0b10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileMapError {
    #[error("missing MTMX header")]
    BadMagic,
    #[error("map data is truncated")]
    Truncated,
    #[error("map has no layers")]
    NoLayers,
    #[error("layer {0} does not exist")]
    NoSuchLayer(usize),
}

/// What to draw for tiles outside the layer bounds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RepeatMode {
    /// Draw nothing.
    #[default]
    None,
    /// Wrap around.
    Repeat,
    /// Draw `default_tile_id`.
    DefaultFill,
    /// Repeat the nearest edge tile.
    ClampToEdge,
}

/// Tile id storage, 8 or 16 bits per tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tiles {
    U8(Vec<u8>),
    U16(Vec<u16>),
}

impl Tiles {
    pub fn get(&self, i: usize) -> u16 {
        match self {
            Tiles::U8(t) => t.get(i).copied().unwrap_or(0) as u16,
            Tiles::U16(t) => t.get(i).copied().unwrap_or(0),
        }
    }

    pub fn set(&mut self, i: usize, id: u16) {
        match self {
            Tiles::U8(t) => {
                if let Some(slot) = t.get_mut(i) {
                    *slot = id as u8;
                }
            }
            Tiles::U16(t) => {
                if let Some(slot) = t.get_mut(i) {
                    *slot = id;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Tiles::U8(t) => t.len(),
            Tiles::U16(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

enum Lookup {
    Tile(usize),
    Default,
    Outside,
}

// ── TileLayer ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct TileLayer {
    /// Size in tiles.
    pub bounds: Size,
    pub tiles: Tiles,
    pub transforms: Option<Vec<u8>>,
    pub sprites: Arc<Surface>,
    pub transform: Mat3,
    pub repeat_mode: RepeatMode,
    pub default_tile_id: u16,
    /// Tile id that is never drawn.
    pub empty_tile_id: Option<u16>,
    /// Both dimensions are powers of two, so repeating can mask.
    pub power_of_two: bool,
}

fn is_power_of_two(s: Size) -> bool {
    s.w > 0 && s.h > 0 && (s.w as u32).is_power_of_two() && (s.h as u32).is_power_of_two()
}

impl TileLayer {
    /// Layer of `bounds` tiles, all zero.
    pub fn new(bounds: Size, sprites: Arc<Surface>) -> Self {
        let count = bounds.area().max(0) as usize;
        Self {
            bounds,
            tiles: Tiles::U8(vec![0; count]),
            transforms: None,
            sprites,
            transform: Mat3::IDENTITY,
            repeat_mode: RepeatMode::None,
            default_tile_id: 0,
            empty_tile_id: None,
            power_of_two: is_power_of_two(bounds),
        }
    }

    /// Load layer `index` from an MTMX asset.
    pub fn load_tmx(bytes: &[u8], sprites: Arc<Surface>, index: usize) -> Result<Self, TileMapError> {
        let header = TmxHeader::parse(bytes)?;
        header.layer(bytes, sprites, index)
    }

    fn locate(&self, x: i32, y: i32) -> Lookup {
        let (w, h) = (self.bounds.w, self.bounds.h);
        if w <= 0 || h <= 0 {
            return Lookup::Outside;
        }
        if x >= 0 && y >= 0 && x < w && y < h {
            return Lookup::Tile((x + y * w) as usize);
        }
        match self.repeat_mode {
            RepeatMode::None => Lookup::Outside,
            RepeatMode::DefaultFill => Lookup::Default,
            RepeatMode::Repeat if self.power_of_two => {
                Lookup::Tile(((x & (w - 1)) + (y & (h - 1)) * w) as usize)
            }
            RepeatMode::Repeat => Lookup::Tile((x.rem_euclid(w) + y.rem_euclid(h) * w) as usize),
            RepeatMode::ClampToEdge => Lookup::Tile((x.clamp(0, w - 1) + y.clamp(0, h - 1) * w) as usize),
        }
    }

    /// Index into `tiles` for tile coordinate `p`, after repeat handling.
    /// `None` outside the layer (including default-filled tiles).
    pub fn offset(&self, p: Point) -> Option<usize> {
        match self.locate(p.x, p.y) {
            Lookup::Tile(o) => Some(o),
            _ => None,
        }
    }

    pub fn tile_at(&self, p: Point) -> u16 {
        match self.locate(p.x, p.y) {
            Lookup::Tile(o) => self.tiles.get(o),
            Lookup::Default => self.default_tile_id,
            Lookup::Outside => self.empty_tile_id.unwrap_or(0),
        }
    }

    /// Transform bits for the tile at `p`: 1 = swap, 2 = vertical flip,
    /// 4 = horizontal flip.
    pub fn transform_at(&self, p: Point) -> u8 {
        match (self.offset(p), &self.transforms) {
            (Some(o), Some(t)) => t.get(o).copied().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn set_tile(&mut self, p: Point, id: u16) {
        if let Some(o) = self.offset(p) {
            self.tiles.set(o, id);
        }
    }

    /// Tile id and transform bits to draw at `(x, y)`, if any.
    fn drawable(&self, x: i32, y: i32) -> Option<(u16, u8)> {
        let (id, t) = match self.locate(x, y) {
            Lookup::Tile(o) => {
                let t = self.transforms.as_ref().and_then(|t| t.get(o).copied()).unwrap_or(0);
                (self.tiles.get(o), t)
            }
            Lookup::Default => (self.default_tile_id, 0),
            Lookup::Outside => return None,
        };
        (self.empty_tile_id != Some(id)).then_some((id, t))
    }

    /// Top-left pixel of tile `id` on the spritesheet.
    fn sheet_origin(&self, id: u16) -> Point {
        let cols = self.sprites.cols.max(1);
        let id = id as i32;
        Point::new((id % cols) * TILE_SIZE, (id / cols) * TILE_SIZE)
    }

    /// Fill `count` pixels of one destination row starting at `s` with the
    /// texels between world points `swc` and `ewc`. Runs of the same texel
    /// are written with a single pen span.
    pub fn texture_span(&self, dest: &mut Surface, s: Point, count: u32, swc: Vec2, ewc: Vec2) {
        const FIX_SHIFT: u32 = 16;
        const LIMIT: f32 = 1.0e6;

        if count == 0 || !swc.is_finite() || !ewc.is_finite() {
            return;
        }
        let swc = swc.clamp(Vec2::splat(-LIMIT), Vec2::splat(LIMIT));
        let ewc = ewc.clamp(Vec2::splat(-LIMIT), Vec2::splat(LIMIT));

        let scale = (1u32 << FIX_SHIFT) as f32;
        let mut wx = (swc.x * scale) as i64;
        let mut wy = (swc.y * scale) as i64;
        let dx = ((ewc.x - swc.x) / count as f32 * scale) as i64;
        let dy = ((ewc.y - swc.y) / count as f32 * scale) as i64;

        let mut doff = dest.offset(s.x, s.y);
        let mut c = count;
        let pbf = dest.pbf;

        while c > 0 {
            let wcx = (wx >> FIX_SHIFT) as i32;
            let wcy = (wy >> FIX_SHIFT) as i32;

            if let Some((id, t)) = self.drawable(wcx >> 3, wcy >> 3) {
                let mut u = wcx & 0b111;
                let mut v = wcy & 0b111;
                if t & 0b010 != 0 {
                    v = 7 - v;
                }
                if t & 0b100 != 0 {
                    u = 7 - u;
                }
                if t & 0b001 != 0 {
                    std::mem::swap(&mut u, &mut v);
                }
                let origin = self.sheet_origin(id);

                let mut run = 0usize;
                loop {
                    wx += dx;
                    wy += dy;
                    c -= 1;
                    run += 1;
                    if c == 0 || (wx >> FIX_SHIFT) as i32 != wcx || (wy >> FIX_SHIFT) as i32 != wcy {
                        break;
                    }
                }

                let pen: Pen = self.sprites.get_pixel(Point::new(origin.x + u, origin.y + v));
                pbf(&pen, dest, doff, run);
                doff += run;
                continue;
            }

            // skip the rest of this tile
            loop {
                wx += dx;
                wy += dy;
                doff += 1;
                c -= 1;
                if c == 0
                    || ((wx >> (FIX_SHIFT + 3)) as i32) != wcx >> 3
                    || ((wy >> (FIX_SHIFT + 3)) as i32) != wcy >> 3
                {
                    break;
                }
            }
        }
    }
}

/// Map the layer's transform bits to blit flags.
fn sprite_transform(bits: u8) -> SpriteTransform {
    let mut t = SpriteTransform::NONE;
    if bits & 0b001 != 0 {
        t = t | SpriteTransform::XYSWAP;
    }
    if bits & 0b010 != 0 {
        t = t | SpriteTransform::VERTICAL;
    }
    if bits & 0b100 != 0 {
        t = t | SpriteTransform::HORIZONTAL;
    }
    t
}

// ── Simple and transformed layers ─────────────────────────────────────────────

/// Layer drawn tile by tile with a scroll offset.
#[derive(Clone, Debug)]
pub struct SimpleTileLayer(pub TileLayer);

impl Deref for SimpleTileLayer {
    type Target = TileLayer;
    fn deref(&self) -> &TileLayer { &self.0 }
}

impl DerefMut for SimpleTileLayer {
    fn deref_mut(&mut self) -> &mut TileLayer { &mut self.0 }
}

impl SimpleTileLayer {
    pub fn draw(&self, dest: &mut Surface, viewport: Rect) {
        let viewport = dest.clip.intersection(&viewport);
        if viewport.empty() {
            return;
        }
        let old_clip = dest.clip;
        dest.clip = viewport;

        let scroll = Point::from(mat3_translation_of(&self.transform));
        let tl = viewport.tl() + scroll;
        let br = viewport.br() + scroll;
        let start = Point::new(tl.x.div_euclid(TILE_SIZE), tl.y.div_euclid(TILE_SIZE));
        let end = Point::new(br.x.div_euclid(TILE_SIZE), br.y.div_euclid(TILE_SIZE));

        let sheet = Arc::clone(&self.sprites);
        for y in start.y..=end.y {
            for x in start.x..=end.x {
                let Some((id, bits)) = self.drawable(x, y) else {
                    continue;
                };
                let src = Rect::from_point_size(self.sheet_origin(id), Size::new(TILE_SIZE, TILE_SIZE));
                let p = Point::new(x * TILE_SIZE - scroll.x, y * TILE_SIZE - scroll.y);
                dest.blit(&sheet, src, p, sprite_transform(bits));
            }
        }

        dest.clip = old_clip;
    }
}

/// Layer sampled per pixel through an arbitrary affine transform.
#[derive(Clone, Debug)]
pub struct TransformedTileLayer(pub TileLayer);

impl Deref for TransformedTileLayer {
    type Target = TileLayer;
    fn deref(&self) -> &TileLayer { &self.0 }
}

impl DerefMut for TransformedTileLayer {
    fn deref_mut(&mut self) -> &mut TileLayer { &mut self.0 }
}

/// Per-scanline transform override, called with the screen row.
pub type ScanlineCallback<'a> = &'a mut dyn FnMut(i32) -> Mat3;

impl TransformedTileLayer {
    pub fn draw(&self, dest: &mut Surface, viewport: Rect, mut scanline_callback: Option<ScanlineCallback<'_>>) {
        let viewport = dest.clip.intersection(&viewport);
        if viewport.empty() {
            return;
        }
        for y in viewport.y..viewport.y + viewport.h {
            let m = match scanline_callback.as_mut() {
                Some(cb) => cb(y),
                None => self.transform,
            };
            let swc = transform_point(&m, Vec2::new(viewport.x as f32, y as f32));
            let ewc = transform_point(&m, Vec2::new((viewport.x + viewport.w) as f32, y as f32));
            self.texture_span(dest, Point::new(viewport.x, y), viewport.w as u32, swc, ewc);
        }
    }
}

// ── TiledMap ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub enum Layer {
    Simple(SimpleTileLayer),
    Transformed(TransformedTileLayer),
}

impl Layer {
    pub fn tile_layer(&self) -> &TileLayer {
        match self {
            Layer::Simple(l) => &l.0,
            Layer::Transformed(l) => &l.0,
        }
    }

    pub fn tile_layer_mut(&mut self) -> &mut TileLayer {
        match self {
            Layer::Simple(l) => &mut l.0,
            Layer::Transformed(l) => &mut l.0,
        }
    }
}

/// A stack of same-sized layers sharing one spritesheet.
#[derive(Clone, Debug, Default)]
pub struct TiledMap {
    pub layers: Vec<Layer>,
}

impl TiledMap {
    /// Empty map of `layers` zeroed layers.
    pub fn new(bounds: Size, layers: usize, sprites: Arc<Surface>, transformed: bool) -> Self {
        let layers = (0..layers)
            .map(|_| wrap_layer(TileLayer::new(bounds, Arc::clone(&sprites)), transformed))
            .collect();
        Self { layers }
    }

    /// Load every layer of an MTMX asset.
    pub fn load_tmx(
        bytes: &[u8],
        sprites: Arc<Surface>,
        repeat_mode: RepeatMode,
        transformed: bool,
    ) -> Result<Self, TileMapError> {
        let header = TmxHeader::parse(bytes)?;
        let mut layers = Vec::with_capacity(header.layers as usize);
        for i in 0..header.layers as usize {
            let mut layer = header.layer(bytes, Arc::clone(&sprites), i)?;
            layer.repeat_mode = repeat_mode;
            layers.push(wrap_layer(layer, transformed));
        }
        debug!(
            "[tilemap] loaded {}x{} map with {} layer(s)",
            header.width,
            header.height,
            layers.len()
        );
        Ok(Self { layers })
    }

    pub fn draw(&self, dest: &mut Surface, viewport: Rect) {
        for layer in &self.layers {
            match layer {
                Layer::Simple(l) => l.draw(dest, viewport),
                Layer::Transformed(l) => l.draw(dest, viewport, None),
            }
        }
    }

    /// Draw only the transformed layers, each row through `scanline_callback`.
    pub fn draw_with_callback(&self, dest: &mut Surface, viewport: Rect, scanline_callback: ScanlineCallback<'_>) {
        for layer in &self.layers {
            if let Layer::Transformed(l) = layer {
                l.draw(dest, viewport, Some(&mut *scanline_callback));
            }
        }
    }

    pub fn get_layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn get_layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }

    /// Bounds in tiles; all layers share them.
    pub fn get_bounds(&self) -> Size {
        self.layers.first().map(|l| l.tile_layer().bounds).unwrap_or_default()
    }

    pub fn set_scroll_position(&mut self, p: Point) {
        self.set_transform(mat3_translation(Vec2::from(p)));
    }

    pub fn set_layer_scroll_position(&mut self, layer: usize, p: Point) {
        self.set_layer_transform(layer, mat3_translation(Vec2::from(p)));
    }

    pub fn set_transform(&mut self, m: Mat3) {
        for layer in &mut self.layers {
            layer.tile_layer_mut().transform = m;
        }
    }

    pub fn set_layer_transform(&mut self, layer: usize, m: Mat3) {
        if let Some(l) = self.layers.get_mut(layer) {
            l.tile_layer_mut().transform = m;
        }
    }
}

fn wrap_layer(layer: TileLayer, transformed: bool) -> Layer {
    if transformed {
        Layer::Transformed(TransformedTileLayer(layer))
    } else {
        Layer::Simple(SimpleTileLayer(layer))
    }
}

// ── MTMX parsing ──────────────────────────────────────────────────────────────

struct TmxHeader {
    header_length: usize,
    flags: u16,
    empty_tile: u16,
    width: u16,
    height: u16,
    layers: u16,
}

impl TmxHeader {
    fn parse(bytes: &[u8]) -> Result<Self, TileMapError> {
        if bytes.len() < 4 || &bytes[0..4] != b"MTMX" {
            return Err(TileMapError::BadMagic);
        }
        let field = |i: usize| -> Result<u16, TileMapError> {
            let at = 4 + i * 2;
            bytes
                .get(at..at + 2)
                .map(|s| u16::from_le_bytes([s[0], s[1]]))
                .ok_or(TileMapError::Truncated)
        };
        let header = Self {
            header_length: field(0)? as usize,
            flags: field(1)?,
            empty_tile: field(2)?,
            width: field(3)?,
            height: field(4)?,
            layers: field(5)?,
        };
        if header.header_length < TMX_HEADER_LEN {
            return Err(TileMapError::Truncated);
        }
        if header.layers == 0 {
            return Err(TileMapError::NoLayers);
        }
        Ok(header)
    }

    fn layer(&self, bytes: &[u8], sprites: Arc<Surface>, index: usize) -> Result<TileLayer, TileMapError> {
        if index >= self.layers as usize {
            return Err(TileMapError::NoSuchLayer(index));
        }
        let layer_size = self.width as usize * self.height as usize;
        let wide = self.flags & TMX_16BIT != 0;
        let id_bytes = if wide { 2 } else { 1 };
        let data = bytes.get(self.header_length..).ok_or(TileMapError::Truncated)?;

        let start = layer_size * index * id_bytes;
        let raw = data.get(start..start + layer_size * id_bytes).ok_or(TileMapError::Truncated)?;
        let tiles = if wide {
            Tiles::U16(raw.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect())
        } else {
            Tiles::U8(raw.to_vec())
        };

        let transforms = if self.flags & TMX_TRANSFORMS != 0 {
            let base = layer_size * self.layers as usize * id_bytes + layer_size * index;
            let t = data.get(base..base + layer_size).ok_or(TileMapError::Truncated)?;
            Some(t.to_vec())
        } else {
            None
        };

        let bounds = Size::new(self.width as i32, self.height as i32);
        Ok(TileLayer {
            bounds,
            tiles,
            transforms,
            sprites,
            transform: Mat3::IDENTITY,
            repeat_mode: RepeatMode::None,
            default_tile_id: 0,
            empty_tile_id: Some(self.empty_tile),
            power_of_two: is_power_of_two(bounds),
        })
    }
}
