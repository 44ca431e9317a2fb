// =============================================================================
// ENGINE — the context handed to games
//
// `Engine` owns the screen surface, input, timers, tweens, the audio mixer and
// the filesystem. The host drives it through `tick`, which runs `Game::update`
// at a fixed 10 ms rate and catches up after slow frames, then asks the game
// to render into `engine.screen`.
// =============================================================================

pub mod api;
pub mod input;
pub mod particle;
pub mod profiler;
pub mod running_average;
pub mod timer;
pub mod tween;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytemuck::Pod;
use log::{info, trace};

use crate::audio::Mixer;
use crate::fs::{self, Filesystem, FsError};
use crate::graphics::{Pen, Surface};

pub use api::{BlitDevice, CanLaunchResult, ScreenMode, TypeHandlers, can_launch};
pub use input::{Button, ButtonState, Input};
pub use particle::{Particle, ParticleGenerator};
pub use profiler::{Clock, GraphElement, InstantClock, Metrics, ProbeId, Profiler, ProfilerProbe, ScopedProfilerProbe};
pub use running_average::RunningAverage;
pub use timer::{Timer, TimerId, TimerInfo, TimerState, Timers};
pub use tween::{Tween, TweenFunction, TweenId, TweenState, Tweens};

/// Milliseconds between fixed updates.
pub const UPDATE_RATE_MS: u32 = 10;

/// Longest stretch of missed updates replayed after a stall.
const MAX_CATCH_UP_MS: u32 = 250;

// ── Game trait ────────────────────────────────────────────────────────────────

pub trait Game {
    fn init(&mut self, _engine: &mut Engine) {}
    /// Fixed-rate logic. `time_ms` is the timestamp this update stands for.
    fn update(&mut self, engine: &mut Engine, time_ms: u32);
    fn render(&mut self, engine: &mut Engine, time_ms: u32);
}

// ── Engine ────────────────────────────────────────────────────────────────────

pub struct Engine {
    pub screen: Surface,
    screen_mode: ScreenMode,
    screen_palette: Option<Vec<Pen>>,
    pub input: Input,
    pub timers: Timers,
    pub tweens: Tweens,
    /// Shared with the host's audio thread.
    pub mixer: Arc<Mutex<Mixer>>,
    pub fs: Filesystem,
    pub save_dir: PathBuf,
    pub profiler: Profiler,
    pub type_handlers: TypeHandlers,
    pub device: BlitDevice,
    start: Instant,
    last_tick_ms: Option<u32>,
    pending_update_ms: u32,
    rng_state: u32,
    quit_requested: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("screen_mode", &self.screen_mode)
            .field("save_dir", &self.save_dir)
            .field("timers", &self.timers.len())
            .field("tweens", &self.tweens.len())
            .finish()
    }
}

impl Engine {
    pub fn new(mode: ScreenMode, fs: Filesystem) -> Self {
        let save_dir = fs.base_path().to_path_buf();
        Self {
            screen: Surface::new(mode.format(), mode.size()),
            screen_mode: mode,
            screen_palette: None,
            input: Input::new(),
            timers: Timers::new(),
            tweens: Tweens::new(),
            mixer: Arc::new(Mutex::new(Mixer::new())),
            fs,
            save_dir,
            profiler: Profiler::default(),
            type_handlers: TypeHandlers::default(),
            device: BlitDevice::Host,
            start: Instant::now(),
            last_tick_ms: None,
            pending_update_ms: 0,
            rng_state: 0x9e37_79b9,
            quit_requested: false,
        }
    }

    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    /// Milliseconds since the engine was created.
    pub fn now(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    pub fn now_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Next value from the engine's xorshift generator.
    pub fn random(&mut self) -> u32 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng_state = x;
        x
    }

    pub fn seed_random(&mut self, seed: u32) {
        self.rng_state = seed.max(1);
    }

    // ── Screen ─────────────────────────────────────────────────────────────

    pub fn screen_mode(&self) -> ScreenMode {
        self.screen_mode
    }

    /// Replace the screen with a fresh surface for `mode`.
    pub fn set_screen_mode(&mut self, mode: ScreenMode) {
        let mut screen = Surface::new(mode.format(), mode.size());
        if let Some(palette) = &self.screen_palette {
            screen.set_palette(palette);
        }
        self.screen = screen;
        self.screen_mode = mode;
        info!("[engine] screen mode {:?} ({}x{})", mode, mode.size().w, mode.size().h);
    }

    /// Palette for paletted screen modes, kept across mode changes.
    pub fn set_screen_palette(&mut self, colours: &[Pen]) {
        self.screen.set_palette(colours);
        self.screen_palette = Some(colours.to_vec());
    }

    // ── Saves ──────────────────────────────────────────────────────────────

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn read_save<T: Pod>(&self, slot: u32) -> Option<T> {
        fs::read_save(&self.save_dir, slot)
    }

    pub fn write_save<T: Pod>(&self, slot: u32, value: &T) -> Result<(), FsError> {
        fs::write_save(&self.save_dir, slot, value)
    }

    pub fn can_launch(&self, path: &str) -> CanLaunchResult {
        can_launch(&self.fs, path, self.device, &self.type_handlers)
    }

    pub fn register_type_handler(&mut self, extension: &str) {
        self.type_handlers.register_type_handler(extension);
    }

    // ── Loop ───────────────────────────────────────────────────────────────

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Advance to `time_ms`: update timers and tweens, then run every fixed
    /// update that has come due. Returns whether any update ran.
    pub fn tick(&mut self, time_ms: u32, game: &mut dyn Game) -> bool {
        let last = *self.last_tick_ms.get_or_insert(time_ms);

        self.timers.update_all(time_ms);
        self.tweens.update_all(time_ms);

        self.pending_update_ms = (self.pending_update_ms + time_ms.wrapping_sub(last)).min(MAX_CATCH_UP_MS);
        let mut updated = false;
        while self.pending_update_ms >= UPDATE_RATE_MS {
            let stamp = time_ms.wrapping_sub(self.pending_update_ms);
            self.input.latch();
            game.update(self, stamp);
            self.pending_update_ms -= UPDATE_RATE_MS;
            updated = true;
        }
        if updated {
            trace!("[engine] tick {time_ms}");
        }

        self.last_tick_ms = Some(time_ms);
        updated
    }

    /// `tick` followed by a render of the current frame.
    pub fn frame(&mut self, time_ms: u32, game: &mut dyn Game) -> bool {
        let updated = self.tick(time_ms, game);
        game.render(self, time_ms);
        updated
    }
}
