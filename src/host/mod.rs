// =============================================================================
// HOST — desktop window, presenter and audio output
//
// `EngineBuilder::run` opens a winit window, builds the wgpu `Presenter`,
// starts speaker output and then drives `Engine::frame` once per redraw.
// Keyboard keys map to console buttons through a `KeyMap`; dragging with the
// left mouse button moves the joystick, or tilts when Ctrl is held.
// =============================================================================

pub mod audio_out;
pub mod config;
pub mod keymap;
pub mod presenter;
pub mod scanline;
pub mod utils;
pub mod window;

use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::engine::{Engine, Game, ScreenMode};
use crate::fs::Filesystem;
use crate::types::{Vec2, Vec3};

pub use audio_out::{AudioOutput, MixerSource};
pub use config::{HostConfig, WindowConfig, WindowMode};
pub use keymap::KeyMap;
pub use presenter::Presenter;
pub use utils::{Viewport, letterbox_viewport, window_to_screen};
pub use window::apply_window_settings;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("cannot create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no formats")]
    NoSurfaceFormat,
    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error(transparent)]
    Window(#[from] winit::error::OsError),
    #[error("bad config: {0}")]
    Config(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("audio: {0}")]
    Audio(String),
}

// ── EngineBuilder ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct EngineBuilder {
    config: HostConfig,
    keymap: KeyMap,
    buffer_files: Vec<(String, Arc<[u8]>)>,
}

impl EngineBuilder {
    pub fn from_config(config: HostConfig) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn with_title(mut self, title: &str) -> Self { self.config.title = title.into(); self }
    pub fn with_scale(mut self, scale: u32) -> Self { self.config.scale = scale.max(1); self }
    pub fn with_screen_mode(mut self, mode: ScreenMode) -> Self { self.config.screen_mode = mode; self }
    pub fn with_window_mode(mut self, mode: WindowMode) -> Self { self.config.window_mode = mode; self }
    pub fn with_volume(mut self, volume: u16) -> Self { self.config.volume = volume; self }
    pub fn with_keymap(mut self, keymap: KeyMap) -> Self { self.keymap = keymap; self }

    pub fn with_data_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.data_dir = Some(dir.into());
        self
    }

    pub fn with_save_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.save_dir = Some(dir.into());
        self
    }

    /// Register a read-only in-memory file, e.g. an `include_bytes!` asset.
    pub fn with_buffer_file(mut self, path: &str, data: &[u8]) -> Self {
        self.buffer_files.push((path.to_string(), data.into()));
        self
    }

    /// CRT-style scanlines over the scaled screen. Off by default.
    pub fn retro_scan_lines(mut self) -> Self {
        self.config.scanlines = true;
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// The engine this builder would hand to the game, without a window.
    pub fn build_engine(&self) -> Engine {
        let base = self.config.data_dir.clone().unwrap_or_else(|| std::path::PathBuf::from("."));
        let mut fs = Filesystem::new(base);
        for (path, data) in &self.buffer_files {
            fs.add_buffer_file(path, data.clone());
        }
        let mut engine = Engine::new(self.config.screen_mode, fs);
        if let Some(dir) = &self.config.save_dir {
            engine.save_dir = dir.clone();
        }
        if let Ok(mut mixer) = engine.mixer.lock() {
            mixer.volume = self.config.volume;
        }
        engine
    }

    pub fn run(self, game: impl Game + 'static) -> Result<(), HostError> {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();

        let event_loop = EventLoop::new()?;
        let engine = self.build_engine();
        let mut app = App {
            config: self.config,
            keymap: self.keymap,
            game: Box::new(game),
            engine,
            presenter: None,
            audio: None,
            start: Instant::now(),
            modifiers: ModifiersState::empty(),
            dragging: false,
            error: None,
        };
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// ── App (winit ApplicationHandler) ────────────────────────────────────────────

struct App {
    config: HostConfig,
    keymap: KeyMap,
    game: Box<dyn Game>,
    engine: Engine,
    presenter: Option<Presenter>,
    audio: Option<AudioOutput>,
    start: Instant,
    modifiers: ModifiersState,
    dragging: bool,
    /// First fatal error; returned from `run` after the loop exits.
    error: Option<HostError>,
}

impl App {
    fn fail(&mut self, event_loop: &ActiveEventLoop, e: HostError) {
        error!("[host] {e}");
        self.error.get_or_insert(e);
        event_loop.exit();
    }

    fn create_presenter(&self, event_loop: &ActiveEventLoop) -> Result<Presenter, HostError> {
        let wc = self.config.window_config();
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title(&self.config.title)
                    .with_inner_size(winit::dpi::PhysicalSize::new(wc.physical_width, wc.physical_height))
                    .with_resizable(true),
            )?,
        );
        if wc.mode != WindowMode::Windowed {
            apply_window_settings(&window, &wc);
        }
        info!("[host] window {}x{} ({:?})", wc.physical_width, wc.physical_height, wc.mode);
        pollster::block_on(Presenter::new(window, self.engine.screen.bounds, self.config.scanlines))
    }

    /// Mouse position as an offset from the screen centre, each axis -1..1.
    fn pointer_offset(&self, x: f32, y: f32) -> Option<Vec2> {
        let presenter = self.presenter.as_ref()?;
        let wc = presenter.screen_window_config();
        let (sx, sy) = window_to_screen(&wc, &presenter.viewport(), x, y)?;
        let half = Vec2::new(wc.logical_width as f32, wc.logical_height as f32) / 2.0;
        Some((Vec2::new(sx, sy) - half) / half)
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.start.elapsed().as_millis() as u32;
        self.engine.frame(now, self.game.as_mut());
        if self.engine.quit_requested() {
            event_loop.exit();
            return;
        }

        let Some(presenter) = self.presenter.as_mut() else { return };
        match presenter.present(&self.engine.screen) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = presenter.window.inner_size();
                presenter.resize(size);
            }
            Err(e) => warn!("[host] present failed: {e}"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.presenter.is_some() {
            return;
        }
        match self.create_presenter(event_loop) {
            Ok(p) => self.presenter = Some(p),
            Err(e) => return self.fail(event_loop, e),
        }
        self.audio = AudioOutput::try_start(Arc::clone(&self.engine.mixer));
        self.game.init(&mut self.engine);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(p) = self.presenter.as_ref() {
            p.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(p) = self.presenter.as_mut() {
                    p.resize(size);
                }
            }

            WindowEvent::Focused(focused) => {
                if let Some(audio) = self.audio.as_ref() {
                    audio.set_paused(!focused);
                }
            }

            WindowEvent::ModifiersChanged(m) => self.modifiers = m.state(),

            WindowEvent::KeyboardInput {
                event: KeyEvent { physical_key: PhysicalKey::Code(code), state, .. },
                ..
            } => {
                if let Some(button) = self.keymap.button_for(code) {
                    self.engine.input.set_button(button, state == ElementState::Pressed);
                }
            }

            WindowEvent::MouseInput { button: MouseButton::Left, state, .. } => {
                self.dragging = state == ElementState::Pressed;
                if !self.dragging {
                    self.engine.input.set_joystick(Vec2::ZERO);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                if !self.dragging {
                    return;
                }
                let Some(offset) = self.pointer_offset(position.x as f32, position.y as f32) else { return };
                if self.modifiers.control_key() {
                    self.engine.input.tilt = Vec3::new(offset.x, offset.y, 1.0).normalize();
                } else {
                    self.engine.input.set_joystick(offset);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
