#![cfg(feature = "host")]
/// Window sizing, letterboxing and host configuration.
///
/// Everything here is plain math or serde, so no window or GPU is created.
use blitkit::engine::{Button, ScreenMode};
use blitkit::host::*;
use winit::keyboard::KeyCode;

fn cfg(pw: u32, ph: u32, lw: u32, lh: u32) -> WindowConfig {
    WindowConfig {
        physical_width: pw, physical_height: ph,
        logical_width: lw, logical_height: lh,
        mode: WindowMode::Windowed,
    }
}

// ── WindowConfig ──────────────────────────────────────────────────────────────

#[test]
fn default_is_lores_at_4x() {
    let cfg = WindowConfig::default();
    assert_eq!(cfg.physical_width,  640);
    assert_eq!(cfg.physical_height, 480);
    assert_eq!(cfg.logical_width,   160);
    assert_eq!(cfg.logical_height,  120);
    assert_eq!(cfg.mode, WindowMode::Windowed);
}

#[test]
fn aspect_ratio_4x3() {
    let ratio = WindowConfig::default().aspect_ratio();
    assert!((ratio - 4.0 / 3.0).abs() < 1e-5, "expected 4/3, got {ratio}");
}

#[test]
fn aspect_ratio_zero_height_returns_zero() {
    assert_eq!(cfg(0, 0, 160, 0).aspect_ratio(), 0.0);
}

// ── Letterbox ─────────────────────────────────────────────────────────────────

/// Exact multiple: the viewport fills the window.
#[test]
fn letterbox_exact_fit() {
    let vp = letterbox_viewport(&cfg(640, 480, 160, 120), false);
    assert_eq!(vp, Viewport { x: 0.0, y: 0.0, width: 640.0, height: 480.0 });
}

/// Wider window: bars left and right.
#[test]
fn letterbox_pillarbox() {
    let vp = letterbox_viewport(&cfg(800, 480, 160, 120), false);
    assert_eq!(vp.width, 640.0);
    assert_eq!(vp.height, 480.0);
    assert_eq!(vp.x, 80.0);
    assert_eq!(vp.y, 0.0);
}

/// Taller window: bars top and bottom.
#[test]
fn letterbox_letterbox() {
    let vp = letterbox_viewport(&cfg(640, 600, 160, 120), false);
    assert_eq!(vp.width, 640.0);
    assert_eq!(vp.height, 480.0);
    assert_eq!(vp.y, 60.0);
}

/// Integer scaling floors 4.5x down to 4x and centres the result.
#[test]
fn letterbox_integer_scale_floors() {
    let vp = letterbox_viewport(&cfg(720, 540, 160, 120), true);
    assert_eq!(vp.width, 640.0);
    assert_eq!(vp.height, 480.0);
    assert_eq!(vp.x, 40.0);
    assert_eq!(vp.y, 30.0);

    let smooth = letterbox_viewport(&cfg(720, 540, 160, 120), false);
    assert_eq!(smooth.width, 720.0);
}

/// Below 1x there is no whole scale, so the fractional one is kept.
#[test]
fn letterbox_integer_keeps_fraction_below_one() {
    let vp = letterbox_viewport(&cfg(80, 60, 160, 120), true);
    assert_eq!(vp.width, 80.0);
    assert_eq!(vp.height, 60.0);
}

#[test]
fn letterbox_zero_logical_is_zero() {
    assert_eq!(letterbox_viewport(&cfg(640, 480, 0, 0), false), Viewport::ZERO);
}

// ── window_to_screen ──────────────────────────────────────────────────────────

#[test]
fn window_to_screen_maps_inside_viewport() {
    let c = cfg(800, 480, 160, 120);
    let vp = letterbox_viewport(&c, false);
    assert_eq!(window_to_screen(&c, &vp, 80.0, 0.0), Some((0.0, 0.0)));
    assert_eq!(window_to_screen(&c, &vp, 400.0, 240.0), Some((80.0, 60.0)));
}

#[test]
fn window_to_screen_rejects_bars() {
    let c = cfg(800, 480, 160, 120);
    let vp = letterbox_viewport(&c, false);
    assert_eq!(window_to_screen(&c, &vp, 10.0, 100.0), None);
    assert_eq!(window_to_screen(&c, &vp, 790.0, 100.0), None);
}

// ── HostConfig ────────────────────────────────────────────────────────────────

#[test]
fn host_config_defaults_fill_missing_fields() {
    let c = HostConfig::from_json(r#"{ "title": "pong", "scanlines": true }"#).unwrap();
    assert_eq!(c.title, "pong");
    assert!(c.scanlines);
    assert_eq!(c.scale, 4);
    assert_eq!(c.screen_mode, ScreenMode::Lores);
    assert_eq!(c.volume, 0xffff);
}

#[test]
fn host_config_reads_enums_in_snake_case() {
    let c = HostConfig::from_json(r#"{ "screen_mode": "hires", "window_mode": "borderless" }"#).unwrap();
    assert_eq!(c.screen_mode, ScreenMode::Hires);
    assert_eq!(c.window_mode, WindowMode::Borderless);
}

#[test]
fn host_config_rejects_bad_json() {
    assert!(matches!(HostConfig::from_json("{ nope"), Err(HostError::Config(_))));
}

/// Hires halves the scale so both modes open the same window.
#[test]
fn host_config_window_size_matches_across_modes() {
    let lores = HostConfig::default().window_config();
    let hires = HostConfig { screen_mode: ScreenMode::Hires, ..HostConfig::default() }.window_config();
    assert_eq!((lores.physical_width, lores.physical_height), (640, 480));
    assert_eq!((hires.physical_width, hires.physical_height), (640, 480));
    assert_eq!((hires.logical_width, hires.logical_height), (320, 240));
}

// ── KeyMap / EngineBuilder ────────────────────────────────────────────────────

#[test]
fn keymap_rebinds_keys() {
    let mut map = KeyMap::default();
    assert_eq!(map.button_for(KeyCode::KeyZ), Some(Button::A));
    map.bind(KeyCode::Space, Button::B);
    map.unbind(KeyCode::KeyZ);
    assert_eq!(map.button_for(KeyCode::Space), Some(Button::B));
    assert_eq!(map.button_for(KeyCode::KeyZ), None);
}

#[test]
fn builder_engine_uses_config() {
    let builder = EngineBuilder::default()
        .with_screen_mode(ScreenMode::Hires)
        .with_volume(0x8000)
        .with_save_dir("/tmp/blitkit-builder-test")
        .with_buffer_file("/boot.txt", b"hello");
    let engine = builder.build_engine();

    assert_eq!(engine.screen_mode(), ScreenMode::Hires);
    assert_eq!((engine.screen.bounds.w, engine.screen.bounds.h), (320, 240));
    assert_eq!(engine.mixer.lock().unwrap().volume, 0x8000);
    assert_eq!(engine.save_dir(), std::path::Path::new("/tmp/blitkit-builder-test"));
    assert!(engine.fs.file_exists("/boot.txt"));
}
