use winit::dpi::PhysicalSize;
use winit::window::{Fullscreen, Window};

use super::config::{WindowConfig, WindowMode};

/// Apply `config` to `window`.
///
/// `Fullscreen` picks the current monitor's video mode closest in area to the
/// configured physical size and falls back to borderless when the monitor is
/// unknown or reports no modes.
pub fn apply_window_settings(window: &Window, config: &WindowConfig) {
    match config.mode {
        WindowMode::Windowed => {
            window.set_fullscreen(None);
            window.set_decorations(true);
            // the resize handler reconciles the final size
            let _ = window.request_inner_size(PhysicalSize::new(config.physical_width, config.physical_height));
        }

        WindowMode::Fullscreen => {
            let fullscreen = match window.current_monitor() {
                Some(monitor) => {
                    let target_area = config.physical_width as u64 * config.physical_height as u64;
                    let best = monitor.video_modes().min_by_key(|vm| {
                        let s = vm.size();
                        (s.width as u64 * s.height as u64).abs_diff(target_area)
                    });
                    match best {
                        Some(vm) => Fullscreen::Exclusive(vm),
                        None => Fullscreen::Borderless(Some(monitor)),
                    }
                }
                None => Fullscreen::Borderless(None),
            };
            window.set_fullscreen(Some(fullscreen));
        }

        WindowMode::Borderless => {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }
    }
}
