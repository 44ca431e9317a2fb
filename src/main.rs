// Small tour of the SDK: a particle fountain, a tweened title, a movable
// cursor, a synth blip on A and the profiler overlay on Y. Home quits.
use blitkit::engine::tween::tween_sine;
use blitkit::engine::{Button, Engine, Game, Particle, ParticleGenerator, ProbeId, ScreenMode, Tween, TweenId};
use blitkit::audio::Waveform;
use blitkit::graphics::{MINIMAL_FONT, OUTLINE_FONT, Pen, TextAlign};
use blitkit::host::{EngineBuilder, HostConfig, HostError};
use blitkit::types::{Point, Rect, Vec2};

// ── Palette ─────────────────────────────────────────────────────────────────
const SKY:    Pen = Pen::rgb(20, 30, 60);
const GROUND: Pen = Pen::rgb(40, 90, 50);
const TITLE:  Pen = Pen::rgb(255, 240, 80);
const CURSOR: Pen = Pen::rgb(240, 80, 60);
const SPRAY:  Pen = Pen::rgb(120, 200, 255);

struct Demo {
    cursor: Vec2,
    bob: Option<TweenId>,
    fountain: ParticleGenerator,
    blips: u32,
    show_profiler: bool,
    update_probe: Option<ProbeId>,
    render_probe: Option<ProbeId>,
}

impl Demo {
    fn new() -> Self {
        let mut seed = 0x1234_5678u32;
        let mut rand = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % 1000) as f32 / 1000.0
        };
        let fountain = ParticleGenerator::new(120, 2000, move || {
            let vx = (rand() - 0.5) * 40.0;
            let vy = -60.0 - rand() * 30.0;
            Particle::new(Vec2::new(80.0, 100.0), Vec2::new(vx, vy))
        })
        .with_force(Vec2::new(0.0, 50.0));

        Self {
            cursor: Vec2::new(80.0, 60.0),
            bob: None,
            fountain,
            blips: 0,
            show_profiler: false,
            update_probe: None,
            render_probe: None,
        }
    }

    fn blip(&mut self, engine: &mut Engine) {
        let Ok(mut mixer) = engine.mixer.lock() else { return };
        if let Some(ch) = mixer.channel(0) {
            ch.waveforms = Waveform::SQUARE | Waveform::TRIANGLE;
            ch.frequency = 440 + (self.blips % 8) as u16 * 55;
            ch.attack_ms = 5;
            ch.decay_ms = 80;
            ch.sustain = 0;
            ch.release_ms = 20;
            ch.trigger_attack();
        }
        self.blips += 1;
    }
}

impl Game for Demo {
    fn init(&mut self, engine: &mut Engine) {
        let mut bob = Tween::new(tween_sine, -3.0, 3.0, 1200, -1);
        bob.start(engine.now());
        self.bob = Some(engine.tweens.add(bob));

        self.update_probe = Some(engine.profiler.add_probe("update"));
        self.render_probe = Some(engine.profiler.add_probe("render"));

        self.blips = engine.read_save::<u32>(0).unwrap_or(0);
    }

    fn update(&mut self, engine: &mut Engine, time_ms: u32) {
        if let Some(id) = self.update_probe {
            engine.profiler.start(id);
        }

        let input = &engine.input;
        let mut dir = input.joystick;
        if input.held(Button::DPAD_LEFT) { dir.x -= 1.0; }
        if input.held(Button::DPAD_RIGHT) { dir.x += 1.0; }
        if input.held(Button::DPAD_UP) { dir.y -= 1.0; }
        if input.held(Button::DPAD_DOWN) { dir.y += 1.0; }
        self.cursor = (self.cursor + dir).clamp(Vec2::ZERO, Vec2::new(159.0, 119.0));

        if engine.input.pressed(Button::A) {
            self.blip(engine);
        }
        if engine.input.pressed(Button::Y) {
            self.show_profiler = !self.show_profiler;
            engine.profiler.set_page(self.show_profiler as usize);
        }
        if engine.input.pressed(Button::HOME) {
            if let Err(e) = engine.write_save(0, &self.blips) {
                log::warn!("[demo] could not save: {e}");
            }
            engine.request_quit();
        }

        self.fountain.update(time_ms);

        if let Some(id) = self.update_probe {
            engine.profiler.store_elapsed_us(id, false);
        }
    }

    fn render(&mut self, engine: &mut Engine, _time_ms: u32) {
        if let Some(id) = self.render_probe {
            engine.profiler.start(id);
        }
        let bob = self.bob.map(|id| engine.tweens.value(id)).unwrap_or(0.0);
        let screen = &mut engine.screen;

        screen.set_pen(SKY);
        screen.clear();
        screen.set_pen(GROUND);
        screen.rectangle(Rect::new(0, 100, 160, 20));

        screen.set_pen(SPRAY);
        for p in &self.fountain.particles {
            screen.alpha = (255.0 * (1.0 - p.age).clamp(0.0, 1.0)) as u8;
            screen.pixel(Point::new(p.pos.x as i32, p.pos.y as i32));
        }
        screen.alpha = 255;

        screen.set_pen(TITLE);
        screen.text(
            "blitkit",
            &OUTLINE_FONT,
            Rect::new(0, 8 + bob as i32, 160, 0),
            false,
            TextAlign::TOP_CENTER,
            false,
        );
        screen.set_pen(Pen::WHITE);
        screen.text_at(&format!("blips: {}", self.blips), &MINIMAL_FONT, Point::new(2, 110));

        screen.set_pen(CURSOR);
        let c = Point::new(self.cursor.x as i32, self.cursor.y as i32);
        screen.circle(c, 3);

        if let Some(id) = self.render_probe {
            engine.profiler.store_elapsed_us(id, false);
        }
        if self.show_profiler {
            engine.profiler.display_overlay(&mut engine.screen);
        }
    }
}

fn main() -> Result<(), HostError> {
    let builder = match std::env::args().nth(1) {
        Some(path) => EngineBuilder::from_config(HostConfig::load(path)?),
        None => EngineBuilder::default()
            .with_title("blitkit demo")
            .with_screen_mode(ScreenMode::Lores)
            .with_save_dir(std::env::temp_dir().join("blitkit-demo")),
    };
    builder.run(Demo::new())
}
