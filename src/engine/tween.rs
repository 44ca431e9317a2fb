// =============================================================================
// TWEEN.RS — time-based value interpolation
//
// Times are milliseconds since engine start. The engine owns every tween in a
// `Tweens` registry and updates running ones before each game update.
// =============================================================================

use std::f32::consts::PI;

/// `f(elapsed, from, to, duration) -> value`
pub type TweenFunction = fn(u32, f32, f32, u32) -> f32;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TweenState {
    #[default]
    Uninitialised,
    Stopped,
    Running,
    Paused,
    Finished,
}

#[derive(Clone, Debug)]
pub struct Tween {
    pub function: TweenFunction,
    pub from: f32,
    pub to: f32,
    pub duration: u32,
    /// Completed passes before finishing; `-1` repeats forever.
    pub loops: i32,
    pub value: f32,
    pub loop_count: i32,
    pub started: u32,
    pub paused_at: u32,
    pub state: TweenState,
}

impl Default for Tween {
    fn default() -> Self {
        Self {
            function: tween_linear,
            from: 0.0,
            to: 1.0,
            duration: 1000,
            loops: -1,
            value: 0.0,
            loop_count: 0,
            started: 0,
            paused_at: 0,
            state: TweenState::Uninitialised,
        }
    }
}

impl Tween {
    pub fn new(function: TweenFunction, from: f32, to: f32, duration: u32, loops: i32) -> Self {
        let mut t = Self::default();
        t.init(function, from, to, duration, loops);
        t
    }

    pub fn init(&mut self, function: TweenFunction, from: f32, to: f32, duration: u32, loops: i32) {
        self.function = function;
        self.from = from;
        self.to = to;
        self.duration = duration.max(1);
        self.loops = loops;
        self.loop_count = 0;
        self.value = from;
        self.state = TweenState::Stopped;
    }

    /// Start from the beginning, or resume where a pause left off.
    pub fn start(&mut self, now: u32) {
        if self.state == TweenState::Paused {
            self.started = now.wrapping_sub(self.paused_at.wrapping_sub(self.started));
        } else {
            self.started = now;
            self.loop_count = 0;
            self.value = self.from;
        }
        self.state = TweenState::Running;
    }

    pub fn pause(&mut self, now: u32) {
        if self.state == TweenState::Running {
            self.paused_at = now;
            self.state = TweenState::Paused;
        }
    }

    /// Stop from any initialised state; the next `start` begins again.
    pub fn stop(&mut self) {
        if self.state != TweenState::Uninitialised {
            self.state = TweenState::Stopped;
        }
    }

    pub fn update(&mut self, now: u32) {
        if self.state != TweenState::Running {
            return;
        }
        let elapsed = now.wrapping_sub(self.started);
        self.value = (self.function)(elapsed, self.from, self.to, self.duration);

        if elapsed >= self.duration {
            self.started = now;
            self.loop_count += 1;
            if self.loops >= 0 && self.loop_count >= self.loops {
                self.state = TweenState::Finished;
                self.value = self.to;
            }
        }
    }

    pub fn is_running(&self) -> bool { self.state == TweenState::Running }
    pub fn is_paused(&self) -> bool { self.state == TweenState::Paused }
    pub fn is_stopped(&self) -> bool { self.state == TweenState::Stopped }
    pub fn is_finished(&self) -> bool { self.state == TweenState::Finished }
}

// ── Easing functions ──────────────────────────────────────────────────────────

/// Full cosine cycle: starts at `c`, dips to `b` half way, returns to `c`.
pub fn tween_sine(t: u32, b: f32, c: f32, d: u32) -> f32 {
    b + ((t as f32 / d as f32 * PI * 2.0 + PI / 2.0).sin() + 1.0) / 2.0 * (c - b)
}

pub fn tween_linear(t: u32, b: f32, c: f32, d: u32) -> f32 {
    (c - b) * t as f32 / d as f32 + b
}

pub fn tween_ease_in_quad(t: u32, b: f32, c: f32, d: u32) -> f32 {
    let ft = t as f32 / d as f32;
    -(c - b) * ft * (ft - 2.0) + b
}

pub fn tween_ease_out_quad(t: u32, b: f32, c: f32, d: u32) -> f32 {
    let ft = t as f32 / d as f32;
    (c - b) * ft * ft + b
}

pub fn tween_ease_in_out_quad(t: u32, b: f32, c: f32, d: u32) -> f32 {
    let mut ft = t as f32 / (d as f32 / 2.0);
    if ft < 1.0 {
        return (c - b) / 2.0 * ft * ft + b;
    }
    ft -= 1.0;
    -(c - b) / 2.0 * (ft * (ft - 2.0) - 1.0) + b
}

/// Ease-out bounce.
pub fn tween_bounce(t: u32, b: f32, c: f32, d: u32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    let mut x = t as f32 / d as f32;
    let k = if x < 1.0 / D {
        N * x * x
    } else if x < 2.0 / D {
        x -= 1.5 / D;
        N * x * x + 0.75
    } else if x < 2.5 / D {
        x -= 2.25 / D;
        N * x * x + 0.9375
    } else {
        x -= 2.625 / D;
        N * x * x + 0.984375
    };
    (c - b) * k + b
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TweenId(usize);

#[derive(Debug, Default)]
pub struct Tweens {
    slots: Vec<Option<Tween>>,
}

impl Tweens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tween: Tween) -> TweenId {
        if let Some(i) = self.slots.iter().position(Option::is_none) {
            self.slots[i] = Some(tween);
            return TweenId(i);
        }
        self.slots.push(Some(tween));
        TweenId(self.slots.len() - 1)
    }

    pub fn get(&self, id: TweenId) -> Option<&Tween> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: TweenId) -> Option<&mut Tween> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: TweenId) -> Option<Tween> {
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    /// Current value of a tween, or 0 for unknown ids.
    pub fn value(&self, id: TweenId) -> f32 {
        self.get(id).map(|t| t.value).unwrap_or(0.0)
    }

    pub fn update_all(&mut self, now: u32) {
        for t in self.slots.iter_mut().flatten() {
            t.update(now);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
