// =============================================================================
// TIMER.RS — repeating callbacks driven by engine time
// =============================================================================

use std::fmt;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
    Paused,
    Finished,
}

/// What a timer callback can see and change about its timer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TimerInfo {
    pub loop_count: i32,
    pub loops: i32,
    /// Set by the callback to stop the timer after this call.
    pub stop: bool,
}

pub type TimerCallback = Box<dyn FnMut(&mut TimerInfo) + Send>;

pub struct Timer {
    callback: TimerCallback,
    pub duration: u32,
    /// Number of firings before finishing; `-1` fires forever.
    pub loops: i32,
    pub loop_count: i32,
    pub started: u32,
    pub paused_at: u32,
    pub state: TimerState,
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("duration", &self.duration)
            .field("loops", &self.loops)
            .field("loop_count", &self.loop_count)
            .field("state", &self.state)
            .finish()
    }
}

impl Timer {
    pub fn new(duration: u32, loops: i32, callback: impl FnMut(&mut TimerInfo) + Send + 'static) -> Self {
        Self {
            callback: Box::new(callback),
            duration,
            loops,
            loop_count: 0,
            started: 0,
            paused_at: 0,
            state: TimerState::Stopped,
        }
    }

    pub fn start(&mut self, now: u32) {
        if self.state == TimerState::Paused {
            self.started = now.wrapping_sub(self.paused_at.wrapping_sub(self.started));
        } else {
            self.started = now;
            self.loop_count = 0;
        }
        self.state = TimerState::Running;
    }

    pub fn pause(&mut self, now: u32) {
        if self.state == TimerState::Running {
            self.paused_at = now;
            self.state = TimerState::Paused;
        }
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    pub fn update(&mut self, now: u32) {
        if self.state != TimerState::Running || now.wrapping_sub(self.started) < self.duration {
            return;
        }

        let mut info = TimerInfo { loop_count: self.loop_count, loops: self.loops, stop: false };
        (self.callback)(&mut info);
        self.loop_count += 1;

        if info.stop {
            self.state = TimerState::Stopped;
        } else if self.loops >= 0 && self.loop_count >= self.loops {
            self.state = TimerState::Finished;
        } else {
            self.started = now;
        }
    }

    pub fn is_running(&self) -> bool { self.state == TimerState::Running }
    pub fn is_paused(&self) -> bool { self.state == TimerState::Paused }
    pub fn is_stopped(&self) -> bool { self.state == TimerState::Stopped }
    pub fn is_finished(&self) -> bool { self.state == TimerState::Finished }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(usize);

#[derive(Debug, Default)]
pub struct Timers {
    slots: Vec<Option<Timer>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, timer: Timer) -> TimerId {
        if let Some(i) = self.slots.iter().position(Option::is_none) {
            self.slots[i] = Some(timer);
            return TimerId(i);
        }
        self.slots.push(Some(timer));
        TimerId(self.slots.len() - 1)
    }

    pub fn get(&self, id: TimerId) -> Option<&Timer> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: TimerId) -> Option<&mut Timer> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: TimerId) -> Option<Timer> {
        self.slots.get_mut(id.0).and_then(Option::take)
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
