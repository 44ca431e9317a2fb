// =============================================================================
// INPUT.RS — console button state, joystick and tilt
//
// Hosts write the raw button mask; the engine latches it once per update tick
// so `pressed`/`released` are edges between consecutive updates.
// =============================================================================

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use crate::types::{Vec2, Vec3};

/// Bit mask of console buttons.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Button(pub u32);

impl Button {
    pub const NONE: Self = Self(0);
    pub const DPAD_LEFT: Self = Self(1);
    pub const DPAD_RIGHT: Self = Self(2);
    pub const DPAD_UP: Self = Self(4);
    pub const DPAD_DOWN: Self = Self(8);
    pub const A: Self = Self(16);
    pub const B: Self = Self(32);
    pub const X: Self = Self(64);
    pub const Y: Self = Self(128);
    pub const HOME: Self = Self(256);
    pub const MENU: Self = Self(512);
    pub const JOYSTICK: Self = Self(1024);

    pub fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Button {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl BitOrAssign for Button {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

impl BitAnd for Button {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self { Self(self.0 & rhs.0) }
}

impl BitAndAssign for Button {
    fn bitand_assign(&mut self, rhs: Self) { self.0 &= rhs.0; }
}

impl Not for Button {
    type Output = Self;
    fn not(self) -> Self { Self(!self.0) }
}

/// Held buttons plus the edges since the previous update.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub state: Button,
    pub pressed: Button,
    pub released: Button,
}

impl ButtonState {
    pub fn update(&mut self, new_state: Button) {
        self.pressed = new_state & !self.state;
        self.released = self.state & !new_state;
        self.state = new_state;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Input {
    pub buttons: ButtonState,
    /// Mask the host is currently reporting; latched into `buttons` per tick.
    pub raw: Button,
    /// Analog stick, each axis in `-1.0..=1.0`.
    pub joystick: Vec2,
    pub tilt: Vec3,
}

impl Input {
    pub fn new() -> Self {
        Self { tilt: Vec3::new(0.0, 0.0, 1.0), ..Self::default() }
    }

    pub fn set_button(&mut self, button: Button, down: bool) {
        if down {
            self.raw |= button;
        } else {
            self.raw &= !button;
        }
    }

    pub fn set_joystick(&mut self, v: Vec2) {
        self.joystick = v.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    }

    /// Called once per update tick.
    pub fn latch(&mut self) {
        let raw = self.raw;
        self.buttons.update(raw);
    }

    pub fn held(&self, b: Button) -> bool { self.buttons.state.contains(b) }
    pub fn pressed(&self, b: Button) -> bool { self.buttons.pressed.contains(b) }
    pub fn released(&self, b: Button) -> bool { self.buttons.released.contains(b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_computed_from_previous_state() {
        let mut s = ButtonState::default();
        s.update(Button::A | Button::DPAD_UP);
        assert_eq!(s.pressed, Button::A | Button::DPAD_UP);
        s.update(Button::A);
        assert_eq!(s.pressed, Button::NONE);
        assert_eq!(s.released, Button::DPAD_UP);
    }

    #[test]
    fn latch_only_sees_changes_once() {
        let mut input = Input::new();
        input.set_button(Button::B, true);
        input.latch();
        assert!(input.pressed(Button::B));
        input.latch();
        assert!(!input.pressed(Button::B));
        assert!(input.held(Button::B));
        input.set_button(Button::B, false);
        input.latch();
        assert!(input.released(Button::B));
    }

    #[test]
    fn joystick_is_clamped() {
        let mut input = Input::new();
        input.set_joystick(Vec2::new(3.0, -0.5));
        assert_eq!(input.joystick, Vec2::new(1.0, -0.5));
    }
}
