//! Per-frame player intent and the key-binding layer that produces it.
//!
//! A [`Usercmd`] captures one tick of input: cursor position, a one-shot
//! action, and the latched button/modifier state. Bindings map an external
//! key id to exactly one action, button, or modifier:
//!
//! - **Actions** fire on key-down and enqueue a full command snapshot into a
//!   bounded queue (overflow drops the new event).
//! - **Buttons** and **modifiers** are latched: set on key-down, cleared on
//!   key-up.
//!
//! [`UsercmdGen::generate`] drains the queue FIFO; when it is empty it
//! synthesizes a command from the current latched state.

use std::collections::HashMap;

use bitflags::bitflags;
use glam::Vec2;

/// Bound queue depth; action events past this are dropped.
const QUEUE_SIZE: usize = 64;

/// One-shot commands fired on key-down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Action {
    #[default]
    None,
    Select,
    Move,
    Weapon1,
    Weapon2,
    Weapon3,
    ZoomIn,
    ZoomOut,
}

impl Action {
    pub fn to_u8(self) -> u8 {
        match self {
            Action::None => 0,
            Action::Select => 1,
            Action::Move => 2,
            Action::Weapon1 => 3,
            Action::Weapon2 => 4,
            Action::Weapon3 => 5,
            Action::ZoomIn => 6,
            Action::ZoomOut => 7,
        }
    }

    /// Tolerant decode; unknown values read as no action.
    pub fn from_u8(value: u8) -> Action {
        match value {
            1 => Action::Select,
            2 => Action::Move,
            3 => Action::Weapon1,
            4 => Action::Weapon2,
            5 => Action::Weapon3,
            6 => Action::ZoomIn,
            7 => Action::ZoomOut,
            _ => Action::None,
        }
    }
}

bitflags! {
    /// Latched buttons held during a tick.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Buttons: u32 {
        const SELECT = 1 << 0;
        const ZOOM_IN = 1 << 1;
        const ZOOM_OUT = 1 << 2;
        const FORWARD = 1 << 3;
        const BACK = 1 << 4;
        const LEFT = 1 << 5;
        const RIGHT = 1 << 6;
    }
}

bitflags! {
    /// Latched modifier keys held during a tick.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Modifiers: u32 {
        const ALTERNATE = 1 << 0;
        const CONTROL = 1 << 1;
        const SHIFT = 1 << 2;
    }
}

/// Gamepad state, normalized: thumbsticks to unit length, triggers to `[0,1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gamepad {
    pub thumbstick: [Vec2; 2],
    pub trigger: [f32; 2],
}

impl Gamepad {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
}

/// One tick of player intent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Usercmd {
    pub cursor: Vec2,
    pub action: Action,
    pub buttons: Buttons,
    pub modifiers: Modifiers,
}

impl Usercmd {
    /// Movement direction derived from the directional buttons, unit length
    /// or zero.
    pub fn move_vector(&self) -> Vec2 {
        let mut wish = Vec2::ZERO;
        if self.buttons.contains(Buttons::FORWARD) {
            wish.y += 1.0;
        }
        if self.buttons.contains(Buttons::BACK) {
            wish.y -= 1.0;
        }
        if self.buttons.contains(Buttons::RIGHT) {
            wish.x += 1.0;
        }
        if self.buttons.contains(Buttons::LEFT) {
            wish.x -= 1.0;
        }
        wish.normalize_or_zero()
    }
}

/// What a key is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Action(Action),
    Button(Buttons),
    Modifier(Modifiers),
}

/// Compiles key and cursor events into [`Usercmd`] records.
#[derive(Debug, Default)]
pub struct UsercmdGen {
    bindings: HashMap<u32, Binding>,
    button_state: Buttons,
    modifier_state: Modifiers,
    cursor_state: Vec2,
    gamepad_state: Gamepad,
    queue: std::collections::VecDeque<Usercmd>,
}

impl UsercmdGen {
    pub fn new() -> UsercmdGen {
        UsercmdGen::default()
    }

    /// Clear latched state and the pending queue; optionally drop bindings.
    pub fn reset(&mut self, unbind_all: bool) {
        self.button_state = Buttons::empty();
        self.modifier_state = Modifiers::empty();
        self.gamepad_state = Gamepad::default();
        self.queue.clear();
        if unbind_all {
            self.bindings.clear();
        }
    }

    pub fn bind(&mut self, key: u32, binding: Binding) {
        self.bindings.insert(key, binding);
    }

    pub fn bind_all(&mut self, bindings: &[(u32, Binding)]) {
        for &(key, binding) in bindings {
            self.bind(key, binding);
        }
    }

    pub fn unbind(&mut self, key: u32) {
        self.bindings.remove(&key);
    }

    /// Process a key transition. Returns whether the key was bound.
    pub fn key_event(&mut self, key: u32, down: bool) -> bool {
        let Some(&binding) = self.bindings.get(&key) else {
            return false;
        };
        match binding {
            Binding::Action(action) => {
                if down && self.queue.len() < QUEUE_SIZE {
                    let mut cmd = self.generate_direct();
                    cmd.action = action;
                    self.queue.push_back(cmd);
                }
            }
            Binding::Button(button) => {
                self.button_state.set(button, down);
            }
            Binding::Modifier(modifier) => {
                self.modifier_state.set(modifier, down);
            }
        }
        true
    }

    pub fn cursor_event(&mut self, position: Vec2) {
        self.cursor_state = position;
    }

    pub fn gamepad_event(&mut self, pad: Gamepad) {
        self.gamepad_state = pad;
    }

    pub fn state(&self, button: Buttons) -> bool {
        self.button_state.contains(button)
    }

    /// Next command: queued action snapshots first, then the live state.
    pub fn generate(&mut self) -> Usercmd {
        self.queue.pop_front().unwrap_or_else(|| self.generate_direct())
    }

    /// Command reflecting the current latched state, ignoring the queue.
    pub fn generate_direct(&self) -> Usercmd {
        Usercmd {
            cursor: self.cursor_state,
            action: Action::None,
            buttons: self.button_state,
            modifiers: self.modifier_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_K: u32 = 75;
    const KEY_SHIFT: u32 = 16;

    #[test]
    fn action_presses_queue_then_drain_fifo() {
        let mut gen = UsercmdGen::new();
        gen.bind(KEY_K, Binding::Action(Action::Select));

        for _ in 0..3 {
            assert!(gen.key_event(KEY_K, true));
            assert!(gen.key_event(KEY_K, false));
        }

        for _ in 0..3 {
            assert_eq!(gen.generate().action, Action::Select);
        }
        assert_eq!(gen.generate().action, Action::None);
    }

    #[test]
    fn queue_overflow_drops_new_events() {
        let mut gen = UsercmdGen::new();
        gen.bind(KEY_K, Binding::Action(Action::Select));
        for _ in 0..QUEUE_SIZE + 10 {
            gen.key_event(KEY_K, true);
            gen.key_event(KEY_K, false);
        }
        let mut queued = 0;
        while gen.generate().action == Action::Select {
            queued += 1;
        }
        assert_eq!(queued, QUEUE_SIZE);
    }

    #[test]
    fn buttons_and_modifiers_latch() {
        let mut gen = UsercmdGen::new();
        gen.bind(KEY_K, Binding::Button(Buttons::FORWARD));
        gen.bind(KEY_SHIFT, Binding::Modifier(Modifiers::SHIFT));

        gen.key_event(KEY_K, true);
        gen.key_event(KEY_SHIFT, true);
        assert!(gen.state(Buttons::FORWARD));
        let cmd = gen.generate();
        assert!(cmd.buttons.contains(Buttons::FORWARD));
        assert!(cmd.modifiers.contains(Modifiers::SHIFT));

        gen.key_event(KEY_K, false);
        assert!(!gen.state(Buttons::FORWARD));
        assert!(!gen.generate().buttons.contains(Buttons::FORWARD));
    }

    #[test]
    fn queued_snapshot_captures_state_at_press_time() {
        let mut gen = UsercmdGen::new();
        gen.bind(KEY_K, Binding::Action(Action::Move));
        gen.cursor_event(Vec2::new(4.0, 2.0));
        gen.key_event(KEY_K, true);
        gen.cursor_event(Vec2::new(100.0, 100.0));

        let queued = gen.generate();
        assert_eq!(queued.action, Action::Move);
        assert_eq!(queued.cursor, Vec2::new(4.0, 2.0));
        // Live state reflects the new cursor.
        assert_eq!(gen.generate().cursor, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn unbound_keys_are_reported() {
        let mut gen = UsercmdGen::new();
        assert!(!gen.key_event(999, true));
    }

    #[test]
    fn move_vector_is_normalized() {
        let cmd = Usercmd {
            buttons: Buttons::FORWARD | Buttons::RIGHT,
            ..Usercmd::default()
        };
        let v = cmd.move_vector();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!(v.x > 0.0 && v.y > 0.0);
    }
}
