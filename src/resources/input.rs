//! Per-frame keyboard and mouse state.
//!
//! The input backend hands the engine one [`InputSnapshot`] per frame with
//! the raw transitions it saw. [`update_input_state`] folds that snapshot
//! into [`InputState`], which client code queries through
//! [`InputState::key_event`] and [`InputState::mouse_event`]:
//!
//! - [`KeyState::Pressed`] holds from the press until the release, and for
//!   the one frame of a press released within that same frame
//! - [`KeyState::Released`] holds for exactly one frame after the release
//!
//! [`update_input_state`]: crate::systems::input::update_input_state
use bevy_ecs::prelude::*;
use glam::IVec2;
use rustc_hash::FxHashMap;

/// Platform key code, passed through from the input backend untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// Raw transition reported by the input backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Down,
    Up,
}

/// State a key or button can be queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Transitions reported by the input backend for one frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputSnapshot {
    pub keys: Vec<(KeyCode, Transition)>,
    pub mouse_buttons: Vec<(MouseButton, Transition)>,
    pub mouse_position: Option<IVec2>,
    /// `Some(true)` when the window gained focus, `Some(false)` when it lost it.
    pub focus: Option<bool>,
    pub quit_requested: bool,
}

impl InputSnapshot {
    pub fn key_down(mut self, key: KeyCode) -> Self {
        self.keys.push((key, Transition::Down));
        self
    }

    pub fn key_up(mut self, key: KeyCode) -> Self {
        self.keys.push((key, Transition::Up));
        self
    }

    pub fn mouse(mut self, button: MouseButton, transition: Transition) -> Self {
        self.mouse_buttons.push((button, transition));
        self
    }

    pub fn mouse_at(mut self, x: i32, y: i32) -> Self {
        self.mouse_position = Some(IVec2::new(x, y));
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Boolean button state.
pub struct BoolState {
    /// Whether the button is held down.
    pub active: bool,
    /// Whether the button was pressed this frame.
    pub just_pressed: bool,
    /// Whether the button was released this frame.
    pub just_released: bool,
}

impl BoolState {
    fn begin_frame(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Down => {
                if !self.active {
                    self.just_pressed = true;
                }
                self.active = true;
            }
            Transition::Up => {
                if self.active {
                    self.just_released = true;
                }
                self.active = false;
            }
        }
    }

    fn matches(&self, state: KeyState) -> bool {
        match state {
            // A press and release within one frame still reads as pressed.
            KeyState::Pressed => self.active || self.just_pressed,
            KeyState::Released => self.just_released,
        }
    }
}

/// Resource holding the folded keyboard and mouse state.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputState {
    keys: FxHashMap<KeyCode, BoolState>,
    mouse_left: BoolState,
    mouse_right: BoolState,
    mouse_position: IVec2,
}

impl InputState {
    fn button_mut(&mut self, button: MouseButton) -> &mut BoolState {
        match button {
            MouseButton::Left => &mut self.mouse_left,
            MouseButton::Right => &mut self.mouse_right,
        }
    }

    /// Apply one frame of transitions. Releases from the previous frame
    /// expire first, so a release is observable for exactly one frame.
    pub fn apply(&mut self, snapshot: &InputSnapshot) {
        for state in self.keys.values_mut() {
            state.begin_frame();
        }
        self.keys.retain(|_, s| s.active);
        self.mouse_left.begin_frame();
        self.mouse_right.begin_frame();

        for (key, transition) in &snapshot.keys {
            self.keys.entry(*key).or_default().apply(*transition);
        }
        for (button, transition) in &snapshot.mouse_buttons {
            self.button_mut(*button).apply(*transition);
        }
        if let Some(pos) = snapshot.mouse_position {
            self.mouse_position = pos;
        }
    }

    pub fn key(&self, key: KeyCode) -> BoolState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    /// True if `key` is in `state` this frame.
    pub fn key_event(&self, state: KeyState, key: KeyCode) -> bool {
        self.key(key).matches(state)
    }

    pub fn mouse(&self, button: MouseButton) -> BoolState {
        match button {
            MouseButton::Left => self.mouse_left,
            MouseButton::Right => self.mouse_right,
        }
    }

    pub fn mouse_event(&self, state: KeyState, button: MouseButton) -> bool {
        self.mouse(button).matches(state)
    }

    pub fn mouse_position(&self) -> IVec2 {
        self.mouse_position
    }
}
