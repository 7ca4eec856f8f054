//! Input system.
//!
//! [`update_input_state`] folds the [`InputSnapshot`] polled from the input
//! backend at the start of the frame into [`InputState`] and
//! [`WindowState`].
use bevy_ecs::prelude::*;

use crate::resources::input::{InputSnapshot, InputState};
use crate::resources::window::WindowState;

pub fn update_input_state(
    snapshot: Res<InputSnapshot>,
    mut input: ResMut<InputState>,
    mut window: ResMut<WindowState>,
) {
    input.apply(&snapshot);

    window.focus_gained = false;
    if let Some(focused) = snapshot.focus {
        if focused && !window.focused {
            window.focus_gained = true;
        }
        window.focused = focused;
    }
    if snapshot.quit_requested {
        log::info!("quit requested");
        window.quit_requested = true;
    }
}
