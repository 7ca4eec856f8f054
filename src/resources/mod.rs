//! ECS resources held by the engine's `World`.
//!
//! Overview
//! - `audio` – bridge and channels for the background audio thread
//! - `engineconfig` – window, render and audio settings loaded from INI
//! - `fontregistry` – font registry shared with a producer thread
//! - `input` – per-frame input snapshot and folded key/mouse state
//! - `stats` – frame statistics behind the general engine lock
//! - `window` – current window size, focus and quit request
//! - `worldtime` – simulation time, delta and millisecond timestamp
pub mod audio;
pub mod engineconfig;
pub mod fontregistry;
pub mod input;
pub mod stats;
pub mod window;
pub mod worldtime;
