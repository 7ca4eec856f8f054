//! Engine systems and per-frame passes.
//!
//! Overview
//! - `audio` – audio thread entry point and message polling
//! - `collision` – two-phase frame-box / rectangle collision test
//! - `fonts` – font merge at the frame's safe point
//! - `input` – fold the polled input snapshot into key/mouse state
//! - `render` – z-ordered draw scheduler
//! - `time` – world clock and time events
pub mod audio;
pub mod collision;
pub mod fonts;
pub mod input;
pub mod render;
pub mod time;
