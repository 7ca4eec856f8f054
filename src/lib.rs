//! Moonframe engine core library.
//!
//! Id-addressed registries for every entity kind, a font registry that
//! accepts creations from a producer thread, a z-ordered draw scheduler, a
//! two-phase collision test and the frame controller tying them together.
//! Rendering, audio, glyphs and input are reached through the traits in
//! [`backend`].

pub mod backend;
pub mod components;
pub mod engine;
pub mod error;
pub mod events;
pub mod registry;
pub mod resources;
pub mod systems;

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
