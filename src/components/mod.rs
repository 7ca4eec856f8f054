//! Entity payloads stored in the engine registries.
//!
//! Each entity kind is a plain struct held in a
//! [`Registry`](crate::registry::Registry) keyed by a client-assigned id,
//! plus the small value types those payloads share.
//!
//! Submodules overview:
//! - [`collisionbox`] – integer rectangles and world-space collision boxes
//! - [`color`] – RGBA colour
//! - [`directions`] – per-entity movement direction lists
//! - [`font`] – font entries and style flags
//! - [`line`] – line entities
//! - [`model`] – sprite models with textures, clones and collision rectangles
//! - [`point`] – point entities
//! - [`sound`] – sound entries backed by the audio thread
//! - [`text`] – text entities rendered through the font backend
//! - [`timeevent`] – millisecond deadlines checked once per frame
//! - [`video`] – video clip references
//! - [`zindex`] – validated draw-order key

pub mod collisionbox;
pub mod color;
pub mod directions;
pub mod font;
pub mod line;
pub mod model;
pub mod point;
pub mod sound;
pub mod text;
pub mod timeevent;
pub mod video;
pub mod zindex;
