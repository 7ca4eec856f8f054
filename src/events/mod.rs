//! Messages exchanged across threads and systems.
//!
//! Submodules:
//! - [`audio`] – commands and messages for the background audio thread
pub mod audio;
