use crate::error::EntityKind;
use crate::registry::{Registry, RegistryEntry};

pub type VideoRegistry = Registry<Video>;

/// A video clip reference. Decoding is left to the platform layer; the core
/// only tracks the path and whether playback is requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Video {
    pub path: String,
    pub playing: bool,
}

impl RegistryEntry for Video {
    const KIND: EntityKind = EntityKind::Video;
}

impl Video {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            playing: false,
        }
    }

    /// Flip playback on/off and return the new state.
    pub fn toggle(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }
}
