//! Sound entries.
//!
//! The sample itself lives on the audio thread; a [`Sound`] only tracks
//! what the render thread knows about it: load progress reported back by
//! the audio thread and the lock flag that suppresses playback.

use crate::error::EntityKind;
use crate::registry::{Registry, RegistryEntry};

pub type SoundRegistry = Registry<Sound>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SoundLoad {
    #[default]
    Empty,
    Pending {
        path: String,
    },
    Ready,
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Sound {
    pub load: SoundLoad,
    pub locked: bool,
}

impl RegistryEntry for Sound {
    const KIND: EntityKind = EntityKind::Sound;
}

impl Sound {
    pub fn is_ready(&self) -> bool {
        self.load == SoundLoad::Ready
    }
}
