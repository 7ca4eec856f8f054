use bevy_ecs::message::Message;

/// Commands sent *to* the audio thread. Ids are sound registry ids.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioCmd {
    Load { id: u32, path: String },
    /// `loops` extra repetitions, `-1` loops forever.
    Play { id: u32, loops: i32 },
    FadeIn { id: u32, loops: i32, ms: u32 },
    FadeOut { ms: u32 },
    Pause,
    Volume { volume: u8 },
    Unload { id: u32 },
    UnloadAll,
    Shutdown,
}

/// Messages sent *back* from the audio thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioMessage {
    Loaded { id: u32 },
    LoadFailed { id: u32, error: String },
    PlayFailed { id: u32, error: String },
    Unloaded { id: u32 },
}
