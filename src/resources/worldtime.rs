use bevy_ecs::prelude::Resource;

/// Engine clock advanced once per frame by
/// [`update_world_time`](crate::systems::time::update_world_time).
#[derive(Resource, Clone, Copy, Debug)]
pub struct WorldTime {
    /// Scaled seconds since the engine started.
    pub elapsed: f32,
    /// Scaled duration of the last frame in seconds.
    pub delta: f32,
    pub time_scale: f32,
    /// Milliseconds since the engine started; time events compare against this.
    pub timestamp_ms: u64,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            timestamp_ms: 0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }
}
