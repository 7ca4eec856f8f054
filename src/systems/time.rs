//! Time systems.
//!
//! - [`update_world_time`] advances the shared
//!   [`WorldTime`](crate::resources::worldtime::WorldTime) resource once per
//!   frame, applying `time_scale` to the provided delta.
//! - [`update_time_events`] flips every time event whose deadline passed.
use bevy_ecs::prelude::*;

use crate::components::timeevent::TimeEventRegistry;
use crate::resources::worldtime::WorldTime;

/// Update elapsed, delta and the millisecond timestamp on `WorldTime`.
///
/// `dt` is the unscaled frame delta in seconds. The timestamp advances by
/// the scaled delta rounded to whole milliseconds.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scaled_dt = dt.max(0.0) * wt.time_scale;
    wt.elapsed += scaled_dt;
    wt.delta = scaled_dt;
    wt.timestamp_ms += (scaled_dt as f64 * 1000.0).round() as u64;
    wt.frame_count += 1;
}

/// Mark time events as reached once the engine timestamp passes them.
pub fn update_time_events(time: Res<WorldTime>, mut events: ResMut<TimeEventRegistry>) {
    let now = time.timestamp_ms;
    events.for_each_mut(|id, event| {
        if !event.reached && event.check(now) {
            log::trace!("time event {} reached at {} ms", id, now);
        }
    });
}
