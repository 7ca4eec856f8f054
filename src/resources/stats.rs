//! Frame statistics shared across threads.
//!
//! [`SharedStats`] is the engine's general-purpose lock: a
//! `parking_lot::Mutex` around [`FrameStats`]. The frame controller updates
//! it once per frame; any thread holding a clone can read it. The lock is
//! held only for the individual read or update.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames counted in the current one-second window.
    pub frames_this_second: u16,
    /// Engine timestamp at which the current window closes.
    pub window_end_ms: u64,
    /// Frames counted in the last complete second.
    pub last_fps: u16,
    /// Set when `last_fps` was refreshed and not yet consumed.
    pub recent_fps: bool,
    pub frame_count: u64,
    pub draw_failures: u64,
}

#[derive(Resource, Clone, Default)]
pub struct SharedStats(Arc<Mutex<FrameStats>>);

impl SharedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a presented frame at engine time `now_ms`.
    pub fn record_frame(&self, now_ms: u64) {
        let mut stats = self.0.lock();
        stats.frame_count += 1;
        if stats.window_end_ms == 0 {
            stats.window_end_ms = now_ms + 1000;
        }
        if now_ms >= stats.window_end_ms {
            stats.last_fps = stats.frames_this_second;
            stats.recent_fps = true;
            stats.frames_this_second = 0;
            stats.window_end_ms = now_ms + 1000;
        }
        stats.frames_this_second = stats.frames_this_second.saturating_add(1);
    }

    pub fn add_draw_failures(&self, count: u64) {
        if count > 0 {
            self.0.lock().draw_failures += count;
        }
    }

    pub fn fps(&self) -> u16 {
        self.0.lock().last_fps
    }

    /// True once per completed second, then false until the next one.
    pub fn take_recent_fps(&self) -> bool {
        std::mem::take(&mut self.0.lock().recent_fps)
    }

    pub fn snapshot(&self) -> FrameStats {
        *self.0.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_is_published_once_per_second() {
        let stats = SharedStats::new();
        // 10 frames, 100ms apart, starting at t=100.
        for i in 1..=10u64 {
            stats.record_frame(i * 100);
        }
        assert!(!stats.take_recent_fps());
        stats.record_frame(1_100);
        assert_eq!(stats.fps(), 10);
        assert!(stats.take_recent_fps());
        assert!(!stats.take_recent_fps());
        assert_eq!(stats.snapshot().frame_count, 11);
    }

    #[test]
    fn clones_share_state() {
        let stats = SharedStats::new();
        let other = stats.clone();
        std::thread::spawn(move || other.add_draw_failures(3))
            .join()
            .unwrap();
        assert_eq!(stats.snapshot().draw_failures, 3);
    }
}
