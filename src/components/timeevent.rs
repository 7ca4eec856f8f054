//! Time events: one-shot deadlines checked once per frame.
//!
//! A [`TimeEvent`] stores an absolute target timestamp in engine
//! milliseconds. [`crate::systems::time::update_time_events`] flips
//! `reached` once the engine clock passes the target.

use crate::error::EntityKind;
use crate::registry::{Registry, RegistryEntry};

pub type TimeEventRegistry = Registry<TimeEvent>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeEvent {
    pub target_ms: u64,
    pub reached: bool,
}

impl RegistryEntry for TimeEvent {
    const KIND: EntityKind = EntityKind::TimeEvent;
}

impl TimeEvent {
    pub fn starting_at(now_ms: u64, duration_ms: u32) -> Self {
        Self {
            target_ms: now_ms + duration_ms as u64,
            reached: false,
        }
    }

    /// Restart the countdown from `now_ms`.
    pub fn reset(&mut self, now_ms: u64, duration_ms: u32) {
        *self = Self::starting_at(now_ms, duration_ms);
    }

    /// Push the deadline back by `extra_ms`.
    pub fn extend(&mut self, extra_ms: u32) {
        self.target_ms += extra_ms as u64;
    }

    /// Mark as reached if `now_ms` is at or past the target.
    pub fn check(&mut self, now_ms: u64) -> bool {
        if !self.reached && now_ms >= self.target_ms {
            self.reached = true;
        }
        self.reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reached_once_target_passes() {
        let mut ev = TimeEvent::starting_at(1_000, 500);
        assert!(!ev.check(1_499));
        assert!(ev.check(1_500));
        assert!(ev.check(1_400));
    }

    #[test]
    fn reset_clears_reached() {
        let mut ev = TimeEvent::starting_at(0, 10);
        ev.check(10);
        ev.reset(100, 50);
        assert!(!ev.reached);
        assert_eq!(ev.target_ms, 150);
        ev.extend(25);
        assert_eq!(ev.target_ms, 175);
    }
}
