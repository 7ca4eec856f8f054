//! Z-index value for render ordering.
//!
//! Lower values are painted first, so entities with a higher z-index end up
//! on top. `0` is reserved to mean "unassigned" and can never be stored in a
//! [`ZIndex`]; entities without a z-index are left out of the draw pass.

use std::num::NonZeroU32;

use crate::error::{EngineError, EngineResult};

/// Assigned, non-zero draw-order key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZIndex(NonZeroU32);

impl ZIndex {
    /// Validate a raw z-index. `0` is rejected.
    pub fn new(value: u32) -> EngineResult<Self> {
        NonZeroU32::new(value)
            .map(ZIndex)
            .ok_or_else(|| EngineError::invalid("z-index 0 is reserved for unassigned entities"))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Raw view of an optional z-index; unassigned reads as `0`.
pub fn raw(zindex: Option<ZIndex>) -> u32 {
    zindex.map_or(0, ZIndex::get)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(matches!(ZIndex::new(0), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn ordering_follows_value() {
        let low = ZIndex::new(1).unwrap();
        let high = ZIndex::new(3).unwrap();
        assert!(low < high);
        assert_eq!(raw(Some(high)), 3);
        assert_eq!(raw(None), 0);
    }
}
