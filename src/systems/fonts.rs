//! Font merge at the frame's safe point.
use bevy_ecs::prelude::*;

use crate::resources::fontregistry::{FontMode, FontRegistry};

/// Fold buffered fonts into the primary registry once the producer mode is
/// off. While the producer is active the pass is skipped entirely.
pub fn merge_fonts_at_safe_point(fonts: Res<FontRegistry>) {
    if fonts.mode() == FontMode::Buffered || !fonts.merge_pending() {
        return;
    }
    if let Err(err) = fonts.merge() {
        log::warn!("font merge skipped: {}", err);
    }
}
