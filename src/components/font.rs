//! Font entries stored in the [`FontRegistry`](crate::resources::fontregistry::FontRegistry).

use crate::backend::FontHandle;
use crate::error::EntityKind;
use crate::registry::RegistryEntry;

bitflags::bitflags! {
    /// Font style flags; combine with `|`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FontStyle: u8 {
        const NORMAL = 0;
        const BOLD = 1 << 0;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub handle: FontHandle,
    pub path: String,
    pub point_size: u32,
    pub style: FontStyle,
}

impl RegistryEntry for Font {
    const KIND: EntityKind = EntityKind::Font;
}
