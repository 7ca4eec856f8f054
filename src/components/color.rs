//! RGBA colour used by points, lines, texts and the background.
//!
//! [`Color::modulate`] multiplies two colours component-wise; the draw
//! scheduler uses it to fold an entity's fade alpha into its base colour.

/// 8-bit RGBA colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Multiply this colour with another one (component-wise).
    pub fn modulate(&self, other: Color) -> Color {
        Color::new(
            ((self.r as u16 * other.r as u16) / 255) as u8,
            ((self.g as u16 * other.g as u16) / 255) as u8,
            ((self.b as u16 * other.b as u16) / 255) as u8,
            ((self.a as u16 * other.a as u16) / 255) as u8,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Convert a floating alpha in `0.0..=255.0` to a channel value.
pub fn alpha_channel(alpha: f32) -> u8 {
    alpha.clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_white() {
        assert_eq!(Color::default(), Color::WHITE);
    }

    #[test]
    fn test_modulate_with_white_is_identity() {
        let c = Color::new(100, 150, 200, 255);
        assert_eq!(c.modulate(Color::WHITE), c);
    }

    #[test]
    fn test_modulate_alpha_only() {
        let c = Color::new(100, 150, 200, 255);
        let faded = c.modulate(Color::WHITE.with_alpha(0));
        assert_eq!(faded, Color::new(100, 150, 200, 0));
    }

    #[test]
    fn test_alpha_channel_clamps() {
        assert_eq!(alpha_channel(-4.0), 0);
        assert_eq!(alpha_channel(127.6), 128);
        assert_eq!(alpha_channel(900.0), 255);
    }
}
