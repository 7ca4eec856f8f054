//! Runtime window state.
//!
//! Tracks what the frame controller learns from the platform each frame:
//! the current screen size, window focus and whether a quit was requested.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Copy)]
pub struct WindowState {
    pub width: u32,
    pub height: u32,
    pub focused: bool,
    /// True only in the frame the window regained focus.
    pub focus_gained: bool,
    pub quit_requested: bool,
}

impl WindowState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            focused: true,
            focus_gained: false,
            quit_requested: false,
        }
    }

    pub fn percent_to_pixel_x(&self, percent: f64) -> f64 {
        self.width as f64 * percent / 100.0
    }

    pub fn percent_to_pixel_y(&self, percent: f64) -> f64 {
        self.height as f64 * percent / 100.0
    }

    pub fn pixel_to_percent_x(&self, pixel: f64) -> f64 {
        if self.width == 0 {
            return 0.0;
        }
        pixel * 100.0 / self.width as f64
    }

    pub fn pixel_to_percent_y(&self, pixel: f64) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        pixel * 100.0 / self.height as f64
    }

    /// Scale a width designed for `source_width` to the current screen.
    pub fn convert_res_width(&self, value: f64, source_width: f64) -> f64 {
        value * self.width as f64 / source_width
    }

    /// Scale a height designed for `source_height` to the current screen.
    pub fn convert_res_height(&self, value: f64, source_height: f64) -> f64 {
        value * self.height as f64 / source_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_conversions_are_inverse() {
        let w = WindowState::new(800, 600);
        assert_eq!(w.percent_to_pixel_x(25.0), 200.0);
        assert_eq!(w.pixel_to_percent_y(300.0), 50.0);
        assert_eq!(w.convert_res_width(100.0, 1600.0), 50.0);
        assert_eq!(w.convert_res_height(100.0, 300.0), 200.0);
    }
}
