//! Engine configuration resource.
//!
//! Manages engine settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! title = Moonframe
//! width = 1280
//! height = 720
//! fullscreen = false
//!
//! [render]
//! target_fps = 60
//! background = 0,0,0
//!
//! [audio]
//! frequency = 44100
//! channels = 2
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::components::color::Color;
use crate::error::{EngineError, EngineResult};

/// Default safe values for startup
const DEFAULT_TITLE: &str = "Moonframe";
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_FULLSCREEN: bool = false;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_FREQUENCY: u32 = 44_100;
const DEFAULT_CHANNELS: u8 = 2;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Window/display settings handed to the render backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

/// Audio device settings handed to the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioConfig {
    /// Sample rate in Hz.
    pub frequency: u32,
    pub channels: u8,
}

#[derive(Resource, Debug, Clone)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub audio: AudioConfig,
    /// Target frames per second.
    pub target_fps: u32,
    /// Colour the screen is cleared with every frame.
    pub background: Color,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_rgb(value: &str) -> Option<Color> {
    let parts: Vec<u8> = value
        .split(',')
        .map(|p| p.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [r, g, b] => Some(Color::rgb(*r, *g, *b)),
        _ => None,
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window: WindowConfig {
                title: DEFAULT_TITLE.to_string(),
                width: DEFAULT_WINDOW_WIDTH,
                height: DEFAULT_WINDOW_HEIGHT,
                fullscreen: DEFAULT_FULLSCREEN,
            },
            audio: AudioConfig {
                frequency: DEFAULT_FREQUENCY,
                channels: DEFAULT_CHANNELS,
            },
            target_fps: DEFAULT_TARGET_FPS,
            background: Color::BLACK,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> EngineResult<()> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| EngineError::Config(format!("failed to load config file: {}", e)))?;

        // [window] section
        if let Some(title) = config.get("window", "title") {
            self.window.title = title;
        }
        if let Some(width) = get_in_range(&config, "window", "width") {
            self.window.width = width;
        }
        if let Some(height) = get_in_range(&config, "window", "height") {
            self.window.height = height;
        }
        if let Some(fullscreen) = config.getbool("window", "fullscreen").ok().flatten() {
            self.window.fullscreen = fullscreen;
        }

        // [render] section
        if let Some(fps) = get_in_range(&config, "render", "target_fps") {
            self.target_fps = fps;
        }
        if let Some(raw) = config.get("render", "background") {
            match parse_rgb(&raw) {
                Some(color) => self.background = color,
                None => log::warn!("Ignoring malformed background colour '{}'", raw),
            }
        }

        // [audio] section
        if let Some(freq) = get_in_range(&config, "audio", "frequency") {
            self.audio.frequency = freq;
        }
        if let Some(channels) = get_in_range(&config, "audio", "channels") {
            self.audio.channels = channels;
        }

        info!(
            "Loaded config: '{}' {}x{} window, fullscreen={}, fps={}, audio {}Hz/{}ch",
            self.window.title,
            self.window.width,
            self.window.height,
            self.window.fullscreen,
            self.target_fps,
            self.audio.frequency,
            self.audio.channels
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> EngineResult<()> {
        let mut config = Ini::new();

        config.set("window", "title", Some(self.window.title.clone()));
        config.set("window", "width", Some(self.window.width.to_string()));
        config.set("window", "height", Some(self.window.height.to_string()));
        config.set("window", "fullscreen", Some(self.window.fullscreen.to_string()));

        config.set("render", "target_fps", Some(self.target_fps.to_string()));
        let bg = self.background;
        config.set(
            "render",
            "background",
            Some(format!("{},{},{}", bg.r, bg.g, bg.b)),
        );

        config.set("audio", "frequency", Some(self.audio.frequency.to_string()));
        config.set("audio", "channels", Some(self.audio.channels.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| EngineError::Config(format!("failed to save config file: {}", e)))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Frame budget in milliseconds for the target frame rate.
    pub fn frame_budget_ms(&self) -> u32 {
        1000 / self.target_fps.max(1)
    }
}

/// Read an unsigned key that must fit in `T`; out-of-range values are
/// logged and ignored so the current value is kept.
fn get_in_range<T: TryFrom<u64>>(config: &Ini, section: &str, key: &str) -> Option<T> {
    let raw = config.getuint(section, key).ok().flatten()?;
    match T::try_from(raw) {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring out-of-range [{}] {} = {}", section, key, raw);
            None
        }
    }
}
