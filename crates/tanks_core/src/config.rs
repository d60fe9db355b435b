//! Persisted profile variables.
//!
//! Three archived variables, stored as JSON in the user's profile:
//!
//! | Name         | Default              | Effect                          |
//! |--------------|----------------------|---------------------------------|
//! | `net_master` | `oedhead.no-ip.org`  | Master server hostname          |
//! | `ui_name`    | OS username          | Player display name             |
//! | `ui_color`   | `"255 0 0"`          | Player color, three 0-255 ints  |
//!
//! Any parse failure, at file level or per field, falls back to the default
//! for the affected variable.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::render::Color;

/// Colors darker than this channel sum are scaled up for legibility.
const COLOR_MIN_FRACTION: f32 = 0.75;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("profile i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("profile encode: {0}")]
    Encode(#[from] serde_json::Error),
}

fn default_net_master() -> String {
    "oedhead.no-ip.org".to_owned()
}

fn default_ui_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "player".to_owned())
}

fn default_ui_color() -> String {
    "255 0 0".to_owned()
}

/// The archived profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    #[serde(default = "default_net_master")]
    pub net_master: String,
    #[serde(default = "default_ui_name")]
    pub ui_name: String,
    #[serde(default = "default_ui_color")]
    pub ui_color: String,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            net_master: default_net_master(),
            ui_name: default_ui_name(),
            ui_color: default_ui_color(),
        }
    }
}

impl Profile {
    /// Load a profile; a missing or unreadable file yields the defaults.
    pub fn load(path: &Path) -> Profile {
        match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(%err, "malformed profile, using defaults");
                Profile::default()
            }),
            Err(_) => Profile::default(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Parse `ui_color` and normalize it for legibility.
    pub fn color(&self) -> Color {
        parse_color(&self.ui_color)
    }

    /// Store a color back into `ui_color` as three 0-255 integers.
    pub fn set_color(&mut self, color: Color) {
        self.ui_color = format!(
            "{} {} {}",
            (color.r * 255.0) as i32,
            (color.g * 255.0) as i32,
            (color.b * 255.0) as i32
        );
    }
}

/// Parse three whitespace-separated 0-255 integers; unparseable components
/// read as 0. The result is scaled up so the channel sum stays legible.
pub fn parse_color(text: &str) -> Color {
    let mut parts = text.split_whitespace();
    let mut channel = || -> f32 {
        parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .unwrap_or(0) as f32
            / 255.0
    };
    let color = Color::new(channel(), channel(), channel(), 1.0);
    normalize_color(color)
}

fn normalize_color(color: Color) -> Color {
    let sum = color.r + color.g + color.b;
    if sum >= COLOR_MIN_FRACTION {
        return color;
    }
    if sum == 0.0 {
        let channel = COLOR_MIN_FRACTION / 3.0;
        return Color::new(channel, channel, channel, color.a);
    }
    let scale = COLOR_MIN_FRACTION / sum;
    Color::new(color.r * scale, color.g * scale, color.b * scale, color.a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_color_is_red() {
        let profile = Profile::default();
        let color = profile.color();
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert_eq!(color.b, 0.0);
    }

    #[test]
    fn dark_colors_are_scaled_to_minimum_sum() {
        let color = parse_color("10 10 10");
        let sum = color.r + color.g + color.b;
        assert!((sum - COLOR_MIN_FRACTION).abs() < 1e-5);
        // Scaling preserves hue.
        assert_eq!(color.r, color.g);
        assert_eq!(color.g, color.b);
    }

    #[test]
    fn black_becomes_neutral_gray() {
        let color = parse_color("0 0 0");
        assert!((color.r - 0.25).abs() < 1e-5);
        assert_eq!(color.r, color.g);
        assert_eq!(color.g, color.b);
    }

    #[test]
    fn malformed_components_read_as_zero() {
        let color = parse_color("255 banana");
        assert_eq!(color.r, 1.0);
        assert_eq!(color.g, 0.0);
        assert_eq!(color.b, 0.0);
    }

    #[test]
    fn round_trip_through_disk() {
        let dir = std::env::temp_dir().join("tanks_core_profile_test");
        let path = dir.join("profile.json");
        let mut profile = Profile::default();
        profile.ui_name = "Alice".to_owned();
        profile.net_master = "master.example.org".to_owned();
        profile.set_color(Color::new(0.0, 1.0, 0.0, 1.0));
        profile.save(&path).expect("save");

        let loaded = Profile::load(&path);
        assert_eq!(loaded, profile);
        assert_eq!(loaded.ui_color, "0 255 0");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("tanks_core_profile_bad");
        let path = dir.join("profile.json");
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(&path, "{ not json").expect("write");
        let loaded = Profile::load(&path);
        assert_eq!(loaded.net_master, "oedhead.no-ip.org");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_fields_use_field_defaults() {
        let profile: Profile =
            serde_json::from_str(r#"{"ui_name": "Bob"}"#).expect("parse");
        assert_eq!(profile.ui_name, "Bob");
        assert_eq!(profile.net_master, "oedhead.no-ip.org");
        assert_eq!(profile.ui_color, "255 0 0");
    }
}
