use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const THEME_FILE_NAME: &str = "theme.toml";

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    /// Countdown color during a work phase.
    #[serde(deserialize_with = "hex_to_color")]
    pub work: Color,
    /// Countdown color during a break.
    #[serde(rename = "break", deserialize_with = "hex_to_color")]
    pub rest: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub black: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub red: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub green: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub yellow: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub magenta: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub gray: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 14, 19),
            foreground: Color::Rgb(197, 201, 199),
            work: Color::Rgb(197, 201, 199),
            rest: Color::Rgb(127, 180, 202),
            black: Color::Rgb(13, 12, 12),
            red: Color::Rgb(228, 104, 118),
            green: Color::Rgb(138, 154, 123),
            yellow: Color::Rgb(196, 178, 138),
            magenta: Color::Rgb(162, 146, 163),
            gray: Color::Rgb(164, 167, 164),
        }
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    parse_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid hex color '{}'", s)))
}

fn parse_hex(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#').filter(|h| h.len() == 6 && h.is_ascii())?;
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

/// Reads `theme.toml` if present. A missing file means the built-in theme.
pub fn load_theme(path: &Path) -> Result<Theme> {
    if !path.exists() {
        return Ok(Theme::default());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read theme file at {:?}", path))?;
    toml::from_str(&text).with_context(|| format!("Failed to parse theme file at {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_default_theme() {
        let dir = tempfile::tempdir().unwrap();
        let theme = load_theme(&dir.path().join(THEME_FILE_NAME)).unwrap();
        assert_eq!(theme, Theme::default());
    }

    #[test]
    fn partial_file_overrides_only_given_colors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(THEME_FILE_NAME);
        fs::write(&path, "work = \"#000000\"\nbreak = \"#0000ff\"\n").unwrap();

        let theme = load_theme(&path).unwrap();
        assert_eq!(theme.work, Color::Rgb(0, 0, 0));
        assert_eq!(theme.rest, Color::Rgb(0, 0, 255));
        assert_eq!(theme.gray, Theme::default().gray);
    }

    #[test]
    fn bad_hex_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(THEME_FILE_NAME);
        fs::write(&path, "work = \"blue\"\n").unwrap();

        assert!(load_theme(&path).is_err());
    }
}
