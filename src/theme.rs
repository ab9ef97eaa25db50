//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::presentation::{AssetKey, AssetResolver};
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Board and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    pub stone: Color,
    pub gold: Color,
    /// Outline of an unassigned (transparent) box.
    pub box_outline: Color,
    /// Checkerboard tile colours.
    pub tile_base: Color,
    pub tile_offset: Color,
    /// Hovered cell.
    pub highlight: Color,
    pub spark: Color,
    /// Background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (counters, status).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text.
    pub inactive_fg: Color,
}

/// Resolved look of one asset key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub symbol: &'static str,
    pub fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

impl Theme {
    /// One Dark defaults.
    pub const fn onedark_default() -> Self {
        Self {
            stone: rgb(0xABB2BF),
            gold: rgb(0xE5C07B),
            box_outline: rgb(0x61AFEF),
            tile_base: rgb(0x3F444F),
            tile_offset: rgb(0x353A44),
            highlight: rgb(0x56B6C2),
            spark: rgb(0xE5C07B),
            bg: rgb(0x282C34),
            div_line: rgb(0x3F444F),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
            inactive_fg: rgb(0x5C6370),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or file is missing.
    /// `palette` selects colour variant: Normal (theme), HighContrast, or Colorblind.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            Some(p) => {
                tracing::warn!(path = %p.display(), "theme file not found; using defaults");
                return Ok(Self::default_for_palette(palette));
            }
            None => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override brick colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.stone = rgb(0xFFFFFF);
                self.gold = rgb(0xFFFF00);
                self.box_outline = rgb(0x00FFFF);
                self.highlight = rgb(0xFF00FF);
            }
            crate::Palette::Colorblind => {
                // Blue/orange pair stays distinct for red-green deficiencies.
                self.stone = rgb(0x0077BB);
                self.gold = rgb(0xEE7733);
                self.box_outline = rgb(0x009988);
                self.highlight = rgb(0xBBBB00);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str], fallback: Color| {
            keys.iter()
                .find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()))
                .unwrap_or(fallback)
        };
        let d = Self::onedark_default();
        Self {
            stone: get(&["stone", "main_fg"], d.stone),
            gold: get(&["gold", "title"], d.gold),
            box_outline: get(&["box_outline", "cpu_box"], d.box_outline),
            tile_base: get(&["tile_base", "div_line"], d.tile_base),
            tile_offset: get(&["tile_offset", "meter_bg"], d.tile_offset),
            highlight: get(&["highlight", "hi_fg"], d.highlight),
            spark: get(&["spark", "title"], d.spark),
            bg: get(&["main_bg"], d.bg),
            div_line: get(&["div_line"], d.div_line),
            main_fg: get(&["main_fg"], d.main_fg),
            title: get(&["title"], d.title),
            inactive_fg: get(&["inactive_fg"], d.inactive_fg),
        }
    }

    pub fn brick_color(&self, brick_type: crate::board::BrickType) -> Color {
        match brick_type {
            crate::board::BrickType::Stone => self.stone,
            crate::board::BrickType::Gold => self.gold,
        }
    }
}

impl AssetResolver for Theme {
    type Asset = Sprite;

    fn resolve(&self, key: AssetKey) -> Sprite {
        match key {
            AssetKey::TransparentBox => Sprite {
                symbol: "·",
                fg: self.box_outline,
            },
            AssetKey::StoneTile => Sprite {
                symbol: "▓",
                fg: self.stone,
            },
            AssetKey::GoldTile => Sprite {
                symbol: "█",
                fg: self.gold,
            },
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    if !s.is_ascii() {
        return Err(ThemeError::InvalidHex(s.to_string()));
    }
    let channel = |hex: &str| {
        u8::from_str_radix(hex, 16).map_err(|_| ThemeError::InvalidHex(s.to_string()))
    };
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(ThemeError::InvalidHex(s.to_string())),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_invalid() {
        assert!(matches!(parse_hex("#12345"), Err(ThemeError::InvalidHex(_))));
        assert!(matches!(parse_hex("#GGGGGG"), Err(ThemeError::InvalidHex(_))));
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[gold]="#FFD700""##);
        assert_eq!(map.get("gold"), Some(&"#FFD700".to_string()));
    }

    #[test]
    fn test_from_map_falls_back() {
        let map = parse_theme_file(
            "theme[gold]=\"#FFD700\"\ntheme[hi_fg]=\"#010203\"\ntheme[stone]=\"bad\"",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.gold, Color::Rgb(0xFF, 0xD7, 0x00));
        assert_eq!(theme.highlight, Color::Rgb(1, 2, 3));
        assert_eq!(theme.stone, Theme::onedark_default().stone);
    }

    #[test]
    fn test_resolver_follows_palette() {
        let mut theme = Theme::default();
        theme.apply_palette(crate::Palette::Colorblind);
        assert_eq!(theme.resolve(AssetKey::StoneTile).fg, rgb(0x0077BB));
        assert_eq!(theme.resolve(AssetKey::GoldTile).fg, theme.gold);
        assert_eq!(theme.resolve(AssetKey::TransparentBox).symbol, "·");
    }
}
