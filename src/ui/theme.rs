use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

/// A `#rrggbb` colour. Malformed values fail the theme parse instead of
/// rendering as some fallback colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hex(pub Color);

impl Hex {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Hex(Color::Rgb(r, g, b))
    }

    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Hex::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl Serialize for Hex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Color::Rgb(r, g, b) => serializer.serialize_str(&format!("#{r:02x}{g:02x}{b:02x}")),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Hex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Hex::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("expected a #rrggbb colour, got {text:?}")))
    }
}

/// Every slot here is drawn by at least one widget.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: Hex,
    pub fg: Hex,
    pub muted: Hex,
    /// The word being asked.
    pub prompt: Hex,
    pub accent: Hex,
    pub border: Hex,
    pub border_focused: Hex,
    pub header_bg: Hex,
    pub header_fg: Hex,
    pub bar_filled: Hex,
    pub bar_empty: Hex,
    pub cursor_bg: Hex,
    pub cursor_fg: Hex,
    pub error: Hex,
    pub warning: Hex,
    pub success: Hex,
}

impl Theme {
    /// User themes in `<config>/vocabr/themes/` shadow bundled ones.
    pub fn load(name: &str) -> Option<Self> {
        let filename = format!("{name}.toml");

        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir.join("vocabr").join("themes").join(&filename);
            if let Ok(content) = fs::read_to_string(&user_path) {
                match toml::from_str::<Theme>(&content) {
                    Ok(theme) => return Some(theme),
                    Err(e) => tracing::warn!(path = %user_path.display(), error = %e, "bad user theme"),
                }
            }
        }

        let file = ThemeAssets::get(&filename)?;
        let content = std::str::from_utf8(file.data.as_ref()).ok()?;
        toml::from_str::<Theme>(content).ok()
    }

    pub fn available_themes() -> Vec<String> {
        let mut names: Vec<String> = ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect();
        names.sort();
        names
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("catppuccin-mocha").unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

/// Catppuccin Mocha, used when no theme file can be read at all.
impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: Hex::rgb(0x1e, 0x1e, 0x2e),
            fg: Hex::rgb(0xcd, 0xd6, 0xf4),
            muted: Hex::rgb(0x7f, 0x84, 0x9c),
            prompt: Hex::rgb(0xf9, 0xe2, 0xaf),
            accent: Hex::rgb(0x89, 0xb4, 0xfa),
            border: Hex::rgb(0x45, 0x47, 0x5a),
            border_focused: Hex::rgb(0x89, 0xb4, 0xfa),
            header_bg: Hex::rgb(0x31, 0x32, 0x44),
            header_fg: Hex::rgb(0xcd, 0xd6, 0xf4),
            bar_filled: Hex::rgb(0x89, 0xb4, 0xfa),
            bar_empty: Hex::rgb(0x31, 0x32, 0x44),
            cursor_bg: Hex::rgb(0xf5, 0xe0, 0xdc),
            cursor_fg: Hex::rgb(0x1e, 0x1e, 0x2e),
            error: Hex::rgb(0xf3, 0x8b, 0xa8),
            warning: Hex::rgb(0xfa, 0xb3, 0x87),
            success: Hex::rgb(0xa6, 0xe3, 0xa1),
        }
    }
}

macro_rules! color_accessors {
    ($($slot:ident),* $(,)?) => {
        impl ThemeColors {
            $(pub fn $slot(&self) -> Color { self.$slot.0 })*
        }
    };
}

color_accessors!(
    bg, fg, muted, prompt, accent, border, border_focused, header_bg, header_fg,
    bar_filled, bar_empty, cursor_bg, cursor_fg, error, warning, success,
);
