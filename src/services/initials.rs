use ratatui::style::Color;
use sha2::{Digest, Sha256};

use crate::model::{TextTile, TileShape};

/// Renders a coloured tile carrying the leading characters of a text.
pub trait InitialsTileGenerator: Send + Sync {
    fn render(&self, text: &str, seed_text: &str, size: f32, shape: TileShape) -> TextTile;
}

const TILE_COLORS: [Color; 8] = [
    Color::Rgb(0xE5, 0x39, 0x35),
    Color::Rgb(0xD8, 0x1B, 0x60),
    Color::Rgb(0x8E, 0x24, 0xAA),
    Color::Rgb(0x39, 0x49, 0xAB),
    Color::Rgb(0x03, 0x9B, 0xE5),
    Color::Rgb(0x00, 0x89, 0x7B),
    Color::Rgb(0x7C, 0xB3, 0x42),
    Color::Rgb(0xF4, 0x51, 0x1E),
];

#[derive(Debug, Clone, Default)]
pub struct InitialsTile;

impl InitialsTileGenerator for InitialsTile {
    fn render(&self, text: &str, seed_text: &str, size: f32, shape: TileShape) -> TextTile {
        let digest = Sha256::digest(seed_text.as_bytes());
        TextTile {
            text: text.to_string(),
            seed: seed_text.to_string(),
            initials: initials(text),
            size,
            shape,
            background: TILE_COLORS[digest[0] as usize % TILE_COLORS.len()],
            foreground: Color::White,
        }
    }
}

/// First letter of up to two words, skipping room and user sigils.
pub fn initials(text: &str) -> String {
    let trimmed = text.trim_start_matches(['#', '@', '!', '+']);
    let letters: String = trimmed
        .split(|c: char| c.is_whitespace() || c == ':' || c == '-' || c == '_')
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn initials_skip_sigils() {
        assert_eq!(initials("#general:x"), "GX");
        assert_eq!(initials("Rust Lang Club"), "RL");
        assert_eq!(initials("alice"), "A");
        assert_eq!(initials("###"), "?");
        assert_eq!(initials(""), "?");
    }

    #[test]
    fn colour_follows_seed_not_text() {
        let a = InitialsTile.render("General", "#general:x", 24.0, TileShape::Rectangle);
        let b = InitialsTile.render("Renamed", "#general:x", 24.0, TileShape::Rectangle);
        assert_eq!(a.background, b.background);
        assert_eq!(a.text, "General");
        assert_eq!(a.seed, "#general:x");
        assert_eq!(a.shape, TileShape::Rectangle);
    }
}
