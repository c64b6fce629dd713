use ratatui::style::Color;
use sha2::{Digest, Sha256};

use crate::model::Identicon;

/// Renders a deterministic pattern for a seed.
pub trait IdenticonGenerator: Send + Sync {
    fn render(&self, seed: &str, size: f32) -> Identicon;
}

/// Number of cells per side of the pattern.
pub const GRID: usize = 5;

/// Mirrored 5x5 pattern in up to three colours, picked from a SHA-256 of the seed.
#[derive(Debug, Clone, Default)]
pub struct PatternIdenticon;

impl IdenticonGenerator for PatternIdenticon {
    fn render(&self, seed: &str, size: f32) -> Identicon {
        let digest = Sha256::digest(seed.as_bytes());
        let palette = [
            hue_color(digest[0], digest[1]),
            hue_color(digest[2], digest[3]),
            hue_color(digest[4], digest[5]),
        ];

        let half = GRID.div_ceil(2);
        let mut cells = vec![vec![None; GRID]; GRID];
        for (row, cells_row) in cells.iter_mut().enumerate() {
            for col in 0..half {
                let byte = digest[6 + row * half + col];
                // Low bit decides whether the cell is filled, the rest picks the colour.
                if byte & 1 == 1 {
                    let color = palette[(byte as usize >> 1) % palette.len()];
                    cells_row[col] = Some(color);
                    cells_row[GRID - 1 - col] = Some(color);
                }
            }
        }

        Identicon {
            seed: seed.to_string(),
            size,
            cells,
            background: Color::Rgb(240, 240, 240),
        }
    }
}

/// Saturated colour from a hue byte, with the lightness nudged by a second byte.
fn hue_color(hue: u8, shade: u8) -> Color {
    let h = hue as f32 / 255.0 * 6.0;
    let sector = h.floor() as u8 % 6;
    let f = h - h.floor();
    let lo = 40.0 + (shade % 40) as f32;
    let hi = 220.0;
    let up = lo + (hi - lo) * f;
    let down = hi - (hi - lo) * f;
    let (r, g, b) = match sector {
        0 => (hi, up, lo),
        1 => (down, hi, lo),
        2 => (lo, hi, up),
        3 => (lo, down, hi),
        4 => (up, lo, hi),
        _ => (hi, lo, down),
    };
    Color::Rgb(r as u8, g as u8, b as u8)
}
