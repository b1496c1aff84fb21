//! Background colours for canvases and rotation fill.
//!
//! Accepted forms, with or without a leading `#`:
//!
//! | Form | Example | Meaning |
//! |---|---|---|
//! | `rgb` | `f00` | each digit doubled, opaque |
//! | `rgba` | `f008` | each digit doubled |
//! | `rrggbb` | `ff0000` | opaque |
//! | `rrggbbaa` | `ff000080` | explicit alpha |

use image::Rgba;

/// An RGBA colour with 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse a hex colour. Returns `None` for anything not in the table above.
    pub fn from_hex(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let short = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
        let long = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

        match hex.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgb(long(0)?, long(2)?, long(4)?)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }
}

impl From<Color> for Rgba<u8> {
    fn from(c: Color) -> Self {
        Rgba([c.r, c.g, c.b, c.a])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_forms() {
        assert_eq!(Color::from_hex("fff"), Some(Color::rgb(255, 255, 255)));
        assert_eq!(Color::from_hex("#0a0"), Some(Color::rgb(0, 170, 0)));
        assert_eq!(Color::from_hex("ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(Color::from_hex("#00000080"), Some(Color::rgba(0, 0, 0, 128)));
        assert_eq!(Color::from_hex("f008"), Some(Color::rgba(255, 0, 0, 136)));
    }

    #[test]
    fn rejects_malformed_specs() {
        for input in ["", "#", "ff", "fffff", "ggg", "red", "#12345", "ÿÿÿ"] {
            assert_eq!(Color::from_hex(input), None, "{input:?} should not parse");
        }
    }

    #[test]
    fn converts_to_rgba_pixel() {
        let px: Rgba<u8> = Color::rgba(1, 2, 3, 4).into();
        assert_eq!(px, Rgba([1, 2, 3, 4]));
    }
}
