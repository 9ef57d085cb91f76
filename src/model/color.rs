use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Colour of a tracker card. Stored as a `#RRGGBB` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Strict parsing. Accepts surrounding whitespace, an optional `#` and any case.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let rgb = u32::from_str_radix(hex, 16).ok()?;
        let [_, r, g, b] = rgb.to_be_bytes();
        Some(Self { r, g, b })
    }

    /// Lenient parsing used for stored values. Anything unreadable becomes white.
    pub fn from_hex(hex: &str) -> Self {
        Self::parse_hex(hex).unwrap_or(Self::WHITE)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

impl From<String> for Rgb {
    fn from(value: String) -> Self {
        Rgb::from_hex(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn hex_formatting_is_upper_case() {
        assert_eq!(Rgb::new(0xfd, 0x4c, 0x49).to_hex(), "#FD4C49");
        assert_eq!(Rgb::new(0, 0, 0).to_hex(), "#000000");
    }

    #[test]
    fn hex_parsing_accepts_loose_input() {
        assert_eq!(
            Rgb::parse_hex("  #fd4c49 "),
            Some(Rgb::new(0xFD, 0x4C, 0x49))
        );
        assert_eq!(Rgb::parse_hex("33CF69"), Some(Rgb::new(0x33, 0xCF, 0x69)));
    }

    #[test]
    fn unreadable_hex_falls_back_to_white() {
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#GGGGGG"), None);
        assert_eq!(Rgb::from_hex("not a colour"), Rgb::WHITE);
    }
}
