//! Zone colors — raw 8-bit RGB triples, parsing and formatting.
//!
//! There is no color-space handling: what is parsed is what the firmware gets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OmenError, Result};

/// One zone's color as stored in the firmware table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ZoneColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl ZoneColor {
    pub const BLACK: ZoneColor = ZoneColor::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        ZoneColor { red, green, blue }
    }

    /// Build from a packed `0xRRGGBB` value. Bits above 24 are ignored.
    pub const fn from_rgb24(rgb: u32) -> Self {
        ZoneColor {
            red: ((rgb >> 16) & 0xFF) as u8,
            green: ((rgb >> 8) & 0xFF) as u8,
            blue: (rgb & 0xFF) as u8,
        }
    }

    pub const fn to_rgb24(self) -> u32 {
        ((self.red as u32) << 16) | ((self.green as u32) << 8) | self.blue as u32
    }

    pub fn to_bytes(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        ZoneColor::new(bytes[0], bytes[1], bytes[2])
    }

    /// Strict hex parser used at the attribute boundary.
    ///
    /// Accepts exactly six hex digits, optionally prefixed by `#` or `0x`.
    /// Surrounding whitespace (including the trailing newline of an
    /// `echo`-style write) is ignored.
    pub fn from_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(OmenError::Color(format!(
                "Invalid color: {s:?} (expected RRGGBB hex)"
            )));
        }
        let rgb = u32::from_str_radix(hex, 16)
            .map_err(|_| OmenError::Color(format!("Invalid hex color: {s}")))?;
        Ok(ZoneColor::from_rgb24(rgb))
    }

    /// Dim every channel to `percent` of its value, truncating.
    /// Values above 100 are treated as 100.
    pub fn scaled(self, percent: u8) -> Self {
        let p = u16::from(percent.min(100));
        let dim = |c: u8| (u16::from(c) * p / 100) as u8;
        ZoneColor::new(dim(self.red), dim(self.green), dim(self.blue))
    }
}

/// `RRGGBB`, uppercase, no prefix — the attribute text format.
impl fmt::Display for ZoneColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl FromStr for ZoneColor {
    type Err = OmenError;

    fn from_str(s: &str) -> Result<Self> {
        ZoneColor::from_hex(s)
    }
}

/// Parse a user-supplied color.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"0xff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`, `"off"`/`"black"`
pub fn parse_color(s: &str) -> Result<ZoneColor> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(ZoneColor::from_rgb24(0xFF0000)),
        "green" => return Ok(ZoneColor::from_rgb24(0x00FF00)),
        "blue" => return Ok(ZoneColor::from_rgb24(0x0000FF)),
        "white" => return Ok(ZoneColor::from_rgb24(0xFFFFFF)),
        "orange" => return Ok(ZoneColor::from_rgb24(0xFF8000)),
        "yellow" => return Ok(ZoneColor::from_rgb24(0xFFFF00)),
        "purple" => return Ok(ZoneColor::from_rgb24(0x8000FF)),
        "cyan" => return Ok(ZoneColor::from_rgb24(0x00FFFF)),
        "off" | "black" => return Ok(ZoneColor::BLACK),
        _ => {}
    }

    ZoneColor::from_hex(s).map_err(|_| {
        OmenError::Color(format!("Invalid color: {s} (use #RRGGBB or a color name)"))
    })
}

/// Format a zone color as `#RRGGBB` for human-facing output.
pub fn format_color(color: ZoneColor) -> String {
    format!("#{color}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── ZoneColor ──

    #[test]
    fn rgb24_splits_channels() {
        let c = ZoneColor::from_rgb24(0xFF0080);
        assert_eq!(c, ZoneColor::new(0xFF, 0x00, 0x80));
        assert_eq!(c.to_rgb24(), 0xFF0080);
    }

    #[test]
    fn rgb24_ignores_high_byte() {
        assert_eq!(ZoneColor::from_rgb24(0xAB12_3456), ZoneColor::new(0x12, 0x34, 0x56));
    }

    #[test]
    fn scaled_truncates_each_channel() {
        let c = ZoneColor::new(0xFF, 0x80, 0x01);
        assert_eq!(c.scaled(100), c);
        assert_eq!(c.scaled(0), ZoneColor::BLACK);
        // 255 * 0.5 = 127.5, 128 * 0.5 = 64, 1 * 0.5 = 0.5
        assert_eq!(c.scaled(50), ZoneColor::new(127, 64, 0));
        assert_eq!(c.scaled(29), ZoneColor::new(73, 37, 0));
    }

    #[test]
    fn scaled_caps_at_full_brightness() {
        let c = ZoneColor::new(0x10, 0x20, 0x30);
        assert_eq!(c.scaled(250), c);
    }

    #[test]
    fn display_is_uppercase_hex() {
        assert_eq!(ZoneColor::new(0xab, 0x01, 0xcd).to_string(), "AB01CD");
        assert_eq!(ZoneColor::BLACK.to_string(), "000000");
    }

    #[test]
    fn bytes_order_is_rgb() {
        let c = ZoneColor::new(1, 2, 3);
        assert_eq!(c.to_bytes(), [1, 2, 3]);
        assert_eq!(ZoneColor::from_bytes([1, 2, 3]), c);
    }

    // ── from_hex ──

    #[test]
    fn from_hex_plain() {
        assert_eq!(ZoneColor::from_hex("FF0080").unwrap(), ZoneColor::new(0xFF, 0, 0x80));
    }

    #[test]
    fn from_hex_trailing_newline() {
        assert_eq!(ZoneColor::from_hex("00ff00\n").unwrap(), ZoneColor::new(0, 0xFF, 0));
    }

    #[test]
    fn from_hex_prefixes() {
        let c = ZoneColor::new(0x12, 0x34, 0x56);
        assert_eq!(ZoneColor::from_hex("#123456").unwrap(), c);
        assert_eq!(ZoneColor::from_hex("0x123456").unwrap(), c);
        assert_eq!("0X123456".parse::<ZoneColor>().unwrap(), c);
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(ZoneColor::from_hex("FFF").is_err());
        assert!(ZoneColor::from_hex("FF00000").is_err());
        assert!(ZoneColor::from_hex("").is_err());
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(ZoneColor::from_hex("GGHHII").is_err());
        assert!(ZoneColor::from_hex("+12345").is_err());
        assert!(ZoneColor::from_hex("red").is_err());
    }

    // ── parse_color ──

    #[test]
    fn parse_named() {
        assert_eq!(parse_color("red").unwrap(), ZoneColor::new(0xFF, 0, 0));
        assert_eq!(parse_color("purple").unwrap(), ZoneColor::new(0x80, 0, 0xFF));
        assert_eq!(parse_color("off").unwrap(), ZoneColor::BLACK);
        assert_eq!(parse_color("black").unwrap(), ZoneColor::BLACK);
    }

    #[test]
    fn parse_named_case_insensitive() {
        assert_eq!(parse_color("  Cyan ").unwrap(), ZoneColor::new(0, 0xFF, 0xFF));
    }

    #[test]
    fn parse_hex() {
        assert_eq!(parse_color("#ff8000").unwrap(), ZoneColor::new(0xFF, 0x80, 0));
    }

    #[test]
    fn parse_invalid() {
        let err = parse_color("chartreuse").unwrap_err();
        assert!(err.to_string().contains("chartreuse"));
    }

    #[test]
    fn format_has_hash() {
        assert_eq!(format_color(ZoneColor::new(0xAB, 0x12, 0xCD)), "#AB12CD");
    }

    #[test]
    fn named_colors_format_back_to_themselves() {
        for name in ["red", "green", "blue", "white", "orange", "yellow", "purple", "cyan"] {
            let c = parse_color(name).unwrap();
            assert_eq!(parse_color(&format_color(c)).unwrap(), c, "{name}");
        }
    }
}
