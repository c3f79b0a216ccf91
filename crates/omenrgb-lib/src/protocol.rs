//! Protocol constants for the HP Omen/Victus BIOS backlight interface.
//!
//! All multi-byte fields on the wire are little-endian `u32`.
//!
//! ## Request frame
//!
//! ```text
//! [signature:u32][command:u32][query:u32][data_size:u32][data: max(data_size, 128) bytes]
//! ```
//!
//! ## Reply buffer
//!
//! ```text
//! [sigpass:u32][return_code:u32][payload...]
//! ```
//!
//! The method id passed to the firmware is the output size class, not a
//! method selector (see [`crate::query::SizeClass`]).

// ── Firmware call ──

/// WMI GUID of the HP BIOS query method. Shared with the stock `hp-wmi`
/// driver, never claimed.
pub const BIOS_GUID: &str = "5FB7F034-2C63-45E9-BE91-3D44E2C707E4";

/// Request signature (`"SECU"` little-endian).
pub const REQUEST_SIGNATURE: u32 = 0x5543_4553;

/// Request header: signature, command, query, data_size.
pub const REQUEST_HEADER_SIZE: usize = 16;

/// Minimum data area in a request frame. Shorter payloads are zero padded.
pub const REQUEST_MIN_DATA: usize = 128;

/// Reply header: sigpass, return_code.
pub const REPLY_HEADER_SIZE: usize = 8;

/// Largest payload (in either direction) the size classes can express.
pub const MAX_PAYLOAD: usize = 4096;

// ── Command families ──

/// Keyboard backlight subsystem.
pub const CMD_BACKLIGHT: u32 = 0x0002_0009;

// ── Backlight queries ──

/// Read the full 128-byte color table.
pub const QUERY_COLOR_GET: u32 = 0x02;

/// Write the full 128-byte color table.
pub const QUERY_COLOR_SET: u32 = 0x03;

/// Read the one-byte backlight state.
pub const QUERY_BRIGHTNESS_GET: u32 = 0x04;

/// Write the one-byte backlight state.
pub const QUERY_BRIGHTNESS_SET: u32 = 0x05;

// ── Color table layout ──

/// Size of the firmware color table.
pub const COLOR_TABLE_SIZE: usize = 128;

/// Byte offset of zone 0's red channel within the color table.
pub const ZONE_BASE_OFFSET: usize = 25;

/// Bytes per zone (R, G, B).
pub const ZONE_STRIDE: usize = 3;

/// Number of independently addressable zones.
pub const ZONE_COUNT: usize = 4;

// ── Brightness sentinels ──

/// Backlight on.
pub const BRIGHTNESS_ON: u8 = 0xE4;

/// Backlight off.
pub const BRIGHTNESS_OFF: u8 = 0x64;

// ── Firmware return codes ──

pub const RET_SUCCESS: u32 = 0x00;
pub const RET_WRONG_SIGNATURE: u32 = 0x02;
pub const RET_UNKNOWN_COMMAND: u32 = 0x03;
pub const RET_UNKNOWN_QUERY: u32 = 0x04;
pub const RET_INVALID_PARAMETERS: u32 = 0x05;

/// Human-readable name for a known firmware return code.
///
/// Only used for diagnostics; callers treat every non-zero code the same.
pub fn return_code_name(code: u32) -> Option<&'static str> {
    match code {
        RET_SUCCESS => Some("success"),
        RET_WRONG_SIGNATURE => Some("wrong signature"),
        RET_UNKNOWN_COMMAND => Some("unknown command"),
        RET_UNKNOWN_QUERY => Some("unknown command type"),
        RET_INVALID_PARAMETERS => Some("invalid parameters"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_spells_secu() {
        assert_eq!(&REQUEST_SIGNATURE.to_le_bytes(), b"SECU");
    }

    #[test]
    fn zones_fit_inside_table() {
        let last = ZONE_BASE_OFFSET + ZONE_COUNT * ZONE_STRIDE;
        assert!(last <= COLOR_TABLE_SIZE);
    }

    #[test]
    fn brightness_sentinels_differ() {
        assert_ne!(BRIGHTNESS_ON, BRIGHTNESS_OFF);
    }

    #[test]
    fn known_return_codes_have_names() {
        assert_eq!(return_code_name(RET_WRONG_SIGNATURE), Some("wrong signature"));
        assert_eq!(return_code_name(RET_INVALID_PARAMETERS), Some("invalid parameters"));
        assert_eq!(return_code_name(0xDEAD), None);
    }
}
