//! The firmware color table and zone addressing.
//!
//! Only the four 3-byte zone ranges are understood; every other byte is
//! opaque firmware state and must round-trip untouched. Zone writes go
//! through [`ColorTable::set_zone_color`], which touches exactly one zone's
//! range.

use std::fmt;
use std::ops::Range;

use crate::color::ZoneColor;
use crate::protocol::{COLOR_TABLE_SIZE, ZONE_BASE_OFFSET, ZONE_COUNT, ZONE_STRIDE};
use crate::query::{FirmwareError, Result};

// ── Zone ──

/// Validated zone index (`0..ZONE_COUNT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Zone(u8);

impl Zone {
    pub const ALL: [Zone; ZONE_COUNT] = [Zone(0), Zone(1), Zone(2), Zone(3)];

    pub fn new(index: usize) -> Result<Self> {
        if index < ZONE_COUNT {
            Ok(Zone(index as u8))
        } else {
            Err(FirmwareError::InvalidZone(index))
        }
    }

    /// Resolve an attribute name of the form `zoneN`.
    pub fn from_attr_name(name: &str) -> Result<Self> {
        let digits = name.strip_prefix("zone").ok_or_else(|| {
            FirmwareError::InvalidArgument(format!("not a zone attribute: {name}"))
        })?;
        let index: usize = digits.parse().map_err(|_| {
            FirmwareError::InvalidArgument(format!("not a zone attribute: {name}"))
        })?;
        Zone::new(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// First byte of this zone in the color table.
    pub fn offset(self) -> usize {
        ZONE_BASE_OFFSET + ZONE_STRIDE * self.index()
    }

    /// Byte range of this zone in the color table.
    pub fn range(self) -> Range<usize> {
        self.offset()..self.offset() + ZONE_STRIDE
    }

    pub fn attr_name(self) -> String {
        format!("zone{}", self.0)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for Zone {
    type Error = FirmwareError;

    fn try_from(index: usize) -> Result<Self> {
        Zone::new(index)
    }
}

// ── ColorTable ──

/// Local copy of the firmware's 128-byte backlight table.
///
/// Fetched fresh at the start of each read-modify-write and dropped at the
/// end; never cached across calls.
#[derive(Clone, PartialEq, Eq)]
pub struct ColorTable([u8; COLOR_TABLE_SIZE]);

impl ColorTable {
    pub fn zeroed() -> Self {
        ColorTable([0; COLOR_TABLE_SIZE])
    }

    pub fn from_bytes(bytes: [u8; COLOR_TABLE_SIZE]) -> Self {
        ColorTable(bytes)
    }

    /// Build from a slice that must be exactly [`COLOR_TABLE_SIZE`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; COLOR_TABLE_SIZE] = bytes.try_into().map_err(|_| {
            FirmwareError::MalformedReply(format!(
                "color table must be {COLOR_TABLE_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(ColorTable(arr))
    }

    pub fn as_bytes(&self) -> &[u8; COLOR_TABLE_SIZE] {
        &self.0
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8; COLOR_TABLE_SIZE] {
        &mut self.0
    }

    pub fn zone_slice(&self, zone: Zone) -> &[u8] {
        &self.0[zone.range()]
    }

    pub fn zone_color(&self, zone: Zone) -> ZoneColor {
        let o = zone.offset();
        ZoneColor::new(self.0[o], self.0[o + 1], self.0[o + 2])
    }

    pub fn set_zone_color(&mut self, zone: Zone, color: ZoneColor) {
        self.0[zone.range()].copy_from_slice(&color.to_bytes());
    }

    pub fn zone_colors(&self) -> [ZoneColor; ZONE_COUNT] {
        Zone::ALL.map(|z| self.zone_color(z))
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl fmt::Debug for ColorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorTable")
            .field("zones", &self.zone_colors())
            .finish_non_exhaustive()
    }
}
