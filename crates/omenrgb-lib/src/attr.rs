//! Attribute boundary — text read/write entry points over [`Backlight`].
//!
//! Mirrors the kernel attribute files the backlight is exposed through:
//!
//! | attribute    | read          | write                     |
//! |--------------|---------------|---------------------------|
//! | `zone0`..`3` | `"RRGGBB\n"`  | six hex digits            |
//! | `brightness` | `"1\n"`/`"0\n"` | `"0"` or a non-zero integer |
//!
//! Writes return the number of input bytes consumed. Brightness is
//! best-effort in both directions: firmware failures are logged, not
//! returned.

use std::fmt;

use crate::backlight::Backlight;
use crate::color::ZoneColor;
use crate::query::FirmwareError;
use crate::table::Zone;
use crate::transport::WmiTransport;

// ── Error type ──

/// Attribute errors, split the way callers of an attribute file see them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrError {
    /// Bad zone, unparsable input.
    InvalidArgument(String),
    /// The firmware query behind the attribute failed.
    Io(FirmwareError),
}

impl fmt::Display for AttrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrError::InvalidArgument(e) => write!(f, "Invalid argument: {e}"),
            AttrError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for AttrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AttrError::Io(e) => Some(e),
            AttrError::InvalidArgument(_) => None,
        }
    }
}

impl From<FirmwareError> for AttrError {
    fn from(e: FirmwareError) -> Self {
        if e.is_io() {
            AttrError::Io(e)
        } else {
            AttrError::InvalidArgument(e.to_string())
        }
    }
}

impl From<AttrError> for std::io::Error {
    fn from(e: AttrError) -> Self {
        let kind = match e {
            AttrError::InvalidArgument(_) => std::io::ErrorKind::InvalidInput,
            AttrError::Io(_) => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, e)
    }
}

pub type Result<T> = std::result::Result<T, AttrError>;

// ── Attribute names ──

/// One exposed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Zone(Zone),
    Brightness,
}

impl Attribute {
    pub const BRIGHTNESS_NAME: &'static str = "brightness";

    /// Every attribute, in the order they are listed.
    pub fn all() -> impl Iterator<Item = Attribute> {
        Zone::ALL
            .into_iter()
            .map(Attribute::Zone)
            .chain(std::iter::once(Attribute::Brightness))
    }

    pub fn from_name(name: &str) -> Result<Self> {
        if name == Self::BRIGHTNESS_NAME {
            return Ok(Attribute::Brightness);
        }
        Ok(Attribute::Zone(Zone::from_attr_name(name)?))
    }

    pub fn name(self) -> String {
        match self {
            Attribute::Zone(z) => z.attr_name(),
            Attribute::Brightness => Self::BRIGHTNESS_NAME.to_string(),
        }
    }
}

// ── Read / write ──

pub fn show_zone<T: WmiTransport>(backlight: &Backlight<T>, zone: Zone) -> Result<String> {
    let color = backlight.get_zone_color(zone)?;
    Ok(format!("{color}\n"))
}

pub fn store_zone<T: WmiTransport>(
    backlight: &Backlight<T>,
    zone: Zone,
    input: &str,
) -> Result<usize> {
    let color =
        ZoneColor::from_hex(input).map_err(|e| AttrError::InvalidArgument(e.to_string()))?;
    backlight.set_zone_color(zone, color)?;
    Ok(input.len())
}

/// Never fails: a firmware error reads as `"0\n"`.
pub fn show_brightness<T: WmiTransport>(backlight: &Backlight<T>) -> String {
    let on = backlight.get_brightness().unwrap_or_else(|e| {
        log::warn!("brightness read failed, reporting off: {e}");
        false
    });
    format!("{}\n", u8::from(on))
}

/// Only unparsable input fails; a firmware error is logged and the write
/// still reports the input as consumed.
pub fn store_brightness<T: WmiTransport>(backlight: &Backlight<T>, input: &str) -> Result<usize> {
    let value: u32 = input.trim().parse().map_err(|_| {
        AttrError::InvalidArgument(format!("brightness must be an integer, got {:?}", input.trim()))
    })?;
    if let Err(e) = backlight.set_brightness(value != 0) {
        log::warn!("brightness write failed: {e}");
    }
    Ok(input.len())
}

pub fn show<T: WmiTransport>(backlight: &Backlight<T>, attr: Attribute) -> Result<String> {
    match attr {
        Attribute::Zone(zone) => show_zone(backlight, zone),
        Attribute::Brightness => Ok(show_brightness(backlight)),
    }
}

pub fn store<T: WmiTransport>(
    backlight: &Backlight<T>,
    attr: Attribute,
    input: &str,
) -> Result<usize> {
    match attr {
        Attribute::Zone(zone) => store_zone(backlight, zone, input),
        Attribute::Brightness => store_brightness(backlight, input),
    }
}
