//! omenrgb — per-zone RGB keyboard backlight control for HP Omen/Victus firmware.

pub mod attr;
pub mod backlight;
pub mod color;
pub mod config;
pub mod emulator;
pub mod error;
pub mod image;
pub mod protocol;
pub mod query;
pub mod table;
pub mod transport;

pub use backlight::{Backlight, BacklightState};
pub use color::ZoneColor;
pub use error::OmenError;
pub use query::{FirmwareError, QueryChannel};
pub use table::{ColorTable, Zone};
pub use transport::{TransportError, WmiReply, WmiTransport};
