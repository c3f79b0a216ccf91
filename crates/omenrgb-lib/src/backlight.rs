//! Zone state coordinator — zone colors and backlight on/off over the query channel.
//!
//! The firmware only exposes whole-table get/set, so every zone write is a
//! read-modify-write of the 128-byte table. The table lock is held across the
//! full fetch → patch → commit span (and across plain reads), which keeps two
//! concurrent zone writes from losing each other's patch. Brightness lives in
//! separate firmware state and has its own lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::color::ZoneColor;
use crate::protocol::*;
use crate::query::{QueryChannel, Result};
use crate::table::{ColorTable, Zone};
use crate::transport::WmiTransport;

/// Backlight state byte as reported by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklightState {
    On,
    Off,
    /// Neither sentinel. Reported as off by [`Backlight::get_brightness`].
    Unrecognized(u8),
}

impl BacklightState {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            BRIGHTNESS_ON => BacklightState::On,
            BRIGHTNESS_OFF => BacklightState::Off,
            other => BacklightState::Unrecognized(other),
        }
    }

    pub fn from_on(on: bool) -> Self {
        if on {
            BacklightState::On
        } else {
            BacklightState::Off
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            BacklightState::On => BRIGHTNESS_ON,
            BacklightState::Off => BRIGHTNESS_OFF,
            BacklightState::Unrecognized(b) => b,
        }
    }

    pub fn is_on(self) -> bool {
        self == BacklightState::On
    }
}

impl std::fmt::Display for BacklightState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BacklightState::On => write!(f, "on"),
            BacklightState::Off => write!(f, "off"),
            BacklightState::Unrecognized(b) => write!(f, "unrecognized (0x{b:02X})"),
        }
    }
}

/// Keyboard backlight controller.
///
/// Holds no copy of firmware state between calls; safe to share across
/// threads when the transport is.
pub struct Backlight<T> {
    channel: QueryChannel<T>,
    table_lock: Mutex<()>,
    brightness_lock: Mutex<()>,
}

fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    // The guarded value is `()`, so a poisoned lock carries no broken state.
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: WmiTransport> Backlight<T> {
    pub fn new(transport: T) -> Self {
        Backlight {
            channel: QueryChannel::new(transport),
            table_lock: Mutex::new(()),
            brightness_lock: Mutex::new(()),
        }
    }

    pub fn transport(&self) -> &T {
        self.channel.transport()
    }

    // ── Color table ──

    /// Caller must hold `table_lock`.
    fn fetch_table(&self) -> Result<ColorTable> {
        let mut buf = [0u8; COLOR_TABLE_SIZE];
        self.channel.perform_query(
            QUERY_COLOR_GET,
            CMD_BACKLIGHT,
            &mut buf,
            COLOR_TABLE_SIZE,
            COLOR_TABLE_SIZE,
        )?;
        Ok(ColorTable::from_bytes(buf))
    }

    /// Caller must hold `table_lock`.
    fn commit_table(&self, table: &ColorTable) -> Result<()> {
        let mut buf = *table.as_bytes();
        self.channel.perform_query(
            QUERY_COLOR_SET,
            CMD_BACKLIGHT,
            &mut buf,
            COLOR_TABLE_SIZE,
            COLOR_TABLE_SIZE,
        )
    }

    /// Read-modify-write of the color table under the table lock.
    ///
    /// If the fetch fails nothing is written. If the commit fails the error
    /// is returned and the local copy is dropped.
    fn modify_table(&self, patch: impl FnOnce(&mut ColorTable)) -> Result<()> {
        let _guard = acquire(&self.table_lock);
        let mut table = self.fetch_table()?;
        patch(&mut table);
        self.commit_table(&table)
    }

    /// Fresh snapshot of the whole table.
    pub fn read_table(&self) -> Result<ColorTable> {
        let _guard = acquire(&self.table_lock);
        self.fetch_table()
    }

    pub fn get_zone_color(&self, zone: Zone) -> Result<ZoneColor> {
        Ok(self.read_table()?.zone_color(zone))
    }

    /// All four zones from a single fetch.
    pub fn zone_colors(&self) -> Result<[ZoneColor; ZONE_COUNT]> {
        Ok(self.read_table()?.zone_colors())
    }

    pub fn set_zone_color(&self, zone: Zone, color: ZoneColor) -> Result<()> {
        self.modify_table(|table| table.set_zone_color(zone, color))?;
        log::debug!("zone {zone} set to {color}");
        Ok(())
    }

    /// Patch several zones in one read-modify-write. `None` leaves a zone as
    /// the firmware has it. All-`None` skips the firmware entirely.
    pub fn set_zone_colors(&self, colors: [Option<ZoneColor>; ZONE_COUNT]) -> Result<()> {
        if colors.iter().all(Option::is_none) {
            return Ok(());
        }
        self.modify_table(|table| {
            for (zone, color) in Zone::ALL.into_iter().zip(colors) {
                if let Some(color) = color {
                    table.set_zone_color(zone, color);
                }
            }
        })?;
        log::debug!("zones set to {colors:?}");
        Ok(())
    }

    pub fn set_all_zones(&self, color: ZoneColor) -> Result<()> {
        self.set_zone_colors([Some(color); ZONE_COUNT])
    }

    // ── Brightness ──

    /// Raw backlight state, distinguishing unrecognized bytes.
    pub fn backlight_state(&self) -> Result<BacklightState> {
        let _guard = acquire(&self.brightness_lock);
        let mut data = [0u8; 1];
        self.channel.perform_query(
            QUERY_BRIGHTNESS_GET,
            CMD_BACKLIGHT,
            &mut data,
            1,
            1,
        )?;
        Ok(BacklightState::from_byte(data[0]))
    }

    /// `true` only for the "on" sentinel; anything else reads as off.
    pub fn get_brightness(&self) -> Result<bool> {
        let state = self.backlight_state()?;
        if let BacklightState::Unrecognized(b) = state {
            log::debug!("unrecognized backlight byte 0x{b:02X}, reporting off");
        }
        Ok(state.is_on())
    }

    pub fn set_brightness(&self, on: bool) -> Result<()> {
        let _guard = acquire(&self.brightness_lock);
        let mut data = [BacklightState::from_on(on).to_byte()];
        self.channel.perform_query(
            QUERY_BRIGHTNESS_SET,
            CMD_BACKLIGHT,
            &mut data,
            1,
            1,
        )?;
        log::debug!("backlight set {}", if on { "on" } else { "off" });
        Ok(())
    }
}
