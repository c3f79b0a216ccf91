//! Firmware image snapshots — the emulated BIOS state persisted as JSON.
//!
//! The 128-byte color table is stored base64-encoded next to the raw
//! brightness byte, so opaque table bytes survive a save/load cycle exactly.
//! Writers hold an [`ImageLock`] from load to save so concurrent processes
//! never lose each other's updates.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::emulator::EmulatedBios;
use crate::error::{OmenError, Result};
use crate::protocol::BRIGHTNESS_ON;
use crate::table::ColorTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareImage {
    /// Base64 of the 128-byte color table.
    pub table: String,
    /// Raw brightness byte as the firmware reports it.
    pub brightness: u8,
}

impl Default for FirmwareImage {
    fn default() -> Self {
        Self::from_parts(&ColorTable::zeroed(), BRIGHTNESS_ON)
    }
}

impl FirmwareImage {
    pub fn from_parts(table: &ColorTable, brightness: u8) -> Self {
        FirmwareImage {
            table: STANDARD.encode(table.as_bytes()),
            brightness,
        }
    }

    /// Decode the stored table.
    pub fn color_table(&self) -> Result<ColorTable> {
        let bytes = STANDARD
            .decode(self.table.trim())
            .map_err(|e| OmenError::Image(format!("table is not valid base64: {e}")))?;
        ColorTable::from_slice(&bytes).map_err(|e| OmenError::Image(e.to_string()))
    }

    /// Snapshot the firmware-held state of `bios`.
    pub fn from_bios(bios: &EmulatedBios) -> Self {
        Self::from_parts(&bios.table(), bios.brightness_byte())
    }

    /// Build an emulator holding this image's state.
    pub fn to_bios(&self) -> Result<EmulatedBios> {
        Ok(EmulatedBios::with_state(self.color_table()?, self.brightness))
    }

    /// Load an image, or the default image if `path` does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no firmware image at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let image: FirmwareImage = serde_json::from_str(&contents)
            .map_err(|e| OmenError::Image(format!("{}: {e}", path.display())))?;
        // Reject a bad table at load time rather than on first use.
        image.color_table()?;
        Ok(image)
    }

    /// Save atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| OmenError::Image(format!("serialize: {e}")))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &contents)?;
        if std::fs::rename(&tmp, path).is_err() {
            let result = std::fs::write(path, &contents);
            let _ = std::fs::remove_file(&tmp);
            result?;
        }
        Ok(())
    }
}

// ── Image lock ──

/// How long [`ImageLock::acquire`] waits for another writer.
const LOCK_WAIT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(10);
/// A lock file this old was left behind by a writer that died.
const STALE_LOCK: Duration = Duration::from_secs(30);

/// Advisory write lock on a firmware image: `<image>.lock`, created with
/// `create_new` and removed on drop.
#[derive(Debug)]
pub struct ImageLock {
    path: PathBuf,
}

impl ImageLock {
    /// Block until no other writer holds the image, then take it.
    pub fn acquire(image: &Path) -> Result<Self> {
        Self::acquire_within(image, LOCK_WAIT)
    }

    fn acquire_within(image: &Path, wait: Duration) -> Result<Self> {
        let path = lock_path(image);
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }

        let deadline = Instant::now() + wait;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    log::debug!("locked {}", path.display());
                    return Ok(ImageLock { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&path) {
                        log::warn!("removing stale image lock {}", path.display());
                        let _ = std::fs::remove_file(&path);
                        continue;
                    }
                    if Instant::now() >= deadline {
                        return Err(OmenError::Image(format!(
                            "{} is locked by another writer (remove {} if no other omenrgb is running)",
                            image.display(),
                            path.display()
                        )));
                    }
                    thread::sleep(LOCK_RETRY);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for ImageLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("failed to remove {}: {e}", self.path.display());
        }
    }
}

fn lock_path(image: &Path) -> PathBuf {
    let mut name = OsString::from(image.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

fn is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.elapsed().ok())
        .is_some_and(|age| age > STALE_LOCK)
}
