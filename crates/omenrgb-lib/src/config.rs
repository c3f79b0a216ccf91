//! Application configuration — TOML-based, platform-aware paths.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::{ZoneColor, parse_color};
use crate::error::{OmenError, Result};
use crate::protocol::ZONE_COUNT;

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str =
    "# omenrgb configuration — changes made outside the CLI may be overwritten.\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Firmware image file. Empty = platform data dir.
    #[serde(default)]
    pub image_path: String,

    /// Per-zone colors (0-based keys "0".."3"). Overrides `all_zones`.
    /// Example in TOML: `[zone_colors]` / `0 = "#FF0000"` / `3 = "cyan"`
    #[serde(default)]
    pub zone_colors: HashMap<String, String>,

    /// Color applied to every zone without its own entry. Empty = leave as is.
    #[serde(default)]
    pub all_zones: String,

    /// Backlight state to apply: "on", "off", or empty to leave as is.
    #[serde(default)]
    pub backlight: String,

    /// Lighting power. When false, `apply` writes black to every zone.
    #[serde(default = "default_true")]
    pub power: bool,

    /// Zone color brightness, 0-100. Larger values are treated as 100.
    #[serde(default = "default_brightness_percent")]
    pub brightness_percent: u8,
}

fn default_true() -> bool {
    true
}

fn default_brightness_percent() -> u8 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_path: String::new(),
            zone_colors: HashMap::new(),
            all_zones: String::new(),
            backlight: String::new(),
            power: true,
            brightness_percent: default_brightness_percent(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The `all_zones` color could not be parsed.
    InvalidAllZones(String),
    /// A `zone_colors` entry is invalid (bad color value or out-of-range key).
    InvalidZoneColor { zone: String, reason: String },
    /// The `backlight` field is not "on", "off" or empty.
    InvalidBacklight(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidAllZones(e) => write!(f, "Invalid all_zones: {e}"),
            ValidationError::InvalidZoneColor { zone, reason } => {
                write!(f, "Invalid zone_colors[{zone}]: {reason}")
            }
            ValidationError::InvalidBacklight(v) => {
                write!(f, "Invalid backlight: \"{v}\" (expected \"on\" or \"off\")")
            }
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("omenrgb"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Default firmware image location under the platform data dir.
    pub fn default_image_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("omenrgb").join("firmware.json"))
    }

    /// Configured image path, falling back to [`Config::default_image_path`].
    pub fn image_path(&self) -> Option<PathBuf> {
        let p = self.image_path.trim();
        if p.is_empty() {
            Self::default_image_path()
        } else {
            Some(PathBuf::from(p))
        }
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Load config from an arbitrary path, returning the config and any parse warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, vec![]),
                Err(e) => {
                    let warning = format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    );
                    (Self::default(), vec![warning])
                }
            },
            Err(_) => (Self::default(), vec![]),
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Parse the `backlight` field. `None` means leave the backlight alone.
    pub fn parse_backlight(&self) -> Result<Option<bool>> {
        match self.backlight.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "on" => Ok(Some(true)),
            "off" => Ok(Some(false)),
            other => Err(OmenError::Config(format!(
                "backlight must be \"on\" or \"off\", got \"{other}\""
            ))),
        }
    }

    /// Resolve `all_zones` and `zone_colors` into per-zone updates.
    ///
    /// Zones left as `None` are not touched when applied.
    pub fn zone_preset(&self) -> Result<[Option<ZoneColor>; ZONE_COUNT]> {
        let mut preset = [None; ZONE_COUNT];
        if !self.all_zones.trim().is_empty() {
            let color = parse_color(&self.all_zones)?;
            preset = [Some(color); ZONE_COUNT];
        }
        for (key, value) in &self.zone_colors {
            let index = parse_zone_key(key).map_err(OmenError::Config)?;
            preset[index] = Some(parse_color(value)?);
        }
        Ok(preset)
    }

    /// Zone updates for `apply`: the preset dimmed to `brightness_percent`,
    /// or black on every zone when `power` is off.
    pub fn effective_preset(&self) -> Result<[Option<ZoneColor>; ZONE_COUNT]> {
        if !self.power {
            return Ok([Some(ZoneColor::BLACK); ZONE_COUNT]);
        }
        let percent = self.brightness_percent.min(100);
        Ok(self.zone_preset()?.map(|c| c.map(|c| c.scaled(percent))))
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.all_zones.trim().is_empty()
            && let Err(e) = parse_color(&self.all_zones)
        {
            errors.push(ValidationError::InvalidAllZones(e.to_string()));
        }

        let mut keys: Vec<&String> = self.zone_colors.keys().collect();
        keys.sort();
        for key in keys {
            let value = &self.zone_colors[key];
            if let Err(reason) = parse_zone_key(key) {
                errors.push(ValidationError::InvalidZoneColor {
                    zone: key.clone(),
                    reason,
                });
            }
            if let Err(e) = parse_color(value) {
                errors.push(ValidationError::InvalidZoneColor {
                    zone: key.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if self.parse_backlight().is_err() {
            errors.push(ValidationError::InvalidBacklight(self.backlight.clone()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn parse_zone_key(key: &str) -> std::result::Result<usize, String> {
    match key.trim().parse::<usize>() {
        Ok(n) if n < ZONE_COUNT => Ok(n),
        Ok(n) => Err(format!(
            "zone {n} is out of range (expected 0-{})",
            ZONE_COUNT - 1
        )),
        Err(_) => Err(format!("key must be a 0-based zone number, got \"{key}\"")),
    }
}
