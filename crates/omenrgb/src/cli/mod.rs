//! CLI subcommands — zone colors, backlight state, config presets.

mod apply;
mod backlight;
mod config_cmd;
mod status;
mod zone;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use omenrgb_lib::attr;
pub(super) use omenrgb_lib::color::{format_color, parse_color};
pub(super) use omenrgb_lib::config::Config;
pub(super) use omenrgb_lib::emulator::EmulatedBios;
pub(super) use omenrgb_lib::error::Result;
pub(super) use omenrgb_lib::image::{FirmwareImage, ImageLock};
pub(super) use omenrgb_lib::{Backlight, BacklightState, OmenError, Zone, ZoneColor};

/// Global options shared by every subcommand.
pub struct Options {
    pub json: bool,
    pub config: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

/// Gap between the widest key and its value.
const KEY_GAP: usize = 2;
/// Prefix of nested (`kv_indent`) lines.
const INDENT: &str = "  ";

/// Value column shared by a block of `kv` lines (`top`) and `kv_indent`
/// lines (`nested`).
pub(super) fn kv_width(top: &[&str], nested: &[&str]) -> usize {
    let widest = |keys: &[&str], prefix: usize| {
        keys.iter()
            .map(|k| prefix + k.len() + KEY_GAP)
            .max()
            .unwrap_or(0)
    };
    widest(top, 0).max(widest(nested, INDENT.len()))
}

pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<w$}{value}")
}

fn format_kv_indent(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{INDENT}{}", format_kv(key, value, w.saturating_sub(INDENT.len())))
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv_indent(key, value, w));
}

pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json_str = serde_json::to_string_pretty(value)
        .map_err(|e| OmenError::Config(format!("JSON serialization failed: {e}")))?;
    println!("{json_str}");
    Ok(())
}

// ── Config / image plumbing ──

/// Load config from `custom` if given, else from the platform default.
pub(super) fn load_config(custom: Option<&Path>) -> Config {
    match custom {
        Some(path) => {
            let (config, warnings) = Config::load_from(path);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

/// `--image` wins over the config's `image_path`.
pub(super) fn image_path(opts: &Options, config: &Config) -> Result<PathBuf> {
    opts.image
        .clone()
        .or_else(|| config.image_path())
        .ok_or_else(|| {
            OmenError::Config("no data directory for the firmware image; pass --image".into())
        })
}

/// Read-only view of the image; writers go through [`modify_image`].
pub(super) fn open_backlight(path: &Path) -> Result<Backlight<EmulatedBios>> {
    let bios = FirmwareImage::load(path)?.to_bios()?;
    log::debug!("firmware image: {}", path.display());
    Ok(Backlight::new(bios))
}

/// Load the image, run `f`, and save the result, all under the image lock.
/// Nothing is saved if `f` fails.
pub(super) fn modify_image<R>(
    path: &Path,
    f: impl FnOnce(&Backlight<EmulatedBios>) -> Result<R>,
) -> Result<R> {
    let _lock = ImageLock::acquire(path)?;
    let backlight = open_backlight(path)?;
    let out = f(&backlight)?;
    FirmwareImage::from_bios(backlight.transport()).save_to(path)?;
    Ok(out)
}

/// Which zones a `set` applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ZoneTarget {
    One(Zone),
    All,
}

/// Parse `0`..`3`, `zone0`..`zone3` or `all`.
pub(super) fn parse_zone_target(s: &str) -> Result<ZoneTarget> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("all") {
        return Ok(ZoneTarget::All);
    }
    let zone = match s.parse::<usize>() {
        Ok(n) => Zone::new(n)?,
        Err(_) => Zone::from_attr_name(s)?,
    };
    Ok(ZoneTarget::One(zone))
}

pub(super) fn parse_zone(s: &str) -> Result<Zone> {
    match parse_zone_target(s)? {
        ZoneTarget::One(zone) => Ok(zone),
        ZoneTarget::All => Err(OmenError::Config(
            "\"all\" is not a single zone; use 0-3".into(),
        )),
    }
}

/// One-line summary of a zone for human output.
pub(super) fn zone_line(zone: Zone, color: ZoneColor) -> String {
    format!("Zone {zone}: {}", format_color(color))
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ZoneJson {
    pub zone: usize,
    pub color: String,
}

impl ZoneJson {
    pub fn new(zone: Zone, color: ZoneColor) -> Self {
        ZoneJson {
            zone: zone.index(),
            color: format_color(color),
        }
    }
}

#[derive(Serialize)]
pub(super) struct BacklightJson {
    pub state: String,
    pub on: bool,
}

impl BacklightJson {
    pub fn new(state: BacklightState) -> Self {
        BacklightJson {
            state: state.to_string(),
            on: state.is_on(),
        }
    }
}

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub image_file: String,
    pub zones: Vec<ZoneJson>,
    pub backlight: BacklightJson,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
    pub files: ConfigFilesJson,
}

#[derive(Serialize)]
pub(super) struct ConfigFilesJson {
    pub image_file: Option<String>,
    pub image_file_exists: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show all zone colors and the backlight state
    Status,

    /// Print one zone's color as RRGGBB
    Get {
        /// Zone number (0-3) or attribute name (zone0-zone3)
        zone: String,
    },

    /// Set one zone, or every zone, to a color
    Set {
        /// Zone number (0-3), attribute name (zone0-zone3), or "all"
        zone: String,
        /// Hex (#RRGGBB, RRGGBB, 0xRRGGBB) or a color name (red, cyan, off, ...)
        color: String,
    },

    /// Show the backlight state, or switch it on or off
    Backlight {
        #[arg(value_parser = ["on", "off"])]
        state: Option<String>,
    },

    /// Apply the zone colors and backlight state from the config file
    Apply,

    /// Show current configuration and file paths
    Config,
}

/// Warn if `--json` was passed to a command that doesn't support it.
fn warn_json_unsupported(cmd_name: &str) {
    log::warn!("--json is not supported for `{cmd_name}` (ignored)");
}

pub fn run(cmd: Command, opts: &Options) -> Result<()> {
    match cmd {
        Command::Status => status::cmd_status(opts),
        Command::Get { zone } => zone::cmd_get(opts, &zone),
        Command::Set { zone, color } => {
            if opts.json {
                warn_json_unsupported("set");
            }
            zone::cmd_set(opts, &zone, &color)
        }
        Command::Backlight { state } => backlight::cmd_backlight(opts, state.as_deref()),
        Command::Apply => {
            if opts.json {
                warn_json_unsupported("apply");
            }
            apply::cmd_apply(opts)
        }
        Command::Config => config_cmd::cmd_config(opts),
    }
}

#[cfg(test)]
pub(super) fn test_options(dir: &Path) -> Options {
    Options {
        json: false,
        config: Some(dir.join("config.toml")),
        image: Some(dir.join("firmware.json")),
    }
}

#[cfg(test)]
mod format_tests {
    use super::*;

    #[test]
    fn status_block_width_follows_longest_top_key() {
        let w = kv_width(&["Version:", "Image:", "Backlight:"], &["Zone 0:", "Zone 3:"]);
        assert_eq!(w, "Backlight:".len() + KEY_GAP);
    }

    #[test]
    fn long_nested_key_pushes_the_column() {
        let w = kv_width(&["Config file:"], &["brightness_percent:"]);
        assert_eq!(w, INDENT.len() + "brightness_percent:".len() + KEY_GAP);
    }

    #[test]
    fn zone_lines_line_up_with_backlight_line() {
        let w = kv_width(&["Backlight:"], &["Zone 3:"]);
        let top = format_kv("Backlight:", "#on", w);
        let nested = format_kv_indent("Zone 3:", "#FF0080", w);
        assert_eq!(top.find('#'), nested.find('#'));
    }

    #[test]
    fn overlong_key_runs_into_value() {
        assert_eq!(format_kv("Firmware image:", "x", 4), "Firmware image:x");
        assert_eq!(format_kv_indent("power:", "on", 0), "  power:on");
    }

    #[test]
    fn no_keys_no_width() {
        assert_eq!(kv_width(&[], &[]), 0);
    }
}
