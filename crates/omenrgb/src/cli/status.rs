//! `status` subcommand — show every zone color and the backlight state.

use std::path::Path;

use super::{
    Backlight, BacklightJson, EmulatedBios, Options, Result, StatusOutput, Zone, ZoneJson, kv,
    kv_indent, kv_width, open_backlight, print_json,
};

fn collect_status(backlight: &Backlight<EmulatedBios>, image: &Path) -> Result<StatusOutput> {
    let colors = backlight.zone_colors()?;
    let state = backlight.backlight_state()?;
    Ok(StatusOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        image_file: image.display().to_string(),
        zones: Zone::ALL
            .into_iter()
            .zip(colors)
            .map(|(z, c)| ZoneJson::new(z, c))
            .collect(),
        backlight: BacklightJson::new(state),
    })
}

fn print_status(status: &StatusOutput, json: bool) -> Result<()> {
    if json {
        return print_json(status);
    }

    let w = kv_width(
        &["Version:", "Image:", "Backlight:"],
        &["Zone 0:", "Zone 1:", "Zone 2:", "Zone 3:"],
    );
    kv("Version:", &status.version, w);
    kv("Image:", &status.image_file, w);
    println!();
    println!("Zones:");
    for z in &status.zones {
        kv_indent(&format!("Zone {}:", z.zone), &z.color, w);
    }
    println!();
    kv("Backlight:", &status.backlight.state, w);
    Ok(())
}

pub(super) fn cmd_status(opts: &Options) -> Result<()> {
    let config = super::load_config(opts.config.as_deref());
    let image = super::image_path(opts, &config)?;
    let backlight = open_backlight(&image)?;
    let status = collect_status(&backlight, &image)?;
    log::debug!(
        "zones {:?}, backlight {}",
        status.zones.iter().map(|z| &z.color).collect::<Vec<_>>(),
        status.backlight.state
    );
    print_status(&status, opts.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ZoneColor;
    use omenrgb_lib::protocol::BRIGHTNESS_OFF;

    #[test]
    fn collect_status_reads_image_state() {
        let backlight = Backlight::new(EmulatedBios::new());
        backlight
            .set_zone_color(Zone::ALL[1], ZoneColor::new(0x12, 0x34, 0x56))
            .unwrap();
        backlight.transport().set_brightness_byte(BRIGHTNESS_OFF);

        let status = collect_status(&backlight, Path::new("/tmp/fw.json")).unwrap();
        assert_eq!(status.zones.len(), 4);
        assert_eq!(status.zones[1].color, "#123456");
        assert_eq!(status.zones[0].color, "#000000");
        assert_eq!(status.backlight.state, "off");
        assert!(!status.backlight.on);
    }

    #[test]
    fn print_status_human_and_json_succeed() {
        let backlight = Backlight::new(EmulatedBios::new());
        let status = collect_status(&backlight, Path::new("/tmp/fw.json")).unwrap();
        assert!(print_status(&status, false).is_ok());
        assert!(print_status(&status, true).is_ok());
    }

    #[test]
    fn cmd_status_with_missing_image_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let opts = crate::cli::test_options(dir.path());
        assert!(cmd_status(&opts).is_ok());
        // Read-only command: no image written
        assert!(!dir.path().join("firmware.json").exists());
    }
}
