//! `apply` subcommand — push the configured preset to the firmware.

use super::{OmenError, Options, Result, Zone, modify_image, zone_line};

pub(super) fn cmd_apply(opts: &Options) -> Result<()> {
    let config = super::load_config(opts.config.as_deref());
    if let Err(errors) = config.validate() {
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(OmenError::Config(joined.join("; ")));
    }
    let preset = config.effective_preset()?;
    let backlight_on = config.parse_backlight()?;

    if preset.iter().all(Option::is_none) && backlight_on.is_none() {
        println!("Nothing to apply (config sets no zone colors or backlight)");
        return Ok(());
    }

    let image = super::image_path(opts, &config)?;
    modify_image(&image, |backlight| {
        backlight.set_zone_colors(preset)?;
        if let Some(on) = backlight_on {
            backlight.set_brightness(on)?;
        }
        Ok(())
    })?;

    if !config.power {
        println!("Power off: all zones black");
    }
    for (zone, color) in Zone::ALL.into_iter().zip(preset) {
        if let Some(color) = color {
            println!("{}", zone_line(zone, color));
        }
    }
    if let Some(on) = backlight_on {
        println!("Backlight: {}", if on { "on" } else { "off" });
    }
    Ok(())
}
