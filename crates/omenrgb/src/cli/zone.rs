//! `get` / `set` subcommands — read or write zone colors.

use super::{
    Options, Result, ZoneJson, ZoneTarget, attr, modify_image, open_backlight, parse_color,
    parse_zone, parse_zone_target, print_json, zone_line,
};

/// Prints the zone attribute text (`RRGGBB`), or a JSON object.
pub(super) fn cmd_get(opts: &Options, zone: &str) -> Result<()> {
    let zone = parse_zone(zone)?;
    let config = super::load_config(opts.config.as_deref());
    let backlight = open_backlight(&super::image_path(opts, &config)?)?;

    if opts.json {
        let color = backlight.get_zone_color(zone)?;
        return print_json(&ZoneJson::new(zone, color));
    }
    print!("{}", attr::show_zone(&backlight, zone)?);
    Ok(())
}

pub(super) fn cmd_set(opts: &Options, zone: &str, color: &str) -> Result<()> {
    let target = parse_zone_target(zone)?;
    let color = parse_color(color)?;
    let config = super::load_config(opts.config.as_deref());
    let image = super::image_path(opts, &config)?;

    modify_image(&image, |backlight| {
        match target {
            ZoneTarget::One(zone) => backlight.set_zone_color(zone, color)?,
            ZoneTarget::All => backlight.set_all_zones(color)?,
        }
        Ok(())
    })?;
    match target {
        ZoneTarget::One(zone) => println!("{}", zone_line(zone, color)),
        ZoneTarget::All => println!("All zones: {}", super::format_color(color)),
    }
    Ok(())
}
