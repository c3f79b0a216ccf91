//! `backlight` subcommand — show or switch the keyboard backlight.

use super::{
    BacklightJson, Options, Result, kv, kv_width, modify_image, open_backlight, print_json,
};

pub(super) fn cmd_backlight(opts: &Options, state: Option<&str>) -> Result<()> {
    let config = super::load_config(opts.config.as_deref());
    let image = super::image_path(opts, &config)?;

    let current = match state {
        Some(state) => modify_image(&image, |backlight| {
            backlight.set_brightness(state == "on")?;
            Ok(backlight.backlight_state()?)
        })?,
        None => open_backlight(&image)?.backlight_state()?,
    };
    if opts.json {
        return print_json(&BacklightJson::new(current));
    }
    let w = kv_width(&["Backlight:"], &[]);
    kv("Backlight:", current, w);
    Ok(())
}
