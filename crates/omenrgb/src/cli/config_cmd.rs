//! `config` subcommand — show current configuration and file paths.

use super::{
    Config, ConfigFilesJson, ConfigOutput, Options, Result, kv, kv_indent, kv_width, parse_color,
    print_json,
};

pub(super) fn cmd_config(opts: &Options) -> Result<()> {
    let custom_path = opts.config.as_deref();
    let config = super::load_config(custom_path);
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    let image = opts.image.clone().or_else(|| config.image_path());
    let image_exists = image.as_ref().is_some_and(|p| p.exists());

    if opts.json {
        let output = ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
            files: ConfigFilesJson {
                image_file: image.as_ref().map(|p| p.display().to_string()),
                image_file_exists: image_exists,
            },
        };
        return print_json(&output);
    }

    // Human-readable output
    let w = kv_width(
        &["Config file:"],
        &[
            "all_zones:",
            "zone_colors:",
            "power:",
            "brightness_percent:",
            "backlight:",
            "Firmware image:",
        ],
    );

    match &config_path {
        Some(p) => {
            if config_exists {
                kv("Config file:", format_args!("{} (loaded)", p.display()), w);
            } else {
                kv(
                    "Config file:",
                    format_args!("{} (not found, using defaults)", p.display()),
                    w,
                );
            }
        }
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    let color_label = |value: &str| {
        if value.trim().is_empty() {
            return "(unchanged)".to_string();
        }
        match parse_color(value) {
            Ok(c) => format!("{value} -> {}", super::format_color(c)),
            Err(_) => format!("{value} (invalid)"),
        }
    };
    kv_indent("all_zones:", color_label(&config.all_zones), w);
    let mut keys: Vec<&String> = config.zone_colors.keys().collect();
    keys.sort();
    if keys.is_empty() {
        kv_indent("zone_colors:", "(none)", w);
    }
    for key in keys {
        kv_indent(
            &format!("zone {key}:"),
            color_label(&config.zone_colors[key]),
            w,
        );
    }
    kv_indent("power:", if config.power { "on" } else { "off (zones black)" }, w);
    if config.brightness_percent > 100 {
        kv_indent(
            "brightness_percent:",
            format_args!("{} (treated as 100)", config.brightness_percent),
            w,
        );
    } else {
        kv_indent("brightness_percent:", config.brightness_percent, w);
    }
    let backlight = if config.backlight.trim().is_empty() {
        "(unchanged)"
    } else {
        config.backlight.as_str()
    };
    kv_indent("backlight:", backlight, w);
    println!();

    println!("Files:");
    match &image {
        Some(p) => {
            let status = if image_exists { "present" } else { "not found" };
            kv_indent(
                "Firmware image:",
                format_args!("{} ({status})", p.display()),
                w,
            );
        }
        None => kv_indent("Firmware image:", "(no data directory)", w),
    }
    Ok(())
}
