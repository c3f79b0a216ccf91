//! omenrgb CLI — per-zone keyboard backlight control for HP Omen/Victus laptops.
//!
//! Drives the backlight query protocol against a firmware image file, so every
//! command runs the same read-modify-write path the firmware sees.

use std::path::PathBuf;

use clap::Parser;

mod cli;

#[derive(Parser)]
#[command(
    name = "omenrgb-cli",
    version,
    about = "Per-zone keyboard backlight control for HP Omen/Victus laptops"
)]
struct Args {
    /// Output as JSON (for status, get, backlight, config)
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging (one line per firmware query)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Firmware image file (overrides the config's image_path)
    #[arg(long, global = true, value_name = "PATH")]
    image: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let opts = cli::Options {
        json: args.json,
        config: args.config,
        image: args.image,
    };

    if let Err(e) = cli::run(args.command, &opts) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
