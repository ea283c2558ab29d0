//! Command-line surface over the capability directory.

pub mod devices;
pub mod matching;

use std::path::PathBuf;

use camdir_core::PixelFormat;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "camdir")]
#[command(about = "Inspect camera capture modes and pick the best match for a request")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to $CAMDIR_CONFIG or the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Indent JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List attached capture devices
    Devices,

    /// Print every capture mode of a device
    Caps {
        /// Device id as printed by `devices`
        device: String,
    },

    /// Pick the capture mode closest to a request
    Best {
        device: String,

        #[arg(long)]
        width: u32,

        #[arg(long)]
        height: u32,

        /// Requested frames per second
        #[arg(long)]
        fps: u32,

        /// Requested pixel format (omit for any)
        #[arg(long, value_parser = parse_pixel_format, default_value = "any")]
        format: PixelFormat,

        /// Also print every mode ranked by cost
        #[arg(long)]
        all: bool,
    },

    /// Print the mounting orientation of a device
    Orientation { device: String },

    /// Re-scan and print a device's capture modes at an interval
    Watch {
        device: String,

        /// Seconds between scans
        #[arg(long, default_value_t = 5)]
        interval: u64,

        /// Stop after this many scans (runs until interrupted if omitted)
        #[arg(long)]
        count: Option<u32>,
    },
}

fn parse_pixel_format(name: &str) -> Result<PixelFormat, String> {
    PixelFormat::from_name(name).ok_or_else(|| format!("unknown pixel format '{name}'"))
}
