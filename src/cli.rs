//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u64
fn parse_hex_u64(s: &str) -> Result<u64, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u64>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "usbio")]
#[command(author, version, about = "Scriptable FT4222H SPI/I2C bridge commands", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Adapter backend, as name[:key=value,...] (e.g. dummy:adapters=2,i2c=0x50+0x51)
    #[arg(short, long, default_value = "dummy", global = true)]
    pub backend: String,

    /// SPI clock in kHz selected before the script runs
    #[arg(short, long, value_parser = parse_hex_u64, global = true)]
    pub frequency: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the adapters the backend detects
    List,

    /// List the available backends
    ListBackends,

    /// Run a Scheme script of bridge commands
    Run {
        /// Script file
        #[arg(default_value = "usbio.scm")]
        file: PathBuf,
    },

    /// Start the interactive Scheme REPL
    Repl {
        /// Open this adapter before the first prompt
        #[arg(short, long)]
        open: Option<usize>,
    },
}
