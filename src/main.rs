//! usbio - Scriptable SPI/I2C commands for FT4222H USB bridges
//!
//! Adapters come from a backend selected with `--backend`; scripts and the
//! REPL drive them through the command layer in `usbio-core`.

mod backends;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::List => commands::list_adapters(&cli.backend),
        Commands::ListBackends => {
            commands::list_backends();
            Ok(())
        }
        Commands::Run { file } => commands::cmd_run(&cli.backend, cli.frequency, &file),
        Commands::Repl { open } => commands::cmd_repl(&cli.backend, cli.frequency, open),
    }
}
