use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod build;
mod error;

use crate::build::{ChipArgs, ReticleArgs};
use crate::error::ErrorCode;

#[derive(Parser)]
#[command(
    name = "spirogen",
    version,
    about = "Photomask layout generator for spiral transmission-line chips"
)]
struct Cli {
    /// Log level: error, warn, info, debug or trace
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build one chip layout from a chip config
    Chip {
        /// Chip configuration file (YAML or JSON)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        output: PathBuf,

        /// Override the nominal conductor width (and the final faux-CPW
        /// stage) without editing the config
        #[arg(long, value_name = "UM")]
        center_width: Option<f64>,

        /// Artwork outlines (JSON polygons) to cut into the ground plane
        #[arg(long, value_name = "FILE")]
        artwork: Option<PathBuf>,

        /// Mask layer for artwork outlines
        #[arg(long, value_name = "LAYER", default_value_t = 90)]
        artwork_layer: u16,
    },
    /// Build every member chip of a reticle config and compose them
    Reticle {
        /// Reticle configuration file (YAML or JSON)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        output: PathBuf,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let help = matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            );
            let _ = err.print();
            std::process::exit(if help { 0 } else { ErrorCode::Usage as i32 });
        }
    };

    init_tracing(&cli.log_level);

    let result = match cli.command {
        Command::Chip {
            config,
            output,
            center_width,
            artwork,
            artwork_layer,
        } => build::run_chip(ChipArgs {
            config,
            output,
            center_width,
            artwork,
            artwork_layer,
        }),
        Command::Reticle { config, output } => build::run_reticle(ReticleArgs { config, output }),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(err.code as i32);
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
