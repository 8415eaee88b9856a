// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use snapcam::config::Config;
use snapcam::constants::app_info;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "snapcam")]
#[command(about = "Single-screen terminal camera: preview, capture, save")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/snapcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the camera screen in the terminal (default)
    Terminal,

    /// List available cameras
    List,

    /// Take a photo without the interactive screen
    Photo {
        /// Camera index to use (from 'snapcam list')
        #[arg(short, long, default_value = "0")]
        camera: usize,

        /// Output file or directory (default: ~/Pictures/snapcam/IMG_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=snapcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.or_else(Config::default_path);
    let config = match config_path.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::default(),
    };

    match cli.command {
        None | Some(Commands::Terminal) => snapcam::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photo { camera, output }) => cli::take_photo(&config, camera, output),
        Some(Commands::Config) => cli::print_config(&config, config_path.as_deref()),
    }
}
