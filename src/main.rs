// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use snapcam::backends::camera::Facing;
use snapcam::config::{CaptureBackendType, Config};
use snapcam::i18n;
use std::path::PathBuf;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "snapcam")]
#[command(about = "Take a photo, check it, keep it")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Use an image file as the camera instead of a V4L2 device
    #[arg(long, global = true, value_name = "IMAGE")]
    source: Option<PathBuf>,

    /// Photo library folder (default: ~/Pictures/Camera)
    #[arg(long, global = true, value_name = "DIR")]
    library: Option<PathBuf>,

    /// V4L2 device to use as the front camera
    #[arg(long, global = true, value_name = "DEVICE")]
    front_device: Option<String>,

    /// V4L2 device to use as the back camera
    #[arg(long, global = true, value_name = "DEVICE")]
    back_device: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive camera screen (default)
    Ui,

    /// List available cameras
    List,

    /// Take a photo and save it to the library
    Photo {
        /// Camera to use
        #[arg(short, long, value_enum, default_value = "back")]
        facing: FacingArg,

        /// Turn the torch on while capturing
        #[arg(short, long)]
        torch: bool,

        /// Open the saved photo in the default viewer
        #[arg(short, long)]
        open: bool,
    },

    /// Show camera and photo library permissions
    Permissions {
        /// Ask for permissions that are not granted yet
        #[arg(short, long)]
        request: bool,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FacingArg {
    Front,
    Back,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => Facing::Front,
            FacingArg::Back => Facing::Back,
        }
    }
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config {
            library_dir: self.library.clone(),
            front_device: self.front_device.clone(),
            back_device: self.back_device.clone(),
            ..Default::default()
        };
        if let Some(source) = &self.source {
            config.backend = CaptureBackendType::File;
            config.file_source = Some(source.clone());
        }
        config
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.config();

    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    init_logging(&config, interactive)?;

    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();
    i18n::init(&requested_languages);

    match cli.command {
        None | Some(Commands::Ui) => snapcam::terminal::run(config),
        Some(Commands::List) => cli::list_cameras(&config),
        Some(Commands::Photo { facing, torch, open }) => {
            cli::take_photo(&config, facing.into(), torch, open)
        }
        Some(Commands::Permissions { request }) => cli::show_permissions(&config, request),
        Some(Commands::Config) => cli::print_config(&config),
    }
}

/// Initialize logging
///
/// Set RUST_LOG to control the level (e.g. RUST_LOG=snapcam=debug). The
/// interactive screen owns the terminal, so it logs to a file instead.
fn init_logging(config: &Config, interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if interactive {
        let log_dir = config.log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("snapcam.log"))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
