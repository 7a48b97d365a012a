//! opsdeck - operator console for a two-device remote-operations backend
//!
//! This is the binary entry point: CLI parsing, logging, and dispatch to the
//! headless console or a one-shot subcommand.

mod headless;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;

use opsdeck_app::config::{self, Settings};
use opsdeck_core::{DeviceId, TransferDirection};

use headless::commands::parse_assignment;
use headless::oneshot::{run_oneshot, OneShot};

/// opsdeck - operator console for a two-device remote-operations backend
#[derive(Parser, Debug)]
#[command(name = "opsdeck")]
#[command(about = "Operator console for a two-device remote-operations backend", long_about = None)]
struct Args {
    /// Config file (default: <config_dir>/opsdeck/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding config and OPSDECK_BACKEND_URL
    #[arg(long, value_name = "URL", global = true)]
    backend: Option<String>,

    /// Device setting, e.g. `--set device1.host=10.0.0.1` (repeatable)
    #[arg(long = "set", value_name = "DEVICE.FIELD=VALUE", global = true)]
    set: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive line-command console with NDJSON output (default)
    Console,
    /// Write a commented default config file if none exists
    Init,
    /// Check that the backend is up
    Health,
    /// Test both device connections
    Test,
    /// List files on both devices
    Ls,
    /// Execute a shell command on one device
    Exec {
        /// Target device (device1 | device2)
        #[arg(long, short, default_value = "device1")]
        device: DeviceId,
        /// Command line to run
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Copy a file between the devices
    Transfer {
        source: String,
        dest: String,
        /// device1_to_device2 | device2_to_device1
        #[arg(long, default_value = "device1_to_device2")]
        direction: TransferDirection,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    opsdeck_core::logging::init()?;

    if let Some(Command::Init) = args.command {
        let path = match args.config {
            Some(path) => path,
            None => config::default_config_path()
                .ok_or_else(|| eyre!("no config directory on this platform; pass --config"))?,
        };
        if config::init_config_file(&path)? {
            eprintln!("Created {}", path.display());
        } else {
            eprintln!("{} already exists", path.display());
        }
        return Ok(());
    }

    let settings = build_settings(&args)?;

    let op = match args.command {
        None | Some(Command::Console) => {
            headless::runner::run_console(settings).await?;
            return Ok(());
        }
        Some(Command::Init) => return Ok(()),
        Some(Command::Health) => OneShot::Health,
        Some(Command::Test) => OneShot::Test,
        Some(Command::Ls) => OneShot::List,
        Some(Command::Exec { device, command }) => OneShot::Exec {
            device,
            command: command.join(" "),
        },
        Some(Command::Transfer {
            source,
            dest,
            direction,
        }) => OneShot::Transfer {
            source,
            dest,
            direction,
        },
    };

    if run_oneshot(settings, op).await? {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

/// Config file, then environment, then command-line overrides.
fn build_settings(args: &Args) -> color_eyre::Result<Settings> {
    let mut settings = config::load_settings(args.config.as_deref());

    if let Some(url) = &args.backend {
        settings.backend.base_url = url.clone();
    }

    for assignment in &args.set {
        let (device, field, value) = parse_assignment(assignment).map_err(|e| eyre!(e))?;
        settings.devices.get_mut(device).set(field, value);
    }

    Ok(settings)
}
