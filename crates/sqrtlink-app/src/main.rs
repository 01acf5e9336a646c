mod backend;
mod prompt;
mod settings;

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sqrtlink_core::DeviceSession;

use crate::settings::{Backend, Settings};

/// Send numbers to the FPGA square-root peripheral over SPI.
#[derive(Debug, Parser)]
#[command(name = "sqrtlink", version, about)]
struct Cli {
    /// Settings file (defaults to <config dir>/sqrtlink/settings.json)
    #[arg(long, env = "SQRTLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Which bus/reset backend to use
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Shorthand for --backend simulated
    #[arg(long, conflicts_with = "backend")]
    simulate: bool,

    /// SPI bus number
    #[arg(long)]
    bus: Option<u8>,

    /// SPI chip select
    #[arg(long)]
    cs: Option<u8>,

    /// SPI clock in Hz
    #[arg(long)]
    clock_hz: Option<u32>,

    /// BCM number of the reset pin
    #[arg(long)]
    reset_pin: Option<u8>,

    /// Reset pulse hold time in milliseconds
    #[arg(long)]
    hold_ms: Option<u64>,

    /// Wait after the operand write in milliseconds
    #[arg(long)]
    settle_ms: Option<u64>,

    /// Compute a single value and exit instead of prompting
    #[arg(long)]
    value: Option<String>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if self.simulate {
            settings.backend = Backend::Simulated;
        }
        if let Some(backend) = self.backend {
            settings.backend = backend;
        }
        if let Some(bus) = self.bus {
            settings.spi.bus = bus;
        }
        if let Some(cs) = self.cs {
            settings.spi.chip_select = cs;
        }
        if let Some(hz) = self.clock_hz {
            settings.spi.clock_hz = hz;
        }
        if let Some(pin) = self.reset_pin {
            settings.reset_pin = pin;
        }
        if let Some(ms) = self.hold_ms {
            settings.reset_hold_ms = ms;
        }
        if let Some(ms) = self.settle_ms {
            settings.settle_ms = ms;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let path = cli.config.clone().or_else(Settings::default_path);
    let mut settings = match &path {
        Some(p) => Settings::load(p)?,
        None => Settings::default(),
    };
    cli.apply(&mut settings);

    if cli.save {
        let p = path
            .as_deref()
            .context("no config directory on this platform; pass --config")?;
        settings.save(p)?;
        log::info!("saved settings to {}", p.display());
    }

    let (bus, pin) = backend::open(&settings)?;
    let mut session = DeviceSession::new(bus, pin, settings.session_config())
        .context("initialising reset line")?;

    let stdout = io::stdout();
    match cli.value.as_deref() {
        Some(value) => prompt::run_once(&mut session, value, &mut stdout.lock())?,
        None => prompt::run(&mut session, io::stdin().lock(), stdout.lock())?,
    }

    log::debug!("frame log:\n{}", session.frame_log().to_text(true));
    Ok(())
}
