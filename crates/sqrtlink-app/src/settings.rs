use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqrtlink_core::{BusConfig, SessionConfig, DEFAULT_RESET_PIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// spidev bus plus a Raspberry Pi GPIO reset line
    Hardware,
    /// in-process model of the peripheral
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: Backend,
    #[serde(flatten)]
    pub spi: BusConfig,
    pub reset_pin: u8,
    pub reset_hold_ms: u64,
    pub settle_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: if cfg!(feature = "hardware") {
                Backend::Hardware
            } else {
                Backend::Simulated
            },
            spi: BusConfig::default(),
            reset_pin: DEFAULT_RESET_PIN,
            reset_hold_ms: 100,
            settle_ms: 100,
        }
    }
}

impl Settings {
    /// `<config dir>/sqrtlink/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sqrtlink").join("settings.json"))
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reset_hold: Duration::from_millis(self.reset_hold_ms),
            settle: Duration::from_millis(self.settle_ms),
            ..Default::default()
        }
    }
}
