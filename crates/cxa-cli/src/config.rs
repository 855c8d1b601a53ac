//! Configuration file and flag layering
//!
//! Settings come from three places, later ones winning: built-in defaults,
//! the TOML file given with `--config`, and command-line flags (or their
//! environment variables).

use anyhow::{Context, Result};
use cxa_bridge::{AmplifierConfig, BasicAuth, HttpServerConfig, MalformedFramePolicy};
use cxa_transport::SerialConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Layout of the TOML configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub serial: SerialSection,
    pub http: HttpSection,
    pub bridge: BridgeSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSection {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub retry_initial_ms: Option<u64>,
    pub retry_max_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpSection {
    pub bind: Option<String>,
    pub cors: bool,
    pub user: Option<String>,
    pub pwd: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeSection {
    pub gate_on_power: bool,
    pub malformed_frames: MalformedFramePolicy,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Values given on the command line. `None`/`false` defers to the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub baud: Option<u32>,
    pub bind: Option<String>,
    pub user: Option<String>,
    pub pwd: Option<String>,
    pub cors: bool,
    pub gate_on_power: bool,
    pub strict_frames: bool,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: String,
    pub serial: SerialConfig,
    pub http: HttpServerConfig,
    pub amplifier: AmplifierConfig,
    pub malformed_frames: MalformedFramePolicy,
}

impl Settings {
    pub fn resolve(file: FileConfig, flags: Overrides) -> Self {
        let mut serial = SerialConfig {
            baud_rate: flags
                .baud
                .or(file.serial.baud)
                .unwrap_or(cxa_core::DEFAULT_BAUD_RATE),
            ..Default::default()
        };
        if let Some(ms) = file.serial.retry_initial_ms {
            serial.retry_initial = Duration::from_millis(ms);
        }
        if let Some(ms) = file.serial.retry_max_ms {
            serial.retry_max = Duration::from_millis(ms);
        }

        let defaults = HttpServerConfig::default();
        let http = HttpServerConfig {
            bind: flags.bind.or(file.http.bind).unwrap_or(defaults.bind),
            cors_enabled: flags.cors || file.http.cors,
            auth: BasicAuth::from_parts(
                flags.user.or(file.http.user),
                flags.pwd.or(file.http.pwd),
            ),
        };

        let malformed_frames = if flags.strict_frames {
            MalformedFramePolicy::Fail
        } else {
            file.bridge.malformed_frames
        };

        Self {
            port: flags
                .port
                .or(file.serial.port)
                .unwrap_or_else(|| DEFAULT_PORT.to_string()),
            serial,
            http,
            amplifier: AmplifierConfig {
                gate_on_power: flags.gate_on_power || file.bridge.gate_on_power,
            },
            malformed_frames,
        }
    }
}
