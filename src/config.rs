//! Configuration management.
//!
//! Settings load from `config/{name}.toml` overlaid with `EC_DAQ__`-prefixed
//! environment variables (`EC_DAQ__SERIAL__PORT=/dev/ttyACM0`). Every field
//! carries a default so a partial file, or no file at all, still yields a
//! runnable configuration; only an explicitly requested file must exist.

use crate::error::{EcDaqError, EcResult};
use config::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub serial: SerialSettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub acquisition: AcquisitionSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Serial line parameters. The framing is fixed at 8N1, no flow control,
/// which is what every supported meter speaks.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SerialSettings {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Upper bound on how long one polling cycle waits for bytes.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeviceSettings {
    /// Meter model name, looked up in the adapter registry. An unknown name
    /// falls back to the default adapter with a warning; it never prevents
    /// startup.
    #[serde(default = "default_model")]
    pub model: String,
    /// Substitute the serial port with the synthetic generator.
    #[serde(default)]
    pub mock_data: bool,
    /// Pause between polling cycles against real hardware.
    #[serde(default = "default_measurement_interval_ms")]
    pub measurement_interval_ms: u64,
    /// Pause between synthetic readings in mock mode.
    #[serde(default = "default_mock_interval_ms")]
    pub mock_interval_ms: u64,
    /// Days of synthetic backlog seeded when mock mode starts. 0 disables;
    /// capped at 36_500 by [`Settings::validate`].
    #[serde(default = "default_mock_history_days")]
    pub mock_history_days: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AcquisitionSettings {
    /// Accumulation-buffer bound; a buffer that grows past this without a
    /// line terminator is discarded wholesale.
    #[serde(default = "default_max_line_bytes")]
    pub max_line_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageSettings {
    /// CSV log the `run` subcommand appends to.
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_model() -> String {
    "HACH Sension7".to_string()
}

fn default_measurement_interval_ms() -> u64 {
    100
}

fn default_mock_interval_ms() -> u64 {
    120_000
}

fn default_mock_history_days() -> u32 {
    7
}

fn default_max_line_bytes() -> usize {
    4096
}

fn default_csv_path() -> String {
    "conductivity_log.csv".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            serial: SerialSettings::default(),
            device: DeviceSettings::default(),
            acquisition: AcquisitionSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            mock_data: false,
            measurement_interval_ms: default_measurement_interval_ms(),
            mock_interval_ms: default_mock_interval_ms(),
            mock_history_days: default_mock_history_days(),
        }
    }
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self {
            max_line_bytes: default_max_line_bytes(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
        }
    }
}

impl Settings {
    /// Load `config/{name}.toml` (default name `default`) plus environment
    /// overrides. The default file may be absent; a name passed explicitly
    /// must resolve to a real file.
    pub fn new(config_name: Option<&str>) -> EcResult<Self> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        let settings = Config::builder()
            .add_source(config::File::with_name(&config_path).required(config_name.is_some()))
            .add_source(
                config::Environment::with_prefix("EC_DAQ")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Load settings from one explicit file, without environment overlay.
    pub fn from_path(path: &Path) -> EcResult<Self> {
        let settings = Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Reject values that deserialize fine but cannot drive a run.
    pub fn validate(&self) -> EcResult<()> {
        if self.serial.baud_rate == 0 {
            return Err(EcDaqError::Configuration(
                "serial.baud_rate must be non-zero".to_string(),
            ));
        }
        if self.device.measurement_interval_ms == 0 || self.device.mock_interval_ms == 0 {
            return Err(EcDaqError::Configuration(
                "measurement intervals must be at least 1 ms".to_string(),
            ));
        }
        if self.acquisition.max_line_bytes < 16 {
            return Err(EcDaqError::Configuration(format!(
                "acquisition.max_line_bytes = {} cannot hold a meter line",
                self.acquisition.max_line_bytes
            )));
        }
        if self.device.mock_history_days > 36_500 {
            return Err(EcDaqError::Configuration(format!(
                "device.mock_history_days = {} is beyond the 36500-day backlog limit",
                self.device.mock_history_days
            )));
        }
        Ok(())
    }
}
