#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration point files for the external calibration tool.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Point CSV files record (or replay) the points of a session with a
//!   strict `volts,counts` header.
use std::path::{Path, PathBuf};

use extcal_traits::{AdcSetup, InputRange};
use serde::{Deserialize, Serialize};

/// Upper bound on points per session accepted by the vendor calibration routine.
pub const MAX_SESSION_POINTS: usize = 100;

/// Single-ended input channels on a USB-AI16-16 module.
pub const ADC_CHANNELS: u8 = 16;

/// Calibration point CSV schema.
///
/// Expected headers:
/// volts,counts
///
/// Example:
/// volts,counts
/// 0.5,3290
/// 9.5,62310
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PointRow {
    pub volts: f64,
    pub counts: u16,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceCfg {
    /// Product IDs to search for; empty means the whole AI16 family.
    pub product_ids: Vec<u16>,
    /// Use the device with this serial number instead of the first match.
    pub serial_number: Option<u64>,
    pub comm_timeout_ms: u64,
}

impl Default for DeviceCfg {
    fn default() -> Self {
        Self {
            product_ids: Vec::new(),
            serial_number: None,
            comm_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum RangeCfg {
    #[default]
    #[serde(rename = "0-10V")]
    Unipolar10V,
    #[serde(rename = "+/-10V")]
    Bipolar10V,
    #[serde(rename = "0-5V")]
    Unipolar5V,
    #[serde(rename = "+/-5V")]
    Bipolar5V,
    #[serde(rename = "0-2V")]
    Unipolar2V,
    #[serde(rename = "+/-2V")]
    Bipolar2V,
    #[serde(rename = "0-1V")]
    Unipolar1V,
    #[serde(rename = "+/-1V")]
    Bipolar1V,
}

impl From<RangeCfg> for InputRange {
    fn from(r: RangeCfg) -> Self {
        match r {
            RangeCfg::Unipolar10V => InputRange::Unipolar10V,
            RangeCfg::Bipolar10V => InputRange::Bipolar10V,
            RangeCfg::Unipolar5V => InputRange::Unipolar5V,
            RangeCfg::Bipolar5V => InputRange::Bipolar5V,
            RangeCfg::Unipolar2V => InputRange::Unipolar2V,
            RangeCfg::Bipolar2V => InputRange::Bipolar2V,
            RangeCfg::Unipolar1V => InputRange::Unipolar1V,
            RangeCfg::Bipolar1V => InputRange::Bipolar1V,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdcCfg {
    /// Channel the reference voltage is fed into
    pub channel: u8,
    pub range: RangeCfg,
    pub differential: bool,
    pub oversample: u8,
    pub discard_first_sample: bool,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            channel: 0,
            range: RangeCfg::Unipolar10V,
            differential: false,
            oversample: 100,
            discard_first_sample: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModeCfg {
    /// Operator types the A/D counts for each point
    Simulated,
    /// Counts are read from the A/D and confirmed by the operator
    #[default]
    Device,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionCfg {
    pub mode: ModeCfg,
    pub max_points: usize,
    /// Directory the calibration table file is written to
    pub output_dir: PathBuf,
}

impl Default for SessionCfg {
    fn default() -> Self {
        Self {
            mode: ModeCfg::Device,
            max_points: MAX_SESSION_POINTS,
            output_dir: PathBuf::from("."),
        }
    }
}

/// Parameters of the simulated device bus.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorCfg {
    pub product_id: u16,
    pub serial_number: u64,
    /// Gain error applied to ideal readings
    pub gain: f64,
    /// Offset error in counts applied after the gain
    pub offset_counts: f64,
    /// Voltages the simulated source cycles through, one per read
    pub source_volts: Vec<f64>,
    /// Fail every Nth read with a timeout (0 disables)
    pub fail_every: u32,
}

impl Default for SimulatorCfg {
    fn default() -> Self {
        Self {
            product_id: 0x8040,
            serial_number: 0x40e3_a2c1,
            gain: 1.002,
            offset_counts: 12.0,
            source_volts: vec![0.5, 2.5, 5.0, 7.5, 9.5],
            fail_every: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub device: DeviceCfg,
    pub adc: AdcCfg,
    pub session: SessionCfg,
    pub simulator: SimulatorCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Device
        if self.device.comm_timeout_ms == 0 {
            eyre::bail!("device.comm_timeout_ms must be >= 1");
        }
        if self.device.comm_timeout_ms > 60 * 1000 {
            eyre::bail!("device.comm_timeout_ms is unreasonably large (>60s)");
        }

        // ADC
        if self.adc.channel >= ADC_CHANNELS {
            eyre::bail!("adc.channel must be in [0, {}]", ADC_CHANNELS - 1);
        }

        // Session
        if self.session.max_points < 2 || self.session.max_points > MAX_SESSION_POINTS {
            eyre::bail!("session.max_points must be in [2, {MAX_SESSION_POINTS}]");
        }
        if self.session.output_dir.as_os_str().is_empty() {
            eyre::bail!("session.output_dir must not be empty");
        }

        // Simulator
        if !(self.simulator.gain.is_finite() && self.simulator.gain > 0.0) {
            eyre::bail!("simulator.gain must be finite and > 0");
        }
        if !self.simulator.offset_counts.is_finite() {
            eyre::bail!("simulator.offset_counts must be finite");
        }
        if self.simulator.source_volts.is_empty() {
            eyre::bail!("simulator.source_volts must list at least one voltage");
        }
        if self.simulator.source_volts.iter().any(|v| !v.is_finite()) {
            eyre::bail!("simulator.source_volts must all be finite");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got '{rot}'");
        }

        Ok(())
    }

    /// A/D settings to apply before collecting points.
    pub fn adc_setup(&self) -> AdcSetup {
        AdcSetup {
            range: self.adc.range.into(),
            differential: self.adc.differential,
            oversample: self.adc.oversample,
            discard_first_sample: self.adc.discard_first_sample,
            scan_trigger: true,
        }
    }

    pub fn comm_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.device.comm_timeout_ms)
    }
}

/// Read and validate a config file; a missing file yields the defaults.
pub fn load_config_file(path: &Path) -> eyre::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid configuration {:?}: {}", path, e))?;
    cfg.validate()
        .map_err(|e| eyre::eyre!("invalid configuration {:?}: {}", path, e))?;
    Ok(cfg)
}

pub fn load_points_csv(path: &Path) -> eyre::Result<Vec<PointRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open points CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["volts", "counts"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "points CSV must have headers 'volts,counts', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<PointRow>().enumerate() {
        match rec {
            Ok(row) if row.volts.is_finite() => rows.push(row),
            Ok(_) => eyre::bail!("invalid CSV row {}: volts must be finite", idx + 2),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    if rows.len() > MAX_SESSION_POINTS {
        eyre::bail!(
            "points CSV has {} rows, at most {MAX_SESSION_POINTS} are allowed",
            rows.len()
        );
    }
    Ok(rows)
}

pub fn write_points_csv(path: &Path, rows: &[PointRow]) -> eyre::Result<()> {
    // Header written by hand so an empty session still yields a loadable file
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| eyre::eyre!("create points CSV {:?}: {}", path, e))?;
    wtr.write_record(["volts", "counts"])
        .map_err(|e| eyre::eyre!("write points CSV {:?}: {}", path, e))?;
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| eyre::eyre!("write points CSV {:?}: {}", path, e))?;
    }
    wtr.flush()
        .map_err(|e| eyre::eyre!("flush points CSV {:?}: {}", path, e))?;
    Ok(())
}
