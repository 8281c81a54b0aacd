//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(
    name = "extcal",
    version,
    about = "External A/D calibration for USB-AI16-16 family modules"
)]
pub struct Cli {
    /// Path to config TOML (defaults apply when the file does not exist)
    #[arg(long, value_name = "FILE", default_value = "etc/extcal.toml")]
    pub config: PathBuf,

    /// Log and report errors as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace) [default: logging.level or warn]
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactively collect reference points and externally calibrate the A/D
    Calibrate {
        /// Type A/D counts by hand instead of reading them from the device
        #[arg(long, action = ArgAction::SetTrue)]
        simulate_counts: bool,
        /// Submit the points of an earlier --export-csv instead of collecting new ones
        #[arg(long, value_name = "FILE", conflicts_with_all = ["simulate_counts", "export_csv"])]
        replay: Option<PathBuf>,
        /// Calibrate the device with this serial number (hex, e.g. 40e3a2c1)
        #[arg(long, value_name = "HEX", value_parser = parse_serial)]
        serial: Option<u64>,
        /// Directory the calibration table is saved in (overrides session.output_dir)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Also write the collected points to this CSV file (volts,counts)
        #[arg(long, value_name = "FILE")]
        export_csv: Option<PathBuf>,
    },
    /// List devices on the bus
    List,
    /// Quick health check (device manager opens and enumerates)
    SelfCheck,
}

/// Serial numbers are shown in hex everywhere, so accept them that way, with or without `0x`.
pub fn parse_serial(s: &str) -> Result<u64, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|e| format!("invalid serial number '{s}': {e}"))
}
