use thiserror::Error;

use crate::point::TableFull;

/// Operator text that does not parse as the expected number. Recovered by re-prompting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("'{0}' is not a valid voltage")]
    Voltage(String),
    #[error("'{0}' is not a valid count value")]
    Counts(String),
}

/// A failed A/D read. Recovered by retrying the same point.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("A/D read timed out on channel {channel}")]
    Timeout { channel: u8 },
    #[error("{0}")]
    Device(String),
}

/// Terminal outcome of a calibration session that did not produce a table.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("you must provide at least two points (collected {collected})")]
    InsufficientPoints { collected: usize },
    #[error("external calibration into {destination} failed: {message}")]
    Submission { destination: String, message: String },
    #[error("replayed points do not fit: {0}")]
    TableFull(#[from] TableFull),
    #[error("console i/o: {0}")]
    Console(#[from] std::io::Error),
}

/// Failures talking to the device manager or preparing the A/D.
#[derive(Debug, Error, Clone)]
pub enum DeviceError {
    #[error("device manager failed to open: {0}")]
    Open(String),
    #[error("device manager failed to close: {0}")]
    Close(String),
    #[error("device enumeration failed: {0}")]
    Enumerate(String),
    #[error("no device with serial number {serial:#x} found")]
    SerialNotFound { serial: u64 },
    #[error("{step} failed: {message}")]
    Setup { step: &'static str, message: String },
    #[error("console i/o: {0}")]
    Console(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing destination")]
    MissingDestination,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
