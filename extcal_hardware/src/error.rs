use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("device manager not open")]
    NotOpen,
    #[error("no device with serial number {0:#x}")]
    NoSuchDevice(u64),
    #[error("invalid channel {0}")]
    InvalidChannel(u8),
    #[error("A/D read timeout")]
    Timeout,
    #[error("invalid calibration points: {0}")]
    InvalidPoints(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
