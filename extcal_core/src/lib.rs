#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! External A/D calibration session logic (hardware-agnostic).
//!
//! All device interaction goes through the `extcal_traits` seams; the vendor
//! library (or the simulated bus) sits behind them.
//!
//! ## Architecture
//!
//! - **Points**: `CalibrationPoint` and the bounded `CalibrationTable` (`point` module)
//! - **Input**: parsing of operator text into voltages, counts and answers (`input` module)
//! - **Console**: line-oriented prompt/response over any `BufRead`/`Write` (`console` module)
//! - **Session**: the collect-then-submit loop (`session` module)
//! - **Device**: scoped device-manager lifetime, device selection and A/D setup (`device` module)

pub mod console;
pub mod conversions;
pub mod device;
pub mod error;
pub mod family;
pub mod hw_error;
pub mod input;
pub mod mocks;
pub mod point;
pub mod session;

pub use console::{Console, StdConsole};
pub use device::{
    DeviceSession, destination_for_serial, prepare_device, print_banner, print_devices,
    select_device,
};
pub use error::{BuildError, DeviceError, InputError, MeasurementError, SessionError};
pub use point::{CalibrationPoint, CalibrationTable, MAX_POINTS, MIN_POINTS, TableFull};
pub use session::{CalibrationSession, ReadingMode, SessionReport, measure};
