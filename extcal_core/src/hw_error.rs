//! Maps `Box<dyn Error>` from trait boundaries to typed errors.
//!
//! The traits in `extcal_traits` use `Box<dyn Error + Send + Sync>`; this
//! module converts those for the session loop, with an optional
//! feature-gated path for `extcal_hardware::HwError` downcasting.

use crate::error::MeasurementError;

/// Map a failed A/D read on `channel` to a `MeasurementError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_read_error(channel: u8, e: &(dyn std::error::Error + 'static)) -> MeasurementError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<extcal_hardware::error::HwError>() {
            return match hw {
                extcal_hardware::error::HwError::Timeout => MeasurementError::Timeout { channel },
                other => MeasurementError::Device(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") || s.to_lowercase().contains("timed out") {
        MeasurementError::Timeout { channel }
    } else {
        MeasurementError::Device(s)
    }
}

/// Opaque message for collaborator failures the loop never inspects.
pub fn describe(e: &(dyn std::error::Error + 'static)) -> String {
    let mut msg = e.to_string();
    let mut src = e.source();
    while let Some(s) = src {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        src = s.source();
    }
    msg
}
