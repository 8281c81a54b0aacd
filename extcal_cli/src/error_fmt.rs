//! Human-readable error descriptions and structured JSON error formatting.

use extcal_core::error::{BuildError, DeviceError, SessionError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(se) = err.downcast_ref::<SessionError>() {
        return match se {
            SessionError::InsufficientPoints { collected } => format!(
                "What happened: Only {collected} calibration point(s) were accepted.\nLikely causes: Input ended early or readings were rejected.\nHow to fix: Run the calibration again and accept at least two points."
            ),
            SessionError::Submission { destination, message } => format!(
                "What happened: The device rejected the calibration table for {destination} ({message}).\nLikely causes: The input voltages or measured counts are not unique and ascending.\nHow to fix: Restart the calibration with distinct reference voltages."
            ),
            SessionError::TableFull(full) => format!(
                "What happened: The replayed points do not fit the session ({full}).\nLikely causes: The CSV holds more rows than session.max_points.\nHow to fix: Raise session.max_points or trim the CSV."
            ),
            SessionError::Console(e) => format!(
                "What happened: Console input/output failed ({e}).\nLikely causes: stdin or stdout was closed.\nHow to fix: Run extcal from an interactive terminal."
            ),
        };
    }

    if let Some(de) = err.downcast_ref::<DeviceError>() {
        return match de {
            DeviceError::Open(msg) => format!(
                "What happened: The device manager could not be opened ({msg}).\nLikely causes: Missing USB permissions or the device library is unavailable.\nHow to fix: Check udev rules and cabling, then retry."
            ),
            DeviceError::SerialNotFound { serial } => format!(
                "What happened: No calibratable device with serial number {serial:#x} is on the bus.\nLikely causes: Wrong --serial or device.serial_number.\nHow to fix: Run `extcal list` to see connected devices."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: The device was unplugged or is not responding.\nHow to fix: Reconnect the device and re-run with --log-level=debug for detail."
            ),
        };
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: Invalid calibration settings ({be}).\nLikely causes: Out-of-range values in the [session] section.\nHow to fix: Edit the config file, then rerun."
        );
    }

    // String-based heuristics for errors coming from config loading
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("invalid configuration") {
        return format!(
            "What happened: Configuration is invalid.\nDetails: {msg}\nHow to fix: Edit the TOML config and try again."
        );
    }

    if lower.contains("replay points") {
        let cause = err
            .source()
            .map(|src| src.to_string())
            .unwrap_or_default();
        return format!(
            "What happened: The recorded points could not be loaded.\nDetails: {msg}: {cause}\nHow to fix: Pass a CSV written by --export-csv (header 'volts,counts')."
        );
    }

    if lower.contains("points csv") || lower.contains("export points") {
        return format!(
            "What happened: The collected points could not be exported.\nDetails: {msg}\nHow to fix: Check that the --export-csv directory exists and is writable."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Errors the session already explained on the console.
pub fn already_reported(err: &eyre::Report) -> bool {
    matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::InsufficientPoints { .. } | SessionError::Submission { .. })
    )
}

/// Stable exit codes per failure class.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(se) = err.downcast_ref::<SessionError>() {
        return match se {
            SessionError::InsufficientPoints { .. } => 3,
            SessionError::Submission { .. } => 4,
            SessionError::TableFull(_) => 5,
            SessionError::Console(_) => 1,
        };
    }
    if err.downcast_ref::<DeviceError>().is_some() || err.downcast_ref::<BuildError>().is_some() {
        return 5;
    }
    if err.to_string().to_ascii_lowercase().contains("invalid configuration") {
        return 5;
    }
    1
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(se) = err.downcast_ref::<SessionError>() {
        return match se {
            SessionError::InsufficientPoints { .. } => "InsufficientPoints",
            SessionError::Submission { .. } => "SubmissionRejected",
            SessionError::TableFull(_) => "TooManyPoints",
            SessionError::Console(_) => "Console",
        };
    }
    if err.downcast_ref::<DeviceError>().is_some() {
        return "Device";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = reason_name(err);
    let obj = match err.downcast_ref::<SessionError>() {
        Some(SessionError::InsufficientPoints { collected }) => {
            json!({ "reason": reason, "details": { "collected": collected }, "message": humanize(err) })
        }
        Some(SessionError::Submission { destination, .. }) => {
            json!({ "reason": reason, "details": { "destination": destination }, "message": humanize(err) })
        }
        _ => json!({ "reason": reason, "message": humanize(err) }),
    };
    obj.to_string()
}
