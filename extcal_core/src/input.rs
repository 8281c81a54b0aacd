//! Parsing of operator console input.

use crate::error::InputError;

/// Blank (or whitespace-only) input ends point collection.
#[inline]
pub fn is_finish(line: &str) -> bool {
    line.trim().is_empty()
}

/// Parse a reference voltage. Rejects anything that is not a finite number.
pub fn parse_voltage(line: &str) -> Result<f64, InputError> {
    let text = line.trim();
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(InputError::Voltage(text.to_string())),
    }
}

/// Parse a raw A/D count in decimal or `0x` hexadecimal, limited to the 16-bit range.
pub fn parse_counts(line: &str) -> Result<u16, InputError> {
    let text = line.trim();
    let parsed = match text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse::<u16>(),
    };
    parsed.map_err(|_| InputError::Counts(text.to_string()))
}

/// Only `y` (either case) accepts a reading; everything else rejects it.
#[inline]
pub fn is_accept(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("y")
}
