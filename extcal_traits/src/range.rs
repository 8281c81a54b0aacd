use std::fmt;
use std::str::FromStr;

/// Full-scale reading of a 16-bit A/D.
pub const MAX_COUNTS: u16 = u16::MAX;

/// Input ranges supported by the AI16 family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputRange {
    #[default]
    Unipolar10V,
    Bipolar10V,
    Unipolar5V,
    Bipolar5V,
    Unipolar2V,
    Bipolar2V,
    Unipolar1V,
    Bipolar1V,
}

impl InputRange {
    pub const ALL: [InputRange; 8] = [
        InputRange::Unipolar10V,
        InputRange::Bipolar10V,
        InputRange::Unipolar5V,
        InputRange::Bipolar5V,
        InputRange::Unipolar2V,
        InputRange::Bipolar2V,
        InputRange::Unipolar1V,
        InputRange::Bipolar1V,
    ];

    #[inline]
    pub fn min_volts(self) -> f64 {
        match self {
            InputRange::Unipolar10V
            | InputRange::Unipolar5V
            | InputRange::Unipolar2V
            | InputRange::Unipolar1V => 0.0,
            InputRange::Bipolar10V => -10.0,
            InputRange::Bipolar5V => -5.0,
            InputRange::Bipolar2V => -2.0,
            InputRange::Bipolar1V => -1.0,
        }
    }

    #[inline]
    pub fn span_volts(self) -> f64 {
        match self {
            InputRange::Unipolar10V => 10.0,
            InputRange::Bipolar10V => 20.0,
            InputRange::Unipolar5V => 5.0,
            InputRange::Bipolar5V => 10.0,
            InputRange::Unipolar2V => 2.0,
            InputRange::Bipolar2V => 4.0,
            InputRange::Unipolar1V => 1.0,
            InputRange::Bipolar1V => 2.0,
        }
    }

    /// Ideal (uncalibrated) conversion of a raw reading to volts.
    pub fn counts_to_volts(self, counts: u16) -> f64 {
        f64::from(counts) / f64::from(MAX_COUNTS) * self.span_volts() + self.min_volts()
    }

    /// Ideal conversion of volts to a raw reading, rounded and clamped to the count range.
    pub fn volts_to_counts(self, volts: f64) -> u16 {
        let raw = (f64::from(MAX_COUNTS) * (volts - self.min_volts()) / self.span_volts()).round();
        if raw.is_nan() || raw <= 0.0 {
            0
        } else if raw >= f64::from(MAX_COUNTS) {
            MAX_COUNTS
        } else {
            raw as u16
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InputRange::Unipolar10V => "0-10V",
            InputRange::Bipolar10V => "+/-10V",
            InputRange::Unipolar5V => "0-5V",
            InputRange::Bipolar5V => "+/-5V",
            InputRange::Unipolar2V => "0-2V",
            InputRange::Bipolar2V => "+/-2V",
            InputRange::Unipolar1V => "0-1V",
            InputRange::Bipolar1V => "+/-1V",
        }
    }
}

impl fmt::Display for InputRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRange(pub String);

impl fmt::Display for UnknownRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown input range '{}'", self.0)
    }
}

impl std::error::Error for UnknownRange {}

impl FromStr for InputRange {
    type Err = UnknownRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_uppercase().replace("+/-", "PM").replace('±', "PM");
        let range = match norm.as_str() {
            "0-10V" => InputRange::Unipolar10V,
            "PM10V" | "10V" => InputRange::Bipolar10V,
            "0-5V" => InputRange::Unipolar5V,
            "PM5V" | "5V" => InputRange::Bipolar5V,
            "0-2V" => InputRange::Unipolar2V,
            "PM2V" | "2V" => InputRange::Bipolar2V,
            "0-1V" => InputRange::Unipolar1V,
            "PM1V" | "1V" => InputRange::Bipolar1V,
            _ => return Err(UnknownRange(s.to_string())),
        };
        Ok(range)
    }
}

/// A/D acquisition settings applied before an external calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdcSetup {
    pub range: InputRange,
    pub differential: bool,
    pub oversample: u8,
    pub discard_first_sample: bool,
    /// Scan all channels per trigger instead of one.
    pub scan_trigger: bool,
}

impl Default for AdcSetup {
    fn default() -> Self {
        Self {
            range: InputRange::Unipolar10V,
            differential: false,
            oversample: 100,
            discard_first_sample: true,
            scan_trigger: true,
        }
    }
}
