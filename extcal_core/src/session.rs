//! Interactive external-calibration session.
//!
//! The loop collects `(volts, counts)` points from the operator and submits
//! them once to an [`ExternalCalibrator`]. Parse and read failures are
//! values handled at the call site: they re-prompt and never touch the table.

use std::io::{BufRead, Write};

use extcal_traits::{AnalogInput, ExternalCalibrator};

use crate::console::Console;
use crate::error::{BuildError, InputError, MeasurementError, SessionError};
use crate::hw_error::{describe, map_read_error};
use crate::input;
use crate::point::{CalibrationPoint, CalibrationTable, MAX_POINTS, MIN_POINTS};

/// Where the measured counts of each point come from. Fixed for a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadingMode {
    /// Operator types the raw counts.
    Simulated,
    /// Counts are read from the A/D and confirmed by the operator.
    #[default]
    Device,
}

/// Result of a session whose table was accepted by the calibrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub points: Vec<CalibrationPoint>,
    pub destination: String,
}

#[derive(Debug, Clone)]
pub struct CalibrationSession {
    channel: u8,
    capacity: usize,
    mode: ReadingMode,
    destination: String,
}

#[derive(Debug, Default)]
pub struct CalibrationSessionBuilder {
    channel: u8,
    capacity: Option<usize>,
    mode: ReadingMode,
    destination: Option<String>,
}

impl CalibrationSessionBuilder {
    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn mode(mut self, mode: ReadingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn build(self) -> Result<CalibrationSession, BuildError> {
        let destination = self.destination.ok_or(BuildError::MissingDestination)?;
        if destination.trim().is_empty() {
            return Err(BuildError::MissingDestination);
        }
        let capacity = self.capacity.unwrap_or(MAX_POINTS);
        if !(MIN_POINTS..=MAX_POINTS).contains(&capacity) {
            return Err(BuildError::InvalidConfig(
                "capacity must be between 2 and 100 points",
            ));
        }
        Ok(CalibrationSession {
            channel: self.channel,
            capacity,
            mode: self.mode,
            destination,
        })
    }
}

enum Acquired {
    Point(CalibrationPoint),
    Retry,
    Finish,
}

impl CalibrationSession {
    pub fn builder() -> CalibrationSessionBuilder {
        CalibrationSessionBuilder::default()
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel
    }

    #[inline]
    pub fn mode(&self) -> ReadingMode {
        self.mode
    }

    #[inline]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Collect points until blank input or capacity, then submit them exactly once.
    pub fn run<R, W, E, D>(
        &self,
        console: &mut Console<R, W, E>,
        device: &mut D,
    ) -> Result<SessionReport, SessionError>
    where
        R: BufRead,
        W: Write,
        E: Write,
        D: AnalogInput + ExternalCalibrator + ?Sized,
    {
        tracing::info!(
            channel = self.channel,
            capacity = self.capacity,
            mode = ?self.mode,
            "calibration session start"
        );
        let table = self.collect(console, device)?;
        self.submit(console, device, table)
    }

    /// Point collection only; never calls the calibrator.
    pub fn collect<R, W, E, D>(
        &self,
        console: &mut Console<R, W, E>,
        device: &mut D,
    ) -> Result<CalibrationTable, SessionError>
    where
        R: BufRead,
        W: Write,
        E: Write,
        D: AnalogInput + ?Sized,
    {
        let mut table = CalibrationTable::with_capacity_limit(self.capacity);
        while !table.is_full() {
            console.prompt(&format!(
                "Measuring calibration point {}:\n  Feed a voltage into channel {} and enter voltage here\n  (enter nothing to finish and calibrate A/D): ",
                table.len() + 1,
                self.channel
            ))?;
            let line = match console.read_line()? {
                Some(l) if !input::is_finish(&l) => l,
                _ => break,
            };
            let volts = match input::parse_voltage(&line) {
                Ok(v) => v,
                Err(e) => {
                    report_input_error(console, &e)?;
                    continue;
                }
            };
            let acquired = match self.mode {
                ReadingMode::Simulated => typed_counts(console, volts)?,
                ReadingMode::Device => self.measured_counts(console, device, volts)?,
            };
            match acquired {
                Acquired::Point(point) => {
                    if table.push(point).is_err() {
                        break;
                    }
                    tracing::info!(
                        index = table.len(),
                        volts = point.volts,
                        counts = point.counts,
                        "calibration point accepted"
                    );
                }
                Acquired::Retry => continue,
                Acquired::Finish => break,
            }
        }
        tracing::info!(collected = table.len(), "point collection finished");
        Ok(table)
    }

    /// Submit recorded points without prompting, e.g. the export of an earlier session.
    pub fn replay<R, W, E, D>(
        &self,
        console: &mut Console<R, W, E>,
        device: &mut D,
        points: &[CalibrationPoint],
    ) -> Result<SessionReport, SessionError>
    where
        R: BufRead,
        W: Write,
        E: Write,
        D: ExternalCalibrator + ?Sized,
    {
        let mut table = CalibrationTable::with_capacity_limit(self.capacity);
        for point in points {
            table.push(*point)?;
        }
        tracing::info!(points = table.len(), "replaying recorded points");
        console.say(&format!("Replaying {} calibration point(s)", table.len()))?;
        self.submit(console, device, table)
    }

    /// Submit a collected table, or report why it cannot be submitted.
    pub fn submit<R, W, E, D>(
        &self,
        console: &mut Console<R, W, E>,
        device: &mut D,
        table: CalibrationTable,
    ) -> Result<SessionReport, SessionError>
    where
        R: BufRead,
        W: Write,
        E: Write,
        D: ExternalCalibrator + ?Sized,
    {
        if table.len() < MIN_POINTS {
            tracing::warn!(collected = table.len(), "too few points, calibration skipped");
            console.error("Error: you must provide at least two points")?;
            return Err(SessionError::InsufficientPoints {
                collected: table.len(),
            });
        }

        let pairs = table.as_pairs();
        match device.calibrate(&pairs, &self.destination) {
            Ok(()) => {
                tracing::info!(
                    points = pairs.len(),
                    destination = %self.destination,
                    "external calibration complete"
                );
                console.say(&format!(
                    "External calibration of A/D successful, table saved in {}",
                    self.destination
                ))?;
                Ok(SessionReport {
                    points: table.into_points(),
                    destination: self.destination.clone(),
                })
            }
            Err(e) => {
                let message = describe(&*e);
                tracing::error!(error = %message, destination = %self.destination, "external calibration rejected");
                console.error(&format!(
                    "Error '{message}' occurred while externally calibrating A/D. This usually occurs because the input voltages or measured counts are not unique and ascending."
                ))?;
                Err(SessionError::Submission {
                    destination: self.destination.clone(),
                    message,
                })
            }
        }
    }

    fn measured_counts<R, W, E, D>(
        &self,
        console: &mut Console<R, W, E>,
        device: &mut D,
        volts: f64,
    ) -> Result<Acquired, SessionError>
    where
        R: BufRead,
        W: Write,
        E: Write,
        D: AnalogInput + ?Sized,
    {
        let (counts, reading_volts) = match measure(device, self.channel) {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(channel = self.channel, error = %e, "A/D read failed");
                console.error(&format!("Error '{e}' occurred while reading A/D input"))?;
                return Ok(Acquired::Retry);
            }
        };
        console.prompt(&format!(
            "  Read {counts} A/D counts ({reading_volts:.4} volts), accept (y/n)? "
        ))?;
        match console.read_line()? {
            Some(answer) if input::is_accept(&answer) => {
                Ok(Acquired::Point(CalibrationPoint::new(volts, counts)))
            }
            Some(_) => {
                tracing::debug!(counts, "reading rejected by operator");
                Ok(Acquired::Retry)
            }
            None => Ok(Acquired::Finish),
        }
    }
}

fn typed_counts<R, W, E>(console: &mut Console<R, W, E>, volts: f64) -> Result<Acquired, SessionError>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    console.prompt("  Enter A/D counts: ")?;
    let line = match console.read_line()? {
        Some(l) if !input::is_finish(&l) => l,
        _ => return Ok(Acquired::Finish),
    };
    match input::parse_counts(&line) {
        Ok(counts) => Ok(Acquired::Point(CalibrationPoint::new(volts, counts))),
        Err(e) => {
            report_input_error(console, &e)?;
            Ok(Acquired::Retry)
        }
    }
}

/// One reading of `channel` together with its voltage equivalent.
pub fn measure<D: AnalogInput + ?Sized>(
    device: &mut D,
    channel: u8,
) -> Result<(u16, f64), MeasurementError> {
    let counts = device
        .read_counts(channel)
        .map_err(|e| map_read_error(channel, &*e))?;
    let volts = device
        .counts_to_volts(channel, counts)
        .map_err(|e| map_read_error(channel, &*e))?;
    if !volts.is_finite() {
        return Err(MeasurementError::Device(format!(
            "unusable voltage for {counts} counts"
        )));
    }
    tracing::debug!(channel, counts, volts, "A/D read");
    Ok((counts, volts))
}

fn report_input_error<R, W, E>(
    console: &mut Console<R, W, E>,
    e: &InputError,
) -> Result<(), SessionError>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    tracing::debug!(error = %e, "rejected operator input");
    console.error(&format!("Error: {e}"))?;
    Ok(())
}
