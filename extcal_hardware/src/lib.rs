//! Simulated AI16 device bus.
//!
//! Stands in for the vendor library: a device manager with a fixed device
//! list, and an A/D whose readings follow a cycling voltage source with a
//! gain and offset error, so external calibration has something to correct.

pub mod error;

use std::path::Path;
use std::time::Duration;

use extcal_traits::{
    AdcSetup, AnalogDevice, AnalogInput, DeviceInfo, DeviceManager, ExternalCalibrator, MAX_COUNTS,
};

use crate::error::HwError;

/// Channels per simulated module.
pub const CHANNELS: u8 = 16;

/// Largest point set the calibration routine takes (one per table word).
pub const CAL_TABLE_WORDS: usize = 64 * 1024;

/// One simulated module and the behaviour of its A/D.
#[derive(Debug, Clone)]
pub struct SimDeviceSpec {
    pub info: DeviceInfo,
    /// Gain error applied to ideal readings
    pub gain: f64,
    /// Offset error in counts applied after the gain
    pub offset_counts: f64,
    /// Voltages the source cycles through, one per read
    pub source_volts: Vec<f64>,
    /// Fail every Nth read with a timeout (0 disables)
    pub fail_every: u32,
}

/// Simulated device manager
pub struct SimulatedManager {
    devices: Vec<SimDeviceSpec>,
    open: bool,
}

impl SimulatedManager {
    pub fn new(devices: Vec<SimDeviceSpec>) -> Self {
        SimulatedManager {
            devices,
            open: false,
        }
    }
}

impl DeviceManager for SimulatedManager {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.open = true;
        tracing::debug!(devices = self.devices.len(), "simulated bus open");
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn library_version(&self) -> String {
        format!("{} (simulated)", env!("CARGO_PKG_VERSION"))
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>, Box<dyn std::error::Error + Send + Sync>> {
        if !self.open {
            return Err(Box::new(HwError::NotOpen));
        }
        Ok(self.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn open_adc(
        &mut self,
        device: &DeviceInfo,
    ) -> Result<Box<dyn AnalogDevice>, Box<dyn std::error::Error + Send + Sync>> {
        if !self.open {
            return Err(Box::new(HwError::NotOpen));
        }
        let spec = self
            .devices
            .iter()
            .find(|d| d.info.serial_number == device.serial_number)
            .ok_or(HwError::NoSuchDevice(device.serial_number))?;
        Ok(Box::new(SimulatedAdc::new(spec.clone())))
    }
}

/// Simulated A/D subsystem
pub struct SimulatedAdc {
    spec: SimDeviceSpec,
    setup: AdcSetup,
    comm_timeout: Duration,
    reads: u64,
    cursor: usize,
    last_table: Option<Vec<(f64, u16)>>,
}

impl SimulatedAdc {
    pub fn new(spec: SimDeviceSpec) -> Self {
        SimulatedAdc {
            spec,
            setup: AdcSetup::default(),
            comm_timeout: Duration::from_millis(1000),
            reads: 0,
            cursor: 0,
            last_table: None,
        }
    }

    pub fn setup(&self) -> &AdcSetup {
        &self.setup
    }

    pub fn comm_timeout(&self) -> Duration {
        self.comm_timeout
    }

    /// Points of the last accepted calibration, sorted by voltage.
    pub fn last_table(&self) -> Option<&[(f64, u16)]> {
        self.last_table.as_deref()
    }

    fn check_channel(&self, channel: u8) -> Result<(), HwError> {
        if channel >= CHANNELS {
            return Err(HwError::InvalidChannel(channel));
        }
        Ok(())
    }

    fn next_source_volts(&mut self) -> f64 {
        if self.spec.source_volts.is_empty() {
            return 0.0;
        }
        let v = self.spec.source_volts[self.cursor % self.spec.source_volts.len()];
        self.cursor = self.cursor.wrapping_add(1);
        v
    }
}

/// Sort by voltage and require both columns to be strictly increasing.
pub fn validate_points(points: &[(f64, u16)]) -> Result<Vec<(f64, u16)>, HwError> {
    if points.len() < 2 {
        return Err(HwError::InvalidPoints(format!(
            "at least 2 points required, got {}",
            points.len()
        )));
    }
    if points.len() > CAL_TABLE_WORDS {
        return Err(HwError::InvalidPoints(format!(
            "at most {CAL_TABLE_WORDS} points allowed, got {}",
            points.len()
        )));
    }
    if let Some((v, _)) = points.iter().find(|(v, _)| !v.is_finite()) {
        return Err(HwError::InvalidPoints(format!("voltage {v} is not finite")));
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in sorted.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if hi.0 <= lo.0 || hi.1 <= lo.1 {
            return Err(HwError::InvalidPoints(format!(
                "points ({:.3},{}) and ({:.3},{}) are not unique or not increasing",
                lo.0, lo.1, hi.0, hi.1
            )));
        }
    }
    Ok(sorted)
}

fn write_table(path: &Path, points: &[(f64, u16)]) -> Result<(), HwError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| HwError::Io(e.into()))?;
    wtr.write_record(["volts", "counts"])
        .map_err(|e| HwError::Io(e.into()))?;
    for (v, c) in points {
        wtr.write_record([v.to_string(), c.to_string()])
            .map_err(|e| HwError::Io(e.into()))?;
    }
    wtr.flush()?;
    Ok(())
}

impl AnalogInput for SimulatedAdc {
    fn read_counts(
        &mut self,
        channel: u8,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        self.check_channel(channel)?;
        self.reads += 1;
        if self.spec.fail_every > 0 && self.reads % u64::from(self.spec.fail_every) == 0 {
            tracing::warn!(channel, reads = self.reads, "simulated read timeout");
            return Err(Box::new(HwError::Timeout));
        }
        let volts = self.next_source_volts();
        let ideal = f64::from(self.setup.range.volts_to_counts(volts));
        let raw = (ideal * self.spec.gain + self.spec.offset_counts)
            .round()
            .clamp(0.0, f64::from(MAX_COUNTS));
        tracing::debug!(channel, volts, counts = raw, "simulated A/D sample");
        Ok(raw as u16)
    }

    fn counts_to_volts(
        &mut self,
        channel: u8,
        counts: u16,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        self.check_channel(channel)?;
        Ok(self.setup.range.counts_to_volts(counts))
    }
}

impl ExternalCalibrator for SimulatedAdc {
    fn calibrate(
        &mut self,
        points: &[(f64, u16)],
        destination: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let sorted = validate_points(points)?;
        write_table(Path::new(destination), &sorted)?;
        tracing::info!(points = sorted.len(), destination, "calibration table saved");
        self.last_table = Some(sorted);
        Ok(())
    }
}

impl AnalogDevice for SimulatedAdc {
    fn info(&self) -> &DeviceInfo {
        &self.spec.info
    }

    fn reset(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.reads = 0;
        self.cursor = 0;
        Ok(())
    }

    fn set_comm_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.comm_timeout = timeout;
        Ok(())
    }

    fn configure(&mut self, setup: &AdcSetup) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.setup = *setup;
        Ok(())
    }

    fn auto_calibrate(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.last_table = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(fail_every: u32) -> SimDeviceSpec {
        SimDeviceSpec {
            info: DeviceInfo {
                index: 0,
                product_id: 0x8040,
                product_name: "USB-AI16-16A".into(),
                serial_number: 0xabc,
            },
            gain: 1.0,
            offset_counts: 0.0,
            source_volts: vec![0.0, 10.0],
            fail_every,
        }
    }

    #[test]
    fn readings_follow_source() {
        let mut adc = SimulatedAdc::new(spec(0));
        assert_eq!(adc.read_counts(0).unwrap(), 0);
        assert_eq!(adc.read_counts(0).unwrap(), MAX_COUNTS);
        assert_eq!(adc.read_counts(0).unwrap(), 0);
    }

    #[test]
    fn every_nth_read_times_out() {
        let mut adc = SimulatedAdc::new(spec(2));
        assert!(adc.read_counts(0).is_ok());
        let err = adc.read_counts(0).unwrap_err();
        assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::Timeout)));
        assert!(adc.read_counts(0).is_ok());
    }

    #[test]
    fn rejects_bad_channel() {
        let mut adc = SimulatedAdc::new(spec(0));
        let err = adc.read_counts(CHANNELS).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HwError>(),
            Some(HwError::InvalidChannel(16))
        ));
    }

    #[test]
    fn manager_requires_open() {
        let mut mgr = SimulatedManager::new(vec![spec(0)]);
        assert!(mgr.list_devices().is_err());
        mgr.open().unwrap();
        let devices = mgr.list_devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert!(mgr.open_adc(&devices[0]).is_ok());
        mgr.close().unwrap();
        assert!(!mgr.is_open());
        assert!(mgr.open_adc(&devices[0]).is_err());
    }
}
