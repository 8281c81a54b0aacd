//! Test and helper mocks for extcal_core

use std::collections::VecDeque;
use std::time::Duration;

use extcal_traits::{
    AdcSetup, AnalogDevice, AnalogInput, DeviceInfo, DeviceManager, ExternalCalibrator,
    InputRange,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A/D that replays a fixed list of readings and records calibration submissions.
///
/// Once the script is exhausted every read fails.
#[derive(Debug, Default)]
pub struct ScriptedAdc {
    pub info: DeviceInfo,
    pub readings: VecDeque<Result<u16, String>>,
    pub submissions: Vec<(Vec<(f64, u16)>, String)>,
    pub reject_with: Option<String>,
    pub reads: usize,
}

/// A USB-AI16-16A with serial number `0x1234`.
pub fn sample_device() -> DeviceInfo {
    DeviceInfo {
        index: 0,
        product_id: 0x8040,
        product_name: "USB-AI16-16A".into(),
        serial_number: 0x1234,
    }
}

impl ScriptedAdc {
    pub fn new(readings: impl IntoIterator<Item = u16>) -> Self {
        Self {
            info: sample_device(),
            readings: readings.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    pub fn with_script(script: impl IntoIterator<Item = Result<u16, String>>) -> Self {
        Self {
            info: sample_device(),
            readings: script.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Make every calibration submission fail with `message`.
    pub fn rejecting(mut self, message: &str) -> Self {
        self.reject_with = Some(message.to_string());
        self
    }
}

impl AnalogInput for ScriptedAdc {
    fn read_counts(&mut self, _channel: u8) -> Result<u16, BoxError> {
        self.reads += 1;
        match self.readings.pop_front() {
            Some(Ok(c)) => Ok(c),
            Some(Err(msg)) => Err(msg.into()),
            None => Err("no scripted reading left".into()),
        }
    }

    fn counts_to_volts(&mut self, _channel: u8, counts: u16) -> Result<f64, BoxError> {
        Ok(InputRange::Unipolar10V.counts_to_volts(counts))
    }
}

impl ExternalCalibrator for ScriptedAdc {
    fn calibrate(&mut self, points: &[(f64, u16)], destination: &str) -> Result<(), BoxError> {
        self.submissions
            .push((points.to_vec(), destination.to_string()));
        match &self.reject_with {
            Some(msg) => Err(msg.clone().into()),
            None => Ok(()),
        }
    }
}

impl AnalogDevice for ScriptedAdc {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }
    fn reset(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn set_comm_timeout(&mut self, _timeout: Duration) -> Result<(), BoxError> {
        Ok(())
    }
    fn configure(&mut self, _setup: &AdcSetup) -> Result<(), BoxError> {
        Ok(())
    }
    fn auto_calibrate(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Device manager over a static device list; counts open/close calls.
#[derive(Debug, Default)]
pub struct StaticManager {
    pub devices: Vec<DeviceInfo>,
    pub open: bool,
    pub opens: usize,
    pub closes: usize,
    pub fail_open: bool,
}

impl DeviceManager for StaticManager {
    fn open(&mut self) -> Result<(), BoxError> {
        self.opens += 1;
        if self.fail_open {
            // Half-open: the bus was claimed before the failure.
            self.open = true;
            return Err("libusb init failed".into());
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.closes += 1;
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn library_version(&self) -> String {
        "static".into()
    }

    fn list_devices(&self) -> Result<Vec<DeviceInfo>, BoxError> {
        if !self.open {
            return Err("device manager not open".into());
        }
        Ok(self.devices.clone())
    }

    fn open_adc(&mut self, device: &DeviceInfo) -> Result<Box<dyn AnalogDevice>, BoxError> {
        Ok(Box::new(ScriptedAdc {
            info: device.clone(),
            ..ScriptedAdc::default()
        }))
    }
}
