pub mod range;

pub use range::{AdcSetup, InputRange, MAX_COUNTS};

use std::time::Duration;

/// Identity of one analog-input module found on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub index: usize,
    pub product_id: u16,
    pub product_name: String,
    pub serial_number: u64,
}

/// Entry point into the vendor library: owns the bus and hands out devices.
pub trait DeviceManager {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn is_open(&self) -> bool;

    /// Version string of the underlying device library.
    fn library_version(&self) -> String;

    fn list_devices(&self) -> Result<Vec<DeviceInfo>, Box<dyn std::error::Error + Send + Sync>>;

    /// Devices whose product ID is in `product_ids`, in bus order.
    fn find_by_product_ids(
        &self,
        product_ids: &[u16],
    ) -> Result<Vec<DeviceInfo>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self
            .list_devices()?
            .into_iter()
            .filter(|d| product_ids.contains(&d.product_id))
            .collect())
    }

    fn open_adc(
        &mut self,
        device: &DeviceInfo,
    ) -> Result<Box<dyn AnalogDevice>, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait AnalogInput {
    /// One raw A/D reading of `channel`.
    fn read_counts(
        &mut self,
        channel: u8,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;

    /// Convert a raw reading to volts using the device's current calibration context.
    fn counts_to_volts(
        &mut self,
        channel: u8,
        counts: u16,
    ) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait ExternalCalibrator {
    /// Build and persist a calibration table from `(volts, counts)` pairs.
    /// The layout of the file written to `destination` belongs to the implementation.
    fn calibrate(
        &mut self,
        points: &[(f64, u16)],
        destination: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Full A/D subsystem handle as returned by [`DeviceManager::open_adc`].
pub trait AnalogDevice: AnalogInput + ExternalCalibrator {
    fn info(&self) -> &DeviceInfo;
    fn reset(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_comm_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn configure(&mut self, setup: &AdcSetup) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Run the internal calibration so readings start from the default table.
    fn auto_calibrate(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: DeviceManager + ?Sized> DeviceManager for &mut T {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).open()
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
    fn is_open(&self) -> bool {
        (**self).is_open()
    }
    fn library_version(&self) -> String {
        (**self).library_version()
    }
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).list_devices()
    }
    fn find_by_product_ids(
        &self,
        product_ids: &[u16],
    ) -> Result<Vec<DeviceInfo>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).find_by_product_ids(product_ids)
    }
    fn open_adc(
        &mut self,
        device: &DeviceInfo,
    ) -> Result<Box<dyn AnalogDevice>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).open_adc(device)
    }
}

impl<T: DeviceManager + ?Sized> DeviceManager for Box<T> {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).open()
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
    fn is_open(&self) -> bool {
        (**self).is_open()
    }
    fn library_version(&self) -> String {
        (**self).library_version()
    }
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).list_devices()
    }
    fn find_by_product_ids(
        &self,
        product_ids: &[u16],
    ) -> Result<Vec<DeviceInfo>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).find_by_product_ids(product_ids)
    }
    fn open_adc(
        &mut self,
        device: &DeviceInfo,
    ) -> Result<Box<dyn AnalogDevice>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).open_adc(device)
    }
}
