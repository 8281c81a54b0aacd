//! Device-manager lifetime, device selection and A/D preparation.

use std::io::{BufRead, Write};
use std::time::Duration;

use extcal_traits::{AdcSetup, AnalogDevice, DeviceInfo, DeviceManager};

use crate::console::Console;
use crate::error::DeviceError;
use crate::family::product_name;
use crate::hw_error::describe;

/// Open device manager, closed again on every exit path.
///
/// Dropping the session closes the manager if it is still open; use
/// [`DeviceSession::close`] to observe close failures.
pub struct DeviceSession<M: DeviceManager> {
    manager: M,
}

impl<M: DeviceManager> DeviceSession<M> {
    pub fn open(mut manager: M) -> Result<Self, DeviceError> {
        if let Err(e) = manager.open() {
            let message = describe(&*e);
            tracing::error!(error = %message, "device manager open failed");
            if manager.is_open() {
                if let Err(close_err) = manager.close() {
                    tracing::warn!(error = %close_err, "close after failed open also failed");
                }
            }
            return Err(DeviceError::Open(message));
        }
        tracing::info!(library = %manager.library_version(), "device manager open");
        Ok(Self { manager })
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut M {
        &mut self.manager
    }

    pub fn close(mut self) -> Result<(), DeviceError> {
        self.manager
            .close()
            .map_err(|e| DeviceError::Close(describe(&*e)))
    }
}

impl<M: DeviceManager> Drop for DeviceSession<M> {
    fn drop(&mut self) {
        if self.manager.is_open() {
            if let Err(e) = self.manager.close() {
                tracing::warn!(error = %e, "device manager close failed");
            } else {
                tracing::info!("device manager closed");
            }
        }
    }
}

/// File name the external calibration table is saved under for a device.
pub fn destination_for_serial(serial_number: u64) -> String {
    format!("ADC-Ext-Cal-Table-{serial_number:x}")
}

/// First device matching `product_ids`, or the one with `serial` when given.
///
/// `Ok(None)` means nothing from the family is on the bus.
pub fn select_device<M: DeviceManager + ?Sized>(
    manager: &M,
    product_ids: &[u16],
    serial: Option<u64>,
) -> Result<Option<DeviceInfo>, DeviceError> {
    let matches = manager
        .find_by_product_ids(product_ids)
        .map_err(|e| DeviceError::Enumerate(describe(&*e)))?;
    let Some(serial) = serial else {
        return Ok(matches.into_iter().next());
    };
    if matches.is_empty() {
        return Ok(None);
    }
    matches
        .into_iter()
        .find(|d| d.serial_number == serial)
        .map(Some)
        .ok_or(DeviceError::SerialNotFound { serial })
}

/// Reset the device and put the A/D into a known state with its default calibration.
pub fn prepare_device<R, W, E, D>(
    console: &mut Console<R, W, E>,
    device: &mut D,
    setup: &AdcSetup,
    comm_timeout: Duration,
) -> Result<(), DeviceError>
where
    R: BufRead,
    W: Write,
    E: Write,
    D: AnalogDevice + ?Sized,
{
    let step = |step: &'static str| {
        move |e: Box<dyn std::error::Error + Send + Sync>| DeviceError::Setup {
            step,
            message: describe(&*e),
        }
    };
    let console_err = |e: std::io::Error| DeviceError::Console(e.to_string());
    console
        .prompt("Calibrating A/D, may take a few seconds ... ")
        .map_err(console_err)?;
    device.reset().map_err(step("reset"))?;
    device
        .set_comm_timeout(comm_timeout)
        .map_err(step("set comm timeout"))?;
    device.configure(setup).map_err(step("configure A/D"))?;
    device.auto_calibrate().map_err(step("internal calibration"))?;
    console.say("successful").map_err(console_err)?;
    tracing::info!(
        serial = device.info().serial_number,
        range = %setup.range,
        oversample = setup.oversample,
        "A/D prepared for external calibration"
    );
    Ok(())
}

/// Introduction printed before a calibration session.
pub fn print_banner<R, W, E>(
    console: &mut Console<R, W, E>,
    library_version: &str,
    product_names: &[&str],
    channel: u8,
    setup: &AdcSetup,
) -> std::io::Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    console.say(&format!(
        "extcal version {}\n  device library version {}\n",
        env!("CARGO_PKG_VERSION"),
        library_version
    ))?;
    console.say(&format!(
        "  This program externally calibrates a USB-AI16-16 device on the USB bus.\n  It uses the first such device found on the bus and supports these\n  product IDs: {}.\n",
        product_names.join(", ")
    ))?;
    console.say(&format!(
        "  You inject a sequence of precise voltages into the device, which are used\n  to calibrate its A/D. This procedure calibrates the A/D using channel {channel}\n  on the {} range. A minimum of 2 calibration points is required:\n",
        setup.range
    ))?;
    console.say(
        "  1) Adjust a precision voltage source to a desired target voltage. Targets\n     do not have to be evenly spaced or entered in any particular order.\n\n  2) Type the exact voltage being fed into the device and press <Enter>.\n     The A/D is read and the reading displayed; press 'y' to accept it or\n     anything else to retake it.\n\n  3) When finished, press <Enter> without a voltage. The A/D is calibrated\n     from the points entered and the table is saved to a file that can be\n     loaded into the A/D later.\n",
    )
}

/// One line per device on the bus.
pub fn print_devices<R, W, E>(
    console: &mut Console<R, W, E>,
    devices: &[DeviceInfo],
) -> std::io::Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    if devices.is_empty() {
        return console.say("No ACCES devices found on USB bus");
    }
    console.say("ACCES devices found:")?;
    for d in devices {
        let name = if d.product_name.is_empty() {
            product_name(d.product_id).unwrap_or("unknown")
        } else {
            d.product_name.as_str()
        };
        console.say(&format!(
            "  Device at index {}:\n    Product ID: {:#06x}\n    Product name: {}\n    Serial number: {:#x}",
            d.index, d.product_id, name, d.serial_number
        ))?;
    }
    Ok(())
}
