//! Command implementations: hardware assembly, device session and calibration run.

use std::path::PathBuf;

use eyre::WrapErr;
use extcal_config::{Config, PointRow, load_points_csv, write_points_csv};
use extcal_core::conversions::product_ids;
use extcal_core::error::DeviceError;
use extcal_core::family::supported_product_names;
use extcal_core::hw_error::describe;
use extcal_core::{
    CalibrationPoint, CalibrationSession, Console, DeviceSession, ReadingMode, SessionReport,
    destination_for_serial, prepare_device, print_banner, print_devices, select_device,
};
use extcal_hardware::{SimDeviceSpec, SimulatedManager};
use extcal_traits::{DeviceInfo, DeviceManager};

/// Options of the `calibrate` subcommand.
#[derive(Debug, Default)]
pub struct CalibrateOpts {
    pub simulate_counts: bool,
    pub replay: Option<PathBuf>,
    pub serial: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub export_csv: Option<PathBuf>,
}

/// Device manager for this build: the simulated bus described by `[simulator]`.
pub fn build_manager(cfg: &Config) -> SimulatedManager {
    let sim = &cfg.simulator;
    let name = extcal_core::family::product_name(sim.product_id).unwrap_or("unknown");
    SimulatedManager::new(vec![SimDeviceSpec {
        info: DeviceInfo {
            index: 0,
            product_id: sim.product_id,
            product_name: name.to_string(),
            serial_number: sim.serial_number,
        },
        gain: sim.gain,
        offset_counts: sim.offset_counts,
        source_volts: sim.source_volts.clone(),
        fail_every: sim.fail_every,
    }])
}

/// Run one interactive external calibration on stdin/stdout.
///
/// Returns `Ok(None)` when no matching device is on the bus.
pub fn run_calibrate<M: DeviceManager>(
    cfg: &Config,
    manager: M,
    opts: CalibrateOpts,
) -> eyre::Result<Option<SessionReport>> {
    // Loaded before the device is opened
    let replayed = match opts.replay.as_deref() {
        Some(path) => {
            let rows = load_points_csv(path)
                .wrap_err_with(|| format!("replay points from {}", path.display()))?;
            Some(
                rows.iter()
                    .map(|r| CalibrationPoint::new(r.volts, r.counts))
                    .collect::<Vec<_>>(),
            )
        }
        None => None,
    };

    let mut console = Console::stdio();
    let mut session = DeviceSession::open(manager)?;
    let setup = cfg.adc_setup();

    print_banner(
        &mut console,
        &session.manager().library_version(),
        &supported_product_names(),
        cfg.adc.channel,
        &setup,
    )?;
    let devices = session
        .manager()
        .list_devices()
        .map_err(|e| DeviceError::Enumerate(describe(&*e)))?;
    print_devices(&mut console, &devices)?;

    let serial = opts.serial.or(cfg.device.serial_number);
    let Some(info) = select_device(session.manager(), &product_ids(&cfg.device), serial)? else {
        console.say("No USB-AI16-16 devices found on USB bus")?;
        session.close()?;
        return Ok(None);
    };
    tracing::info!(
        serial = info.serial_number,
        product = %info.product_name,
        "device selected"
    );

    let mut adc = session
        .manager_mut()
        .open_adc(&info)
        .map_err(|e| DeviceError::Setup {
            step: "open A/D",
            message: describe(&*e),
        })?;
    if let Err(e) = prepare_device(&mut console, &mut *adc, &setup, cfg.comm_timeout()) {
        let _ = console.error(&format!("Error '{e}' occurred while configuring device"));
        return Err(e.into());
    }

    let output_dir = opts
        .output_dir
        .unwrap_or_else(|| cfg.session.output_dir.clone());
    let destination = output_dir.join(destination_for_serial(info.serial_number));
    let mode = if opts.simulate_counts {
        ReadingMode::Simulated
    } else {
        cfg.session.mode.into()
    };
    let calibration = CalibrationSession::builder()
        .channel(cfg.adc.channel)
        .capacity(cfg.session.max_points)
        .mode(mode)
        .destination(destination.display().to_string())
        .build()?;

    if let Some(points) = replayed {
        let report = calibration.replay(&mut console, &mut *adc, &points)?;
        drop(adc);
        session.close()?;
        return Ok(Some(report));
    }

    let table = calibration.collect(&mut console, &mut *adc)?;
    if let Some(path) = opts.export_csv.as_deref() {
        let rows: Vec<PointRow> = table
            .points()
            .iter()
            .map(|p| PointRow {
                volts: p.volts,
                counts: p.counts,
            })
            .collect();
        write_points_csv(path, &rows)
            .wrap_err_with(|| format!("export points to {}", path.display()))?;
        tracing::info!(path = %path.display(), points = rows.len(), "points exported");
    }
    let report = calibration.submit(&mut console, &mut *adc, table)?;

    drop(adc);
    session.close()?;
    Ok(Some(report))
}

/// Print every device on the bus.
pub fn run_list<M: DeviceManager>(manager: M) -> eyre::Result<()> {
    let mut console = Console::stdio();
    let session = DeviceSession::open(manager)?;
    let devices = session
        .manager()
        .list_devices()
        .map_err(|e| DeviceError::Enumerate(describe(&*e)))?;
    print_devices(&mut console, &devices)?;
    session.close()?;
    Ok(())
}

/// Open the manager, count family devices and close again.
pub fn run_self_check<M: DeviceManager>(cfg: &Config, manager: M) -> eyre::Result<()> {
    let session = DeviceSession::open(manager)?;
    let found = session
        .manager()
        .find_by_product_ids(&product_ids(&cfg.device))
        .map_err(|e| DeviceError::Enumerate(describe(&*e)))?;
    let version = session.manager().library_version();
    session.close()?;
    println!("ok: library {version}, {} calibratable device(s)", found.len());
    Ok(())
}
