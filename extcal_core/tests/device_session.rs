use extcal_core::error::DeviceError;
use extcal_core::mocks::{ScriptedAdc, StaticManager, sample_device};
use extcal_core::{Console, DeviceSession, prepare_device, print_devices, select_device};
use extcal_traits::{AdcSetup, DeviceInfo, DeviceManager};
use std::time::Duration;

fn device(index: usize, product_id: u16, serial_number: u64) -> DeviceInfo {
    DeviceInfo {
        index,
        product_id,
        product_name: String::new(),
        serial_number,
    }
}

fn manager() -> StaticManager {
    StaticManager {
        devices: vec![
            device(0, 0x8001, 0x10),
            device(1, 0x8040, 0x20),
            device(2, 0x8041, 0x30),
        ],
        ..StaticManager::default()
    }
}

#[test]
fn dropping_the_session_closes_the_manager() {
    let mut mgr = manager();
    {
        let session = DeviceSession::open(&mut mgr).expect("open");
        assert!(session.manager().is_open());
    }
    assert!(!mgr.open);
    assert_eq!((mgr.opens, mgr.closes), (1, 1));
}

#[test]
fn explicit_close_does_not_close_twice() {
    let mut mgr = manager();
    let session = DeviceSession::open(&mut mgr).expect("open");
    session.close().expect("close");
    assert_eq!(mgr.closes, 1);
}

#[test]
fn failed_open_closes_partially_opened_manager() {
    let mut mgr = StaticManager {
        fail_open: true,
        ..manager()
    };
    let err = DeviceSession::open(&mut mgr).err().expect("open fails");
    assert!(matches!(err, DeviceError::Open(ref m) if m.contains("libusb")));
    assert!(!mgr.open);
    assert_eq!(mgr.closes, 1);
}

#[test]
fn selects_first_family_member_or_by_serial() {
    let mut mgr = manager();
    let session = DeviceSession::open(&mut mgr).expect("open");
    let ids = [0x8040, 0x8041];

    let first = select_device(session.manager(), &ids, None).unwrap();
    assert_eq!(first.map(|d| d.serial_number), Some(0x20));

    let by_serial = select_device(session.manager(), &ids, Some(0x30)).unwrap();
    assert_eq!(by_serial.map(|d| d.index), Some(2));

    let err = select_device(session.manager(), &ids, Some(0x10)).unwrap_err();
    assert!(matches!(err, DeviceError::SerialNotFound { serial: 0x10 }));

    assert_eq!(select_device(session.manager(), &[0x9999], None).unwrap(), None);
}

#[test]
fn enumeration_failure_is_typed() {
    let mgr = manager();
    // Never opened, so listing fails
    let err = select_device(&mgr, &[0x8040], None).unwrap_err();
    assert!(matches!(err, DeviceError::Enumerate(_)));
}

#[test]
fn prepare_reports_success() {
    let mut adc = ScriptedAdc::default();
    let mut console = Console::new(&b""[..], Vec::new(), Vec::new());
    prepare_device(
        &mut console,
        &mut adc,
        &AdcSetup::default(),
        Duration::from_millis(1000),
    )
    .expect("prepared");
    let (_, out, _) = console.into_parts();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Calibrating A/D, may take a few seconds ... successful\n"
    );
}

#[test]
fn device_listing_names_known_products() {
    let mut console = Console::new(&b""[..], Vec::new(), Vec::new());
    print_devices(&mut console, &[sample_device(), device(1, 0x8042, 0xbeef)]).unwrap();
    let (_, out, _) = console.into_parts();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Product name: USB-AI16-16A"));
    assert!(out.contains("Product name: USB-AI12-16A"));
    assert!(out.contains("Serial number: 0xbeef"));
}

struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn prepare_propagates_console_failures() {
    let mut adc = ScriptedAdc::default();
    let mut console = Console::new(&b""[..], BrokenPipe, Vec::new());
    let err = prepare_device(
        &mut console,
        &mut adc,
        &AdcSetup::default(),
        Duration::from_millis(1000),
    )
    .expect_err("closed console");
    match err {
        DeviceError::Console(msg) => assert!(msg.contains("stdout closed"), "got: {msg}"),
        other => panic!("expected console error, got {other:?}"),
    }
}
