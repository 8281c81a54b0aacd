use extcal_core::error::SessionError;
use extcal_core::mocks::ScriptedAdc;
use extcal_core::{CalibrationPoint, CalibrationSession, Console, ReadingMode, SessionReport};
use rstest::rstest;

struct Outcome {
    result: Result<SessionReport, SessionError>,
    out: String,
    err: String,
}

fn run_session(mode: ReadingMode, capacity: usize, script: &str, adc: &mut ScriptedAdc) -> Outcome {
    let session = CalibrationSession::builder()
        .channel(0)
        .capacity(capacity)
        .mode(mode)
        .destination("ADC-Ext-Cal-Table-1234")
        .build()
        .expect("valid session");
    let mut console = Console::new(script.as_bytes(), Vec::new(), Vec::new());
    let result = session.run(&mut console, adc);
    let (_, out, err) = console.into_parts();
    Outcome {
        result,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

#[test]
fn two_accepted_readings_are_submitted_once() {
    let mut adc = ScriptedAdc::new([6554, 16384]);
    let o = run_session(ReadingMode::Device, 100, "1.0\ny\n2.5\ny\n\n", &mut adc);

    let report = o.result.expect("calibrated");
    assert_eq!(
        report.points,
        vec![
            CalibrationPoint::new(1.0, 6554),
            CalibrationPoint::new(2.5, 16384)
        ]
    );
    assert_eq!(adc.submissions.len(), 1);
    assert_eq!(
        adc.submissions[0],
        (
            vec![(1.0, 6554), (2.5, 16384)],
            "ADC-Ext-Cal-Table-1234".to_string()
        )
    );
    assert!(o.out.contains("Measuring calibration point 1:"));
    assert!(o.out.contains("Measuring calibration point 2:"));
    assert!(o.out.contains("Measuring calibration point 3:"));
    assert!(o.out.contains("Read 6554 A/D counts"));
    assert!(o.out.contains("table saved in ADC-Ext-Cal-Table-1234"));
    assert!(o.err.is_empty());
}

#[test]
fn non_numeric_voltage_then_one_point_is_insufficient() {
    let mut adc = ScriptedAdc::new([6554]);
    let o = run_session(ReadingMode::Device, 100, "abc\n1.0\ny\n\n", &mut adc);

    match o.result {
        Err(SessionError::InsufficientPoints { collected }) => assert_eq!(collected, 1),
        other => panic!("expected insufficient points, got {other:?}"),
    }
    assert!(adc.submissions.is_empty());
    assert!(o.err.contains("'abc' is not a valid voltage"));
    assert!(o.err.contains("you must provide at least two points"));
    // The rejected entry re-prompts the same point index
    assert_eq!(o.out.matches("Measuring calibration point 1:").count(), 2);
    assert_eq!(adc.reads, 1);
}

#[test]
fn rejected_reading_is_remeasured_without_advancing() {
    let mut adc = ScriptedAdc::new([100, 6554, 16384]);
    let o = run_session(ReadingMode::Device, 100, "1.0\nn\n1.0\ny\n2.5\nY\n\n", &mut adc);

    let report = o.result.expect("calibrated");
    assert_eq!(report.points.len(), 2);
    assert_eq!(report.points[0], CalibrationPoint::new(1.0, 6554));
    assert_eq!(o.out.matches("Measuring calibration point 1:").count(), 2);
    assert_eq!(adc.reads, 3);
}

#[test]
fn failed_read_is_reported_and_retried() {
    let mut adc = ScriptedAdc::with_script([
        Err("usb transfer timeout".to_string()),
        Ok(6554),
        Ok(16384),
    ]);
    let o = run_session(ReadingMode::Device, 100, "1.0\n1.0\ny\n2.5\ny\n\n", &mut adc);

    let report = o.result.expect("calibrated");
    assert_eq!(report.points.len(), 2);
    assert!(o.err.contains("occurred while reading A/D input"));
    assert!(o.err.contains("timed out on channel 0"));
}

#[test]
fn submission_failure_is_reported_not_retried() {
    let mut adc = ScriptedAdc::new([200, 100]).rejecting("invalid parameter");
    let o = run_session(ReadingMode::Device, 100, "1.0\ny\n2.0\ny\n\n", &mut adc);

    match o.result {
        Err(SessionError::Submission {
            destination,
            message,
        }) => {
            assert_eq!(destination, "ADC-Ext-Cal-Table-1234");
            assert_eq!(message, "invalid parameter");
        }
        other => panic!("expected submission error, got {other:?}"),
    }
    assert_eq!(adc.submissions.len(), 1);
    assert!(o.err.contains("not unique and ascending"));
}

#[test]
fn capacity_ends_collection_like_blank_input() {
    let mut adc = ScriptedAdc::new([10, 20, 30]);
    // No blank line: the third point would need input that never comes
    let o = run_session(ReadingMode::Device, 2, "1.0\ny\n2.0\ny\n3.0\ny\n", &mut adc);

    let report = o.result.expect("calibrated");
    assert_eq!(report.points.len(), 2);
    assert_eq!(adc.reads, 2);
    assert!(!o.out.contains("Measuring calibration point 3:"));
    assert_eq!(adc.submissions.len(), 1);
}

#[test]
fn end_of_input_finishes_collection() {
    let mut adc = ScriptedAdc::new([10, 20]);
    let o = run_session(ReadingMode::Device, 100, "1.0\ny\n2.0\ny", &mut adc);
    assert_eq!(o.result.expect("calibrated").points.len(), 2);
}

#[test]
fn simulated_mode_takes_typed_counts() {
    let mut adc = ScriptedAdc::default();
    let o = run_session(ReadingMode::Simulated, 100, "0.5\n3290\n9.5\n0xF368\n\n", &mut adc);

    let report = o.result.expect("calibrated");
    assert_eq!(
        report.points,
        vec![
            CalibrationPoint::new(0.5, 3290),
            CalibrationPoint::new(9.5, 0xf368)
        ]
    );
    assert_eq!(adc.reads, 0);
    assert!(o.out.contains("Enter A/D counts: "));
}

#[test]
fn simulated_mode_bad_counts_reprompts() {
    let mut adc = ScriptedAdc::default();
    let o = run_session(
        ReadingMode::Simulated,
        100,
        "0.5\nlots\n0.5\n3290\n9.5\n62000\n\n",
        &mut adc,
    );
    assert_eq!(o.result.expect("calibrated").points.len(), 2);
    assert!(o.err.contains("'lots' is not a valid count value"));
    assert_eq!(o.out.matches("Measuring calibration point 1:").count(), 2);
}

#[test]
fn simulated_mode_blank_counts_ends_collection() {
    let mut adc = ScriptedAdc::default();
    let o = run_session(ReadingMode::Simulated, 100, "0.5\n3290\n9.5\n\n", &mut adc);
    match o.result {
        Err(SessionError::InsufficientPoints { collected }) => assert_eq!(collected, 1),
        other => panic!("expected insufficient points, got {other:?}"),
    }
    assert!(adc.submissions.is_empty());
}

#[rstest]
#[case("")]
#[case("\n")]
#[case("abc\n\n")]
fn no_points_never_submits(#[case] script: &str) {
    let mut adc = ScriptedAdc::default();
    let o = run_session(ReadingMode::Device, 100, script, &mut adc);
    assert!(matches!(
        o.result,
        Err(SessionError::InsufficientPoints { collected: 0 })
    ));
    assert!(adc.submissions.is_empty());
}

#[rstest]
#[case(0, "capacity")]
#[case(1, "capacity")]
#[case(101, "capacity")]
fn builder_rejects_bad_capacity(#[case] capacity: usize, #[case] needle: &str) {
    let err = CalibrationSession::builder()
        .capacity(capacity)
        .destination("x")
        .build()
        .expect_err("invalid capacity");
    assert!(err.to_string().contains(needle));
}

#[test]
fn builder_requires_destination() {
    assert!(CalibrationSession::builder().build().is_err());
    assert!(CalibrationSession::builder().destination("  ").build().is_err());
}

fn replay_session(capacity: usize) -> CalibrationSession {
    CalibrationSession::builder()
        .capacity(capacity)
        .destination("ADC-Ext-Cal-Table-1234")
        .build()
        .expect("valid session")
}

#[test]
fn replay_submits_recorded_points_without_prompting() {
    let mut adc = ScriptedAdc::default();
    let mut console = Console::new(&b""[..], Vec::new(), Vec::new());
    let points = [CalibrationPoint::new(0.5, 3277), CalibrationPoint::new(9.5, 62259)];

    let report = replay_session(100)
        .replay(&mut console, &mut adc, &points)
        .expect("calibrated");

    assert_eq!(report.points, points.to_vec());
    assert_eq!(adc.reads, 0);
    assert_eq!(adc.submissions.len(), 1);
    assert_eq!(adc.submissions[0].0, vec![(0.5, 3277), (9.5, 62259)]);
    let (_, out, _) = console.into_parts();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Replaying 2 calibration point(s)"));
    assert!(!out.contains("Measuring calibration point"));
}

#[test]
fn replay_beyond_capacity_is_refused_before_submission() {
    let mut adc = ScriptedAdc::default();
    let mut console = Console::new(&b""[..], Vec::new(), Vec::new());
    let points = [
        CalibrationPoint::new(1.0, 100),
        CalibrationPoint::new(2.0, 200),
        CalibrationPoint::new(3.0, 300),
    ];

    let err = replay_session(2)
        .replay(&mut console, &mut adc, &points)
        .expect_err("too many points");
    assert!(matches!(err, SessionError::TableFull(_)));
    assert!(adc.submissions.is_empty());
}

#[test]
fn replay_of_a_single_point_is_insufficient() {
    let mut adc = ScriptedAdc::default();
    let mut console = Console::new(&b""[..], Vec::new(), Vec::new());
    let err = replay_session(100)
        .replay(&mut console, &mut adc, &[CalibrationPoint::new(1.0, 100)])
        .expect_err("one point");
    assert!(matches!(err, SessionError::InsufficientPoints { collected: 1 }));
    assert!(adc.submissions.is_empty());
}
