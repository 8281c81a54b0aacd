use extcal_core::error::SessionError;
use extcal_core::mocks::ScriptedAdc;
use extcal_core::{CalibrationSession, Console, ReadingMode};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Entry {
    /// Text that is not a number, typed at the voltage prompt
    Garbage(String),
    /// A voltage, the reading the A/D returns for it, and the operator's answer
    Reading { volts: f64, counts: u16, accept: bool },
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(Entry::Garbage),
        (-10.0f64..10.0, any::<u16>(), any::<bool>())
            .prop_map(|(volts, counts, accept)| Entry::Reading { volts, counts, accept }),
    ]
}

/// Console script, scripted readings and the points the session should accept.
fn plan(entries: &[Entry], capacity: usize) -> (String, Vec<u16>, Vec<(f64, u16)>) {
    let mut script = String::new();
    let mut readings = Vec::new();
    let mut expected = Vec::new();
    for e in entries {
        if expected.len() == capacity {
            break;
        }
        match e {
            Entry::Garbage(text) => {
                script.push_str(text);
                script.push('\n');
            }
            Entry::Reading {
                volts,
                counts,
                accept,
            } => {
                script.push_str(&format!("{volts}\n{}\n", if *accept { "y" } else { "n" }));
                readings.push(*counts);
                if *accept {
                    expected.push((*volts, *counts));
                }
            }
        }
    }
    script.push('\n');
    (script, readings, expected)
}

proptest! {
    #[test]
    fn submitted_table_is_exactly_the_accepted_points(
        entries in proptest::collection::vec(entry_strategy(), 0..30),
        capacity in 2usize..12,
    ) {
        let (script, readings, expected) = plan(&entries, capacity);
        let mut adc = ScriptedAdc::new(readings.clone());
        let session = CalibrationSession::builder()
            .capacity(capacity)
            .mode(ReadingMode::Device)
            .destination("table")
            .build()
            .unwrap();
        let mut console = Console::new(script.as_bytes(), Vec::new(), Vec::new());
        let result = session.run(&mut console, &mut adc);

        // Every scripted reading (accepted or rejected) is taken, nothing more
        prop_assert_eq!(adc.reads, readings.len());

        if expected.len() >= 2 {
            let report = result.unwrap();
            prop_assert_eq!(adc.submissions.len(), 1);
            prop_assert_eq!(&adc.submissions[0].0, &expected);
            prop_assert_eq!(report.points.len(), expected.len());
        } else {
            prop_assert!(adc.submissions.is_empty());
            let is_insufficient = matches!(
                result,
                Err(SessionError::InsufficientPoints { collected }) if collected == expected.len()
            );
            prop_assert!(is_insufficient);
        }
    }

    #[test]
    fn garbage_never_advances_the_point_counter(
        garbage in proptest::collection::vec("[a-z]{1,6}", 1..10),
    ) {
        let mut script = String::new();
        for g in &garbage {
            script.push_str(g);
            script.push('\n');
        }
        script.push('\n');
        let mut adc = ScriptedAdc::default();
        let session = CalibrationSession::builder()
            .mode(ReadingMode::Simulated)
            .destination("table")
            .build()
            .unwrap();
        let mut console = Console::new(script.as_bytes(), Vec::new(), Vec::new());
        let result = session.run(&mut console, &mut adc);
        let (_, out, _) = console.into_parts();
        let out = String::from_utf8(out).unwrap();

        prop_assert!(!out.contains("Measuring calibration point 2:"));
        prop_assert_eq!(
            out.matches("Measuring calibration point 1:").count(),
            garbage.len() + 1
        );
        let no_points = matches!(result, Err(SessionError::InsufficientPoints { collected: 0 }));
        prop_assert!(no_points);
    }
}
