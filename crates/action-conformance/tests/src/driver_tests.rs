use super::*;

fn case() -> TestCase {
    TestCase {
        config: "config/case.json".into(),
        source: "source/case.bal".into(),
    }
}

fn report(failures: Vec<MatchFailure>) -> CaseReport {
    CaseReport {
        source: "source/case.bal".into(),
        cursor: Position::new(4, 38),
        expectations: 1,
        failures,
    }
}

#[test]
fn suite_counters_classify_outcomes() {
    let passing = CaseOutcome {
        case: case(),
        result: Ok(report(Vec::new())),
    };
    let failing = CaseOutcome {
        case: case(),
        result: Ok(report(vec![MatchFailure {
            title: "Add return type".to_string(),
            cursor: Position::new(4, 38),
        }])),
    };
    let errored = CaseOutcome {
        case: case(),
        result: Err(CaseError::Fixture(FixtureError::MissingSource {
            config: "config/case.json".into(),
        })),
    };
    let suite = SuiteReport {
        outcomes: vec![passing, failing, errored],
    };
    assert!(!suite.passed());
    assert_eq!(suite.passed_cases(), 1);
    assert_eq!(suite.failed_cases(), 1);
    assert_eq!(suite.errored_cases(), 1);
}

#[test]
fn an_empty_suite_passes() {
    let suite = SuiteReport::default();
    assert!(suite.passed());
    assert_eq!(suite.passed_cases(), 0);
}

#[test]
fn a_report_passes_only_without_failures() {
    assert!(report(Vec::new()).passed());
    assert!(
        !report(vec![MatchFailure {
            title: "Document this".to_string(),
            cursor: Position::new(2, 8),
        }])
        .passed()
    );
}
