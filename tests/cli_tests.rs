// tests/cli_tests.rs
#![cfg(feature = "cli")]

use pretty_assertions::assert_eq;
use sieve::cli::{self, CheckOptions, CheckResult, CliError};

// ============================================================================
// check / unwire
// ============================================================================

#[test]
fn test_check_wire_output() {
    let options = CheckOptions {
        filter: "(Name == 'Jo' || !Archived)".to_string(),
        wire: true,
        pretty: false,
    };
    match cli::execute_check(&options).unwrap() {
        CheckResult::Wire(json) => {
            assert_eq!(json, r#"{"Filter":"(Name == \"Jo\" || !(Archived))"}"#)
        }
        other => panic!("Expected wire output, got {:?}", other),
    }
}

#[test]
fn test_exit_codes() {
    let empty = CheckOptions::default();
    let err = cli::execute_check(&empty).unwrap_err();
    assert!(matches!(err, CliError::NoInput));
    assert_eq!(err.exit_code(), 2);

    let err = cli::execute_unwire(r#"{"Filter": "Age >"}"#).unwrap_err();
    assert!(matches!(err, CliError::Filter(_)));
    assert_eq!(err.exit_code(), 1);

    let err = cli::execute_unwire("not json").unwrap_err();
    assert!(matches!(err, CliError::Json(_)));
    assert_eq!(err.exit_code(), 1);
}
