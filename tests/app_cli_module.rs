use strava_setup::app::{parse_cli_args, UnitSystem};

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn defaults_apply_when_no_flags_are_given() {
    let parsed = parse_cli_args(&[]).expect("parse");
    assert_eq!(parsed.port, 8765);
    assert_eq!(parsed.timeout_seconds, 180);
    assert_eq!(parsed.scope, "read,activity:read_all");
    assert!(parsed.client_id.is_none());
    assert!(parsed.repo.is_none());
    assert!(parsed.unit_system.is_none());
    assert!(!parsed.no_browser);
    assert!(!parsed.no_auto_github);
    assert!(!parsed.no_watch);
    assert!(!parsed.help);
}

#[test]
fn all_flags_parse_together() {
    let parsed = parse_cli_args(&args(&[
        "--client-id",
        "12345",
        "--client-secret",
        "shh",
        "--repo",
        "octo/dashboard",
        "--unit-system",
        "metric",
        "--distance-unit",
        "km",
        "--elevation-unit",
        "m",
        "--port",
        "9000",
        "--timeout",
        "60",
        "--scope",
        "read",
        "--no-browser",
        "--no-auto-github",
        "--no-watch",
    ]))
    .expect("parse");

    assert_eq!(parsed.client_id.as_deref(), Some("12345"));
    assert_eq!(parsed.client_secret.as_deref(), Some("shh"));
    assert_eq!(parsed.repo.as_deref(), Some("octo/dashboard"));
    assert_eq!(parsed.unit_system, Some(UnitSystem::Metric));
    assert_eq!(parsed.distance_unit.as_deref(), Some("km"));
    assert_eq!(parsed.elevation_unit.as_deref(), Some("m"));
    assert_eq!(parsed.port, 9000);
    assert_eq!(parsed.timeout_seconds, 60);
    assert_eq!(parsed.scope, "read");
    assert!(parsed.no_browser);
    assert!(parsed.no_auto_github);
    assert!(parsed.no_watch);
}

#[test]
fn help_short_and_long_forms_are_recognized() {
    assert!(parse_cli_args(&args(&["--help"])).expect("parse").help);
    assert!(parse_cli_args(&args(&["-h"])).expect("parse").help);
}

#[test]
fn unit_flags_reject_unknown_values() {
    let err = parse_cli_args(&args(&["--unit-system", "imperial"])).expect_err("invalid system");
    assert!(err.contains("us or metric"));

    let err = parse_cli_args(&args(&["--distance-unit", "furlong"])).expect_err("invalid distance");
    assert!(err.contains("mi or km"));

    let err = parse_cli_args(&args(&["--elevation-unit", "yd"])).expect_err("invalid elevation");
    assert!(err.contains("ft or m"));
}

#[test]
fn port_must_be_a_nonzero_u16() {
    for value in ["0", "65536", "abc", "-1"] {
        let err = parse_cli_args(&args(&["--port", value])).expect_err("invalid port");
        assert_eq!(err, "--port must be between 1 and 65535.");
    }
}

#[test]
fn timeout_must_be_a_positive_number_of_seconds() {
    for value in ["0", "abc"] {
        let err = parse_cli_args(&args(&["--timeout", value])).expect_err("invalid timeout");
        assert_eq!(err, "--timeout must be a positive number of seconds.");
    }
}

#[test]
fn value_flags_require_a_value() {
    let err = parse_cli_args(&args(&["--client-id"])).expect_err("missing value");
    assert_eq!(err, "--client-id requires a value");
}

#[test]
fn unknown_flags_are_rejected_by_name() {
    let err = parse_cli_args(&args(&["--verbose"])).expect_err("unknown flag");
    assert!(err.contains("--verbose"));
}
