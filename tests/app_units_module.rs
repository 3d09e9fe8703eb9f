use strava_setup::app::cli::CliArgs;
use strava_setup::app::units::resolve_units;
use strava_setup::app::UnitSystem;
use strava_setup::shared::errors::SetupError;

#[test]
fn explicit_overrides_win_without_prompting() {
    let args = CliArgs {
        distance_unit: Some("km".to_string()),
        elevation_unit: Some("m".to_string()),
        ..CliArgs::default()
    };
    let (distance, elevation) = resolve_units(&args, false).expect("resolve");
    assert_eq!(distance, "km");
    assert_eq!(elevation, "m");
}

#[test]
fn presets_fill_both_units() {
    let us = CliArgs {
        unit_system: Some(UnitSystem::Us),
        ..CliArgs::default()
    };
    assert_eq!(
        resolve_units(&us, false).expect("resolve"),
        ("mi".to_string(), "ft".to_string())
    );

    let metric = CliArgs {
        unit_system: Some(UnitSystem::Metric),
        ..CliArgs::default()
    };
    assert_eq!(
        resolve_units(&metric, false).expect("resolve"),
        ("km".to_string(), "m".to_string())
    );
}

#[test]
fn overrides_take_precedence_over_the_preset() {
    let args = CliArgs {
        unit_system: Some(UnitSystem::Us),
        distance_unit: Some("km".to_string()),
        ..CliArgs::default()
    };
    let (distance, elevation) = resolve_units(&args, false).expect("resolve");
    assert_eq!(distance, "km");
    assert_eq!(elevation, "ft");
}

#[test]
fn missing_units_in_non_interactive_mode_name_the_flags_to_pass() {
    let err = resolve_units(&CliArgs::default(), false).expect_err("missing units");
    match err {
        SetupError::InvalidArguments(message) => {
            assert!(message.contains("non-interactive"));
            assert!(message.contains("--distance-unit, --elevation-unit"));
        }
        other => panic!("expected InvalidArguments, got {other:?}"),
    }
}

#[test]
fn a_single_missing_unit_is_named_alone() {
    let args = CliArgs {
        distance_unit: Some("mi".to_string()),
        ..CliArgs::default()
    };
    let err = resolve_units(&args, false).expect_err("missing elevation");
    match err {
        SetupError::InvalidArguments(message) => {
            assert!(message.contains("Missing: --elevation-unit."));
        }
        other => panic!("expected InvalidArguments, got {other:?}"),
    }
}
