use crate::app::cli::{CliArgs, UnitSystem};
use crate::app::prompt::{self, PromptError};
use crate::shared::errors::SetupError;

pub const UNIT_PRESET_US: (&str, &str) = ("mi", "ft");
pub const UNIT_PRESET_METRIC: (&str, &str) = ("km", "m");

/// Resolves the (distance, elevation) unit pair from flags, presets, and
/// the interactive chooser, in that order. Non-interactive runs with
/// missing units fail with the exact flags to pass.
pub fn resolve_units(args: &CliArgs, interactive: bool) -> Result<(String, String), SetupError> {
    let mut distance = args.distance_unit.clone();
    let mut elevation = args.elevation_unit.clone();

    if let Some(system) = args.unit_system {
        let (preset_distance, preset_elevation) = match system {
            UnitSystem::Us => UNIT_PRESET_US,
            UnitSystem::Metric => UNIT_PRESET_METRIC,
        };
        distance.get_or_insert_with(|| preset_distance.to_string());
        elevation.get_or_insert_with(|| preset_elevation.to_string());
    }

    if let (Some(distance), Some(elevation)) = (&distance, &elevation) {
        return Ok((distance.clone(), elevation.clone()));
    }

    if interactive {
        let (prompted_distance, prompted_elevation) = prompt_units()?;
        return Ok((
            distance.unwrap_or(prompted_distance),
            elevation.unwrap_or(prompted_elevation),
        ));
    }

    let mut missing = Vec::new();
    if distance.is_none() {
        missing.push("--distance-unit");
    }
    if elevation.is_none() {
        missing.push("--elevation-unit");
    }
    Err(SetupError::InvalidArguments(format!(
        "Missing unit selection in non-interactive mode. Provide both \
         --distance-unit/--elevation-unit or pass --unit-system {{us|metric}}. Missing: {}.",
        missing.join(", ")
    )))
}

fn prompt_units() -> Result<(String, String), PromptError> {
    println!("\nChoose unit system:");
    println!("  1) US (miles + feet)");
    println!("  2) Metric (km + meters)");
    println!("  3) Custom");
    let system = prompt::prompt_choice(
        "Selection [1]: ",
        &[("1", "us"), ("2", "metric"), ("3", "custom")],
        "1",
    )?;

    if system == "us" {
        return Ok((UNIT_PRESET_US.0.to_string(), UNIT_PRESET_US.1.to_string()));
    }
    if system == "metric" {
        return Ok((
            UNIT_PRESET_METRIC.0.to_string(),
            UNIT_PRESET_METRIC.1.to_string(),
        ));
    }

    let distance = prompt::prompt_choice(
        "Distance unit [mi/km] (default: mi): ",
        &[("mi", "mi"), ("km", "km")],
        "mi",
    )?;
    let elevation = prompt::prompt_choice(
        "Elevation unit [ft/m] (default: ft): ",
        &[("ft", "ft"), ("m", "m")],
        "ft",
    )?;
    Ok((distance, elevation))
}
