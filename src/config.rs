//! Engine configuration, loaded from environment variables or defaults.

use std::env;

use crate::optimizer::PackerParams;

/// Complete engine configuration.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    packing: PackerParams,
}

impl EngineConfig {
    const CONTAINER_SIZE_VAR: &'static str = "CUBEFIT_CONTAINER_SIZE";
    const GRID_STEP_VAR: &'static str = "CUBEFIT_GRID_STEP";
    const OVERSIZE_LIMIT_VAR: &'static str = "CUBEFIT_OVERSIZE_LIMIT";
    const MAX_GROUP_RATIO_VAR: &'static str = "CUBEFIT_MAX_GROUP_RATIO";

    /// Creates a configuration from the currently available environment
    /// variables.
    pub fn from_env() -> Self {
        let container_size = load_f64_with_warning(
            Self::CONTAINER_SIZE_VAR,
            PackerParams::DEFAULT_CONTAINER_SIZE,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted cube size changes every layout",
        );

        let grid_step = load_f64_with_warning(
            Self::GRID_STEP_VAR,
            PackerParams::DEFAULT_GRID_STEP,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted grid step size may affect packing quality",
        );

        let oversize_limit = load_f64_with_warning(
            Self::OVERSIZE_LIMIT_VAR,
            PackerParams::DEFAULT_OVERSIZE_LIMIT,
            |value| value > 0.0,
            "must be greater than 0",
            "Warning: Adjusted oversized threshold changes which items are excluded",
        );

        let max_group_ratio = load_f64_with_warning(
            Self::MAX_GROUP_RATIO_VAR,
            PackerParams::DEFAULT_MAX_GROUP_RATIO,
            |value| value > 0.0 && value <= 1.0,
            "must be between 0 and 1",
            "Warning: Adjusted group area limit may split or merge series",
        );

        let packing = PackerParams::builder()
            .container_size(container_size)
            .grid_step(grid_step)
            .oversize_limit(oversize_limit)
            .max_group_ratio(max_group_ratio)
            .build()
            .sanitized();

        Self { packing }
    }

    /// Returns the configured engine parameters.
    pub fn packer_params(&self) -> PackerParams {
        self.packing
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            eprintln!(
                "⚠️ Access to {} failed: {}. Using default value.",
                name, err
            );
            None
        }
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !validator(value) {
                    eprintln!(
                        "⚠️ {} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        println!("⚠️ {} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                eprintln!(
                    "⚠️ Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
