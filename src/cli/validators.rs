//! CLI argument validators.
//!
//! Shared validation functions for CLI argument parsing.

/// Parse and validate a bounded float value.
///
/// # Arguments
///
/// * `s` - The string to parse
/// * `min` - Minimum allowed value (inclusive)
/// * `max` - Maximum allowed value (inclusive)
/// * `name` - Name of the parameter for error messages
pub fn parse_bounded_float(s: &str, min: f64, max: f64, name: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if !(min..=max).contains(&value) {
        return Err(format!(
            "{name} must be between {min} and {max}, got {value}"
        ));
    }

    Ok(value)
}

/// Parse a cutoff frequency in Hz (greater than 0).
pub fn parse_frequency(s: &str) -> Result<f64, String> {
    let value = parse_bounded_float(s, 0.0, f64::MAX, "frequency")?;
    if value == 0.0 {
        return Err("frequency must be greater than 0".to_string());
    }
    Ok(value)
}

/// Parse a silence threshold in dBFS (-200.0 to 0.0).
pub fn parse_dbfs(s: &str) -> Result<f64, String> {
    parse_bounded_float(s, -200.0, 0.0, "silence threshold (dBFS)")
}

/// Parse a linear amplitude threshold (0.0-1.0).
#[allow(clippy::cast_possible_truncation)]
pub fn parse_amplitude(s: &str) -> Result<f32, String> {
    parse_bounded_float(s, 0.0, 1.0, "amplitude threshold").map(|v| v as f32)
}

/// Parse a non-negative duration in seconds.
pub fn parse_seconds(s: &str) -> Result<f64, String> {
    parse_bounded_float(s, 0.0, f64::MAX, "duration")
}
