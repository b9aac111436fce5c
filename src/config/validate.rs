//! Configuration validation.

use crate::config::{Config, Profile, SegmentationConfig};
use crate::error::{Error, Result};

/// Validate the entire configuration, including every profile.
///
/// Runs before any recording is processed. Cutoffs are checked against
/// their ordering here; the Nyquist limit is checked per recording once the
/// sample rate is known.
pub fn validate_config(config: &Config) -> Result<()> {
    config.filter.validate_cutoffs()?;
    validate_segmentation(&config.segmentation, "segmentation")?;
    validate_io(config)?;

    for (name, profile) in &config.profiles {
        if let Some(filter) = &profile.filter {
            filter.validate_cutoffs()?;
        }
        if let Some(segmentation) = &profile.segmentation {
            validate_segmentation(segmentation, &format!("profiles.{name}.segmentation"))?;
        }
    }

    Ok(())
}

/// Validate one segmentation table. `section` prefixes error messages.
fn validate_segmentation(seg: &SegmentationConfig, section: &str) -> Result<()> {
    let invalid = |message: String| Error::ConfigValidation {
        message: format!("{section}.{message}"),
    };

    if seg.max_event_ms == 0 {
        return Err(invalid("max_event_ms must be at least 1".to_string()));
    }
    if seg.min_event_ms > seg.max_event_ms {
        return Err(invalid(format!(
            "min_event_ms ({}) must not exceed max_event_ms ({})",
            seg.min_event_ms, seg.max_event_ms
        )));
    }

    let gap = &seg.silence_gap;
    if !gap.silence_thresh_dbfs.is_finite() {
        return Err(invalid(
            "silence_gap.silence_thresh_dbfs must be a finite number".to_string(),
        ));
    }
    if gap.min_silence_ms == 0 {
        return Err(invalid(
            "silence_gap.min_silence_ms must be at least 1".to_string(),
        ));
    }
    if gap.seek_step_ms == 0 {
        return Err(invalid("silence_gap.seek_step_ms must be at least 1".to_string()));
    }

    let energy = &seg.energy;
    if !energy.amplitude_threshold.is_finite() || energy.amplitude_threshold < 0.0 {
        return Err(invalid(format!(
            "energy.amplitude_threshold must be non-negative, got {}",
            energy.amplitude_threshold
        )));
    }
    if !energy.silence_pad_sec.is_finite() || energy.silence_pad_sec < 0.0 {
        return Err(invalid(format!(
            "energy.silence_pad_sec must be non-negative, got {}",
            energy.silence_pad_sec
        )));
    }

    Ok(())
}

/// Validate decoding, conversion and pool settings.
fn validate_io(config: &Config) -> Result<()> {
    if config.audio.target_sample_rate == Some(0) {
        return Err(Error::ConfigValidation {
            message: "audio.target_sample_rate must be greater than 0".to_string(),
        });
    }

    let convert = &config.convert;
    if convert.sample_rate == 0 {
        return Err(Error::ConfigValidation {
            message: "convert.sample_rate must be greater than 0".to_string(),
        });
    }
    if convert.channels == 0 {
        return Err(Error::ConfigValidation {
            message: "convert.channels must be at least 1".to_string(),
        });
    }
    if convert.enabled && convert.backends.is_empty() {
        return Err(Error::ConfigValidation {
            message: "convert.backends must list at least one backend".to_string(),
        });
    }

    if config.pipeline.workers == Some(0) {
        return Err(Error::ConfigValidation {
            message: "pipeline.workers must be at least 1".to_string(),
        });
    }

    Ok(())
}

/// Get a profile by name from the config.
pub fn get_profile<'a>(config: &'a Config, name: &str) -> Result<&'a Profile> {
    config.profiles.get(name).ok_or_else(|| Error::ProfileNotFound {
        name: name.to_string(),
    })
}
