//! Typed configuration loading using Figment.
//!
//! Configuration is loaded from:
//! 1. `autocollimator.toml` (base configuration, optional)
//! 2. Environment variables (prefixed with `AUTOLAB_`)
//!
//! # Environment Variable Overrides
//!
//! Environment variables with the `AUTOLAB_` prefix override configuration
//! values, with `__` separating nesting levels:
//!
//! ```text
//! AUTOLAB_APPLICATION__LOG_LEVEL=debug
//! AUTOLAB_INSTRUMENT__AUTO_ADVANCE_MS=500
//! ```
//!
//! All fields carry defaults, so the application starts without any
//! configuration file present.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{AppResult, LabError};
use crate::measurement::DEFAULT_FOCAL_LENGTH_MM;

/// Default configuration file looked up next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "autocollimator.toml";

/// Top-level application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabSettings {
    /// Application-level settings.
    #[serde(default)]
    pub application: ApplicationSettings,
    /// Simulated instrument parameters.
    #[serde(default)]
    pub instrument: InstrumentSettings,
    /// Initial window geometry.
    #[serde(default)]
    pub window: WindowSettings,
}

/// Application-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    /// Window and log identity.
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Parameters of the simulated autocollimator bench.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSettings {
    /// Focal length of the instrument in millimeters. Fixed for the whole
    /// session; the tutorial flow never changes it.
    #[serde(default = "default_focal_length")]
    pub focal_length_mm: f64,
    /// Delay before the workpiece-chosen step auto-advances, in ms.
    #[serde(default = "default_auto_advance")]
    pub auto_advance_ms: u64,
}

/// Initial window geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSettings {
    /// Initial inner width in logical points.
    #[serde(default = "default_width")]
    pub width: f32,
    /// Initial inner height in logical points.
    #[serde(default = "default_height")]
    pub height: f32,
}

fn default_name() -> String {
    "Autocollimator Lab".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_focal_length() -> f64 {
    DEFAULT_FOCAL_LENGTH_MM
}

fn default_auto_advance() -> u64 {
    2000
}

fn default_width() -> f32 {
    1200.0
}

fn default_height() -> f32 {
    800.0
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

impl Default for InstrumentSettings {
    fn default() -> Self {
        Self {
            focal_length_mm: default_focal_length(),
            auto_advance_ms: default_auto_advance(),
        }
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for LabSettings {
    fn default() -> Self {
        Self {
            application: ApplicationSettings::default(),
            instrument: InstrumentSettings::default(),
            window: WindowSettings::default(),
        }
    }
}

impl LabSettings {
    /// Load configuration from `autocollimator.toml` and environment
    /// variables, highest precedence last:
    ///
    /// 1. built-in defaults
    /// 2. the configuration file (if present)
    /// 3. `AUTOLAB_` environment variables
    ///
    /// After loading, the configuration is validated.
    pub fn load() -> AppResult<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let settings: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("AUTOLAB_").split("__"))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading.
    ///
    /// Checks that the log level is recognized, the focal length is
    /// positive, and the auto-advance delay is non-zero.
    pub fn validate(&self) -> AppResult<()> {
        match self.application.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LabError::Configuration(format!(
                    "invalid log level '{other}' (expected trace, debug, info, warn, or error)"
                )))
            }
        }

        if !self.instrument.focal_length_mm.is_finite() || self.instrument.focal_length_mm <= 0.0 {
            return Err(LabError::Configuration(format!(
                "focal length must be positive, got {}",
                self.instrument.focal_length_mm
            )));
        }

        if self.instrument.auto_advance_ms == 0 {
            return Err(LabError::Configuration(
                "auto_advance_ms must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_load_without_file() {
        let settings = LabSettings::load_from("/nonexistent/autocollimator.toml")
            .expect("defaults should load");
        assert_eq!(settings.instrument.focal_length_mm, 150.0);
        assert_eq!(settings.instrument.auto_advance_ms, 2000);
        assert_eq!(settings.application.log_level, "info");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[instrument]\nauto_advance_ms = 250\n\n[application]\nlog_level = \"debug\""
        )
        .expect("write config");

        let settings = LabSettings::load_from(file.path()).expect("load");
        assert_eq!(settings.instrument.auto_advance_ms, 250);
        assert_eq!(settings.application.log_level, "debug");
        // Untouched values keep their defaults.
        assert_eq!(settings.instrument.focal_length_mm, 150.0);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = LabSettings::default();
        settings.instrument.focal_length_mm = -1.0;
        assert!(settings.validate().is_err());

        let mut settings = LabSettings::default();
        settings.application.log_level = "verbose".to_string();
        assert!(settings.validate().is_err());

        let mut settings = LabSettings::default();
        settings.instrument.auto_advance_ms = 0;
        assert!(settings.validate().is_err());
    }
}
