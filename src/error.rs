//! Custom error types for the application.
//!
//! This module defines the primary error type, `LabError`, for the entire
//! application. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the few failure modes the simulator has:
//!
//! - **`Config`**: wraps errors from the `figment` crate, typically file
//!   parsing or format issues in the configuration file.
//! - **`Configuration`**: semantic errors in the configuration, such as
//!   values that parse but are logically invalid (e.g., a non-positive focal
//!   length). These are caught during the validation step.
//! - **`Io`**: wraps standard `std::io::Error` for file I/O issues.
//! - **`DeviationRejected`**: the one user-facing experiment error. A
//!   displacement submission is accepted only when it matches the expected
//!   value exactly; anything else (including unparseable input) produces
//!   this error, whose display message carries the expected value so the
//!   GUI can show it inline.
//!
//! By using `#[from]`, `LabError` can be seamlessly created from underlying
//! error types, simplifying error handling with the `?` operator.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, LabError>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum LabError {
    /// Configuration file could not be loaded or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Configuration loaded but failed semantic validation.
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// Underlying file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Submitted displacement did not match the expected value exactly.
    #[error("Incorrect value! Please enter the exact value: {expected_mm:.3} mm")]
    DeviationRejected {
        /// The displacement the student was expected to enter, in mm.
        expected_mm: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deviation_rejected_message_format() {
        let err = LabError::DeviationRejected { expected_mm: 0.002 };
        assert_eq!(
            err.to_string(),
            "Incorrect value! Please enter the exact value: 0.002 mm"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = LabError::Configuration("focal length must be positive".into());
        assert!(err.to_string().contains("focal length"));
    }
}
