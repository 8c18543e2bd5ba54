//! Pure measurement model for the autocollimator.
//!
//! An autocollimator projects a collimated beam onto a reflector mounted on
//! the workpiece and measures the linear displacement `d` of the reflected
//! crosshair image from the fixed reticle. The tilt of the surface follows
//! from the instrument's focal length:
//!
//! ```text
//! theta = d / (2 * f)        (radians, d and f in the same unit)
//! ```
//!
//! The simulator does not model the optics physically. Each workpiece type
//! has a fixed table of expected displacements, one per reading, which the
//! student must read off the eyepiece scale and enter exactly.

use serde::{Deserialize, Serialize};

/// Focal length of the simulated instrument in millimeters.
pub const DEFAULT_FOCAL_LENGTH_MM: f64 = 150.0;

/// Distance the reflector is moved between readings, in millimeters.
pub const REFLECTOR_STEP_MM: i32 = 50;

/// Number of readings in a complete experiment run.
pub const READING_COUNT: usize = 5;

/// Expected crosshair displacements for the flat workpiece, by reading index.
const FLAT_DEVIATIONS_MM: [f64; READING_COUNT] = [0.002, 0.002, 0.003, 0.002, 0.003];

/// Expected crosshair displacements for the tapered workpiece, by reading index.
const TAPERED_DEVIATIONS_MM: [f64; READING_COUNT] = [0.005, 0.013, 0.022, 0.031, 0.040];

/// The test surface whose tilt is being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Workpiece {
    /// Nominally flat surface; displacements stay near zero.
    Flat,
    /// Uniformly tapered surface; displacement grows with position.
    Tapered,
}

impl Workpiece {
    /// Human-readable label used in diagrams and legends.
    pub fn label(self) -> &'static str {
        match self {
            Workpiece::Flat => "Flat Workpiece",
            Workpiece::Tapered => "Tapered Workpiece",
        }
    }

    /// Expected crosshair displacement in mm for a given reading index.
    ///
    /// Indices past the table reuse the last entry. Under the normal flow
    /// the index never exceeds the table given the five-reading cap.
    pub fn expected_deviation_mm(self, reading_index: usize) -> f64 {
        let table = match self {
            Workpiece::Flat => &FLAT_DEVIATIONS_MM,
            Workpiece::Tapered => &TAPERED_DEVIATIONS_MM,
        };
        table[reading_index.min(table.len() - 1)]
    }
}

/// Converts a crosshair displacement to a tilt angle in milliradians.
///
/// `theta = (d / (2 * f)) * 1000`, with both lengths in millimeters.
pub fn tilt_angle_mrad(displacement_mm: f64, focal_length_mm: f64) -> f64 {
    (displacement_mm / (2.0 * focal_length_mm)) * 1000.0
}

/// Rounds to four decimal places, the precision recorded for theta.
pub fn round_mrad(theta: f64) -> f64 {
    (theta * 10_000.0).round() / 10_000.0
}

/// Display-only reflector tilt for the bench diagram, in degrees.
///
/// The tapered surface tilts the mirror proportionally to its position; the
/// flat surface shows a small jitter generated by the state machine. Neither
/// value enters any calculation or validation.
pub fn reflector_tilt_deg(workpiece: Workpiece, position_mm: i32, flat_jitter_deg: f64) -> f64 {
    match workpiece {
        Workpiece::Tapered => f64::from(position_mm) * 0.02,
        Workpiece::Flat => flat_jitter_deg,
    }
}

/// A single recorded measurement. Immutable once appended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Reflector position along the workpiece in millimeters.
    pub position_mm: i32,
    /// Crosshair displacement entered by the student, in millimeters.
    pub displacement_mm: f64,
    /// Derived tilt angle in milliradians, rounded to four decimal places.
    pub theta_mrad: f64,
}

impl Reading {
    /// Builds a reading from a validated displacement at the given position.
    pub fn new(position_mm: i32, displacement_mm: f64, focal_length_mm: f64) -> Self {
        Self {
            position_mm,
            displacement_mm,
            theta_mrad: round_mrad(tilt_angle_mrad(displacement_mm, focal_length_mm)),
        }
    }
}
