//! Core library for the autocollimator lab simulator.
//!
//! This library contains the experiment state machine, the measurement
//! model, and the egui presentation layer for an interactive simulation of
//! an optical autocollimator experiment: the student selects a workpiece,
//! switches on the light source, records crosshair-displacement readings at
//! five reflector positions, and views the derived tilt graph.

pub mod app;
pub mod config;
pub mod error;
pub mod experiment;
pub mod gui;
pub mod measurement;
