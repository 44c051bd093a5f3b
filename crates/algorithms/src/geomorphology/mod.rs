//! Geomorphometric summaries of elevation models

mod hypsometric;

pub use hypsometric::{HypsometricCurve, HypsometricCurveAlgorithm, HypsometricParams, hypsometric_curve};
