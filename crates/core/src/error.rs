//! Error types for statgis

use thiserror::Error;

/// Main error type for statgis operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("{operation} requires at least one frame, got an empty collection")]
    EmptyInput { operation: &'static str },

    #[error("No periodic summary for {unit} {value}")]
    MissingPeriod { unit: &'static str, value: i32 },

    #[error("Band '{band}' not found. Available: {available:?}")]
    InvalidBand { band: String, available: Vec<String> },

    #[error("Frame has no timestamp")]
    MissingTimestamp,

    #[error("Timestamp {0} ms is outside the representable calendar range")]
    InvalidTimestamp(i64),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a missing band, listing what the frame does carry.
    pub fn invalid_band(band: impl Into<String>, available: Vec<String>) -> Self {
        Error::InvalidBand {
            band: band.into(),
            available,
        }
    }
}

/// Result type alias for statgis operations
pub type Result<T> = std::result::Result<T, Error>;
