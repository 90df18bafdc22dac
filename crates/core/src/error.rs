//! Error types for SMRF

use thiserror::Error;

/// Main error type for SMRF operations
#[derive(Error, Debug)]
pub enum Error {
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

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Unrecognized option: {0}")]
    UnknownOption(String),

    #[error("Grid spacing mismatch: |dx| = {dx} but |dy| = {dy}")]
    GridSpacingMismatch { dx: f64, dy: f64 },

    #[error("Point cloud is empty")]
    EmptyPointCloud,

    #[error("Coordinate length mismatch: x = {x}, y = {y}, z = {z}")]
    LengthMismatch { x: usize, y: usize, z: usize },

    #[error("No grid cell received a point ({dropped} points fell outside the grid)")]
    NoPopulatedCells { dropped: usize },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error stems from missing or contradictory parameters.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidParameter { .. }
                | Error::MissingParameter(_)
                | Error::UnknownOption(_)
                | Error::GridSpacingMismatch { .. }
        )
    }

    /// Whether this error stems from the input point cloud itself.
    pub fn is_data(&self) -> bool {
        matches!(
            self,
            Error::EmptyPointCloud | Error::LengthMismatch { .. } | Error::NoPopulatedCells { .. }
        )
    }
}

/// Result type alias for SMRF operations
pub type Result<T> = std::result::Result<T, Error>;
