//! Error types for the squad simulation.
//!
//! The per-tick simulation path never fails; these errors only surface from
//! configuration checking and loading.

use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum SquadError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Problems found by a strict configuration check.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero or negative
    #[error("{field} must be positive, got {value}")]
    NonPositive {
        /// Offending field
        field: &'static str,
        /// Value found
        value: f32,
    },

    /// Map cannot hold a single grid tile
    #[error("map {width}x{height} is smaller than one {tile} tile")]
    MapTooSmall {
        /// Map width
        width: f32,
        /// Map height
        height: f32,
        /// Tile size
        tile: f32,
    },

    /// Obstacle rectangle lies outside the map
    #[error("obstacle {index} lies outside the map")]
    ObstacleOutsideMap {
        /// Index in the obstacle list
        index: usize,
    },

    /// A min/max pair is inverted
    #[error("{field}: min {min} exceeds max {max}")]
    InvalidRange {
        /// Offending field
        field: &'static str,
        /// Lower bound
        min: f32,
        /// Upper bound
        max: f32,
    },
}

/// Result type alias for squad operations.
pub type SquadResult<T> = Result<T, SquadError>;
