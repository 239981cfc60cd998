//! # Squad Common
//!
//! Common types and utilities shared by the squad simulation crates.
//!
//! This crate provides:
//! - 2D vector helpers on top of `glam::Vec2`
//! - ID types (AgentId)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_index_roundtrip() {
        let id = AgentId::from_index(3);
        assert_eq!(id.index(), 3);
        assert_eq!(id, AgentId::from_raw(3));
    }

    #[test]
    fn test_error_conversion() {
        let err: SquadError = ConfigError::NonPositive {
            field: "tile_size",
            value: 0.0,
        }
        .into();
        assert!(err.to_string().contains("tile_size"));
    }
}
