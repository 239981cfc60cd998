//! # Squad AI
//!
//! Real-time simulation of a hostile squad hunting a player in a 2D arena.
//!
//! This crate provides:
//! - Arena geometry and the tile occupancy grid
//! - A* pathfinding over the grid
//! - Steering behaviors (seek, flee, separation, cohesion, alignment)
//! - Perception with field of view, line of sight and target memory
//! - A per-agent state machine (Patrol, Engage, Search, Retreat, Dead)
//! - Movement with collision sliding and anti-stuck recovery
//! - Combat, projectiles and role abilities
//! - Squad-wide alerts and retreats
//! - The player avatar, pickups, snapshots and the event bus
//! - [`World`], which owns all of the above and advances it tick by tick

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod arena;
pub mod behavior;
pub mod combat;
pub mod config;
pub mod events;
pub mod fsm;
pub mod movement;
pub mod pathfinding;
pub mod perception;
pub mod pickup;
pub mod player;
pub mod projectile;
pub mod snapshot;
pub mod squad;
pub mod steering;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::arena::*;
    pub use crate::behavior::{SquadView, TickContext};
    pub use crate::combat::Damageable;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::fsm::AgentState;
    pub use crate::pathfinding::*;
    pub use crate::pickup::Pickup;
    pub use crate::player::*;
    pub use crate::projectile::Projectile;
    pub use crate::snapshot::*;
    pub use crate::squad::SquadOrder;
    pub use crate::steering::Neighbor;
    pub use crate::world::*;
}

pub use prelude::*;
