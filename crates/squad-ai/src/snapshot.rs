//! Serializable read-only views of world state.
//!
//! Presentation layers and the headless runner read these instead of
//! reaching into the simulation.

use serde::{Deserialize, Serialize};
use squad_common::{AgentId, Vec2};

use crate::agent::{Agent, Role};
use crate::arena::{Arena, Rect};
use crate::events::Owner;
use crate::fsm::AgentState;
use crate::player::Player;
use crate::projectile::Projectile;

/// One agent as seen from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Handle
    pub id: AgentId,
    /// Role
    pub role: Role,
    /// Current FSM state
    pub state: AgentState,
    /// Position
    pub position: Vec2,
    /// Velocity
    pub velocity: Vec2,
    /// Unit facing vector
    pub facing: Vec2,
    /// Health
    pub health: f32,
    /// Alive flag
    pub alive: bool,
    /// True while stunned
    pub stunned: bool,
    /// Remembered target position
    pub last_seen: Option<Vec2>,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            role: agent.role,
            state: agent.state,
            position: agent.body.position,
            velocity: agent.body.velocity,
            facing: agent.body.facing,
            health: agent.health,
            alive: agent.alive,
            stunned: agent.is_stunned(),
            last_seen: agent.memory.last_seen,
        }
    }
}

/// The player as seen from outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Position
    pub position: Vec2,
    /// Velocity
    pub velocity: Vec2,
    /// Unit facing vector
    pub facing: Vec2,
    /// Health
    pub health: f32,
    /// Health cap
    pub max_health: f32,
    /// Alive flag
    pub alive: bool,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            position: player.body.position,
            velocity: player.body.velocity,
            facing: player.body.facing,
            health: player.health,
            max_health: player.max_health,
            alive: player.alive,
        }
    }
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    /// Position
    pub position: Vec2,
    /// Velocity
    pub velocity: Vec2,
    /// Shooter
    pub owner: Owner,
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(shot: &Projectile) -> Self {
        Self {
            position: shot.position,
            velocity: shot.velocity,
            owner: shot.owner,
        }
    }
}

/// Static level layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    /// Map width
    pub width: f32,
    /// Map height
    pub height: f32,
    /// Tile edge length
    pub tile_size: f32,
    /// Obstacle rectangles
    pub obstacles: Vec<Rect>,
}

impl From<&Arena> for ArenaSnapshot {
    fn from(arena: &Arena) -> Self {
        Self {
            width: arena.width(),
            height: arena.height(),
            tile_size: arena.tile_size(),
            obstacles: arena.obstacles().to_vec(),
        }
    }
}

/// Complete world state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Simulated seconds since construction
    pub elapsed: f64,
    /// Level layout
    pub arena: ArenaSnapshot,
    /// The player
    pub player: PlayerSnapshot,
    /// Every agent, dead ones included
    pub agents: Vec<AgentSnapshot>,
    /// Projectiles in flight
    pub projectiles: Vec<ProjectileSnapshot>,
    /// Remaining pickup positions
    pub pickups: Vec<Vec2>,
}

impl WorldSnapshot {
    /// Number of live agents.
    #[must_use]
    pub fn living_agents(&self) -> usize {
        self.agents.iter().filter(|a| a.alive).count()
    }

    /// Number of agents currently in `state`.
    #[must_use]
    pub fn count_in(&self, state: AgentState) -> usize {
        self.agents.iter().filter(|a| a.state == state).count()
    }
}
