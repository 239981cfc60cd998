//! Scripted player for headless runs.
//!
//! Reads the world and produces the input a cautious human might: keep
//! distance, pick up hearts when hurt, shoot what is in range, stun a
//! crowd, dash out of contact.

use serde::{Deserialize, Serialize};
use squad_ai::{Agent, PlayerInput, World};
use squad_common::{direction, Vec2};

/// Autopilot tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Back away from agents closer than this
    pub kite_distance: f32,
    /// Close in on agents farther than this
    pub engage_distance: f32,
    /// Go for hearts below this fraction of max health
    pub hurt_fraction: f32,
    /// Shoot agents within this distance
    pub shoot_range: f32,
    /// Dash away from agents within this distance
    pub contact_distance: f32,
    /// Stun when at least this many agents are inside the stun radius
    pub stun_crowd: usize,
    /// Weight of the pull toward the map center, keeps the player off walls
    pub centering: f32,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            kite_distance: 220.0,
            engage_distance: 360.0,
            hurt_fraction: 0.6,
            shoot_range: 420.0,
            contact_distance: 40.0,
            stun_crowd: 2,
            centering: 0.3,
        }
    }
}

impl AutopilotConfig {
    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.kite_distance = self.kite_distance.max(0.0);
        self.engage_distance = self.engage_distance.max(self.kite_distance);
        self.hurt_fraction = self.hurt_fraction.clamp(0.0, 1.0);
        self.shoot_range = self.shoot_range.max(0.0);
        self.contact_distance = self.contact_distance.max(0.0);
        self.stun_crowd = self.stun_crowd.max(1);
        self.centering = self.centering.clamp(0.0, 1.0);
    }
}

/// Player controller driven by world state.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    config: AutopilotConfig,
}

impl Autopilot {
    /// Create an autopilot.
    #[must_use]
    pub const fn new(config: AutopilotConfig) -> Self {
        Self { config }
    }

    /// Input for the next player tick.
    #[must_use]
    pub fn decide(&self, world: &World) -> PlayerInput {
        let player = world.player();
        if !player.alive {
            return PlayerInput::default();
        }
        let position = player.position();
        let nearest = nearest_agent(world, position);

        let hurt = player.health < player.max_health * self.config.hurt_fraction;
        let heart = world
            .pickups()
            .iter()
            .map(|p| p.position)
            .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)));

        let mut movement = match (hurt, heart, nearest) {
            (true, Some(heart), _) => direction(position, heart),
            (_, _, Some((agent, distance))) if distance < self.config.kite_distance => {
                direction(agent.position(), position)
            },
            (_, _, Some((agent, distance))) if distance > self.config.engage_distance => {
                direction(position, agent.position())
            },
            _ => Vec2::ZERO,
        };
        movement += direction(position, world.arena().center()) * self.config.centering;

        let mut input = PlayerInput::moving(movement);

        if let Some((agent, distance)) = nearest {
            if distance < self.config.shoot_range {
                input = input.shooting_at(agent.position());
            }
            if distance < self.config.contact_distance {
                input = input.with_dash();
            }
        }

        let stun_radius = world.config().player.stun_radius;
        let crowd = world
            .agents()
            .iter()
            .filter(|a| a.alive && a.position().distance(position) < stun_radius)
            .count();
        if crowd >= self.config.stun_crowd {
            input = input.with_stun();
        }

        input
    }
}

fn nearest_agent(world: &World, position: Vec2) -> Option<(&Agent, f32)> {
    world
        .agents()
        .iter()
        .filter(|a| a.alive)
        .map(|a| (a, a.position().distance(position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
