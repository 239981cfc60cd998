//! Projectile state and per-tick advancement.

use serde::{Deserialize, Serialize};
use squad_common::Vec2;

use crate::agent::Agent;
use crate::arena::Arena;
use crate::combat::Damageable;
use crate::events::{EventBus, Owner, SimEvent};
use crate::player::Player;

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Current position
    pub position: Vec2,
    /// Velocity in units per second
    pub velocity: Vec2,
    /// Damage dealt on hit
    pub damage: f32,
    /// Who fired it
    pub owner: Owner,
    /// Seconds left before it expires
    pub ttl: f32,
}

impl Projectile {
    /// Creates a projectile.
    #[must_use]
    pub const fn new(position: Vec2, velocity: Vec2, damage: f32, owner: Owner, ttl: f32) -> Self {
        Self {
            position,
            velocity,
            damage,
            owner,
            ttl,
        }
    }

    /// Moves the projectile and burns lifetime.
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.ttl -= dt;
    }

    /// True once the lifetime is spent.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.ttl <= 0.0
    }

    /// Whether this projectile may damage the player.
    #[must_use]
    pub const fn hits_player(&self) -> bool {
        !matches!(self.owner, Owner::Player)
    }

    /// Whether this projectile may damage agents.
    #[must_use]
    pub const fn hits_agents(&self) -> bool {
        !matches!(self.owner, Owner::Agent(_))
    }
}

fn touches<T: Damageable + ?Sized>(point: Vec2, target: &T) -> bool {
    target.is_alive() && point.distance(target.position()) < target.hit_radius()
}

/// Advances every projectile, dropping those that expire, hit level
/// geometry, or hit a valid target.
pub fn advance_projectiles(
    projectiles: &mut Vec<Projectile>,
    agents: &mut [Agent],
    player: &mut Player,
    arena: &Arena,
    dt: f32,
    events: &EventBus,
) {
    projectiles.retain_mut(|shot| {
        shot.advance(dt);
        if shot.is_expired() {
            return false;
        }
        if !arena.point_in_bounds(shot.position) || arena.point_in_obstacle(shot.position) {
            return false;
        }

        if shot.hits_player() && touches(shot.position, &*player) {
            player.apply_damage(shot.damage);
            events.publish(SimEvent::ProjectileHitPlayer {
                owner: shot.owner,
                damage: shot.damage,
            });
            return false;
        }

        if shot.hits_agents() {
            if let Some(agent) = agents.iter_mut().find(|a| touches(shot.position, &**a)) {
                agent.apply_damage(shot.damage);
                events.publish(SimEvent::ProjectileHitAgent {
                    owner: shot.owner,
                    agent: agent.id,
                    damage: shot.damage,
                });
                return false;
            }
        }

        true
    })
}
