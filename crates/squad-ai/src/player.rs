//! Player avatar: movement, health and abilities.
//!
//! The player is driven by per-tick input from the shell. Dash acts on the
//! player alone; shooting and the stun burst return effects that the world
//! applies, since they touch projectiles and agents.

use serde::{Deserialize, Serialize};
use squad_common::{direction, is_near_zero, Vec2};
use tracing::{debug, info};

use crate::agent::{Body, Cooldown};
use crate::arena::Arena;
use crate::combat::Damageable;
use crate::config::PlayerConfig;
use crate::movement;

/// Frame rate the per-frame drag factor is referenced to.
const DRAG_REFERENCE_HZ: f32 = 60.0;

/// Ability buttons pressed this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityTriggers {
    /// Dash
    pub dash: bool,
    /// Stun burst
    pub stun: bool,
    /// Shoot
    pub shoot: bool,
}

/// Input for one player tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Movement intent; any length, normalized internally
    pub movement: Vec2,
    /// Abilities requested
    pub abilities: AbilityTriggers,
    /// World-space aim point
    pub aim: Option<Vec2>,
}

impl PlayerInput {
    /// Input with movement only.
    #[must_use]
    pub fn moving(movement: Vec2) -> Self {
        Self {
            movement,
            ..Self::default()
        }
    }

    /// Adds an aim point and a shoot request.
    #[must_use]
    pub fn shooting_at(mut self, aim: Vec2) -> Self {
        self.aim = Some(aim);
        self.abilities.shoot = true;
        self
    }

    /// Adds a stun request.
    #[must_use]
    pub fn with_stun(mut self) -> Self {
        self.abilities.stun = true;
        self
    }

    /// Adds a dash request.
    #[must_use]
    pub fn with_dash(mut self) -> Self {
        self.abilities.dash = true;
        self
    }
}

/// Ability use the world has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityEffect {
    /// Dash already applied to the player's velocity
    Dash {
        /// Dash direction
        direction: Vec2,
    },
    /// Stun every agent around `center`
    Stun {
        /// Burst center
        center: Vec2,
    },
    /// Spawn a player projectile
    Shoot {
        /// Spawn point
        origin: Vec2,
        /// Projectile velocity
        velocity: Vec2,
    },
}

/// Player ability cooldowns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerCooldowns {
    /// Dash
    pub dash: Cooldown,
    /// Stun burst
    pub stun: Cooldown,
    /// Shoot
    pub shoot: Cooldown,
}

impl PlayerCooldowns {
    /// Counts every cooldown down by `dt`.
    pub fn tick(&mut self, dt: f32) {
        self.dash.tick(dt);
        self.stun.tick(dt);
        self.shoot.tick(dt);
    }
}

/// The human-controlled avatar.
#[derive(Debug, Clone)]
pub struct Player {
    /// Kinematics
    pub body: Body,
    /// Current health
    pub health: f32,
    /// Health cap
    pub max_health: f32,
    /// False once health reaches zero
    pub alive: bool,
    /// Ability cooldowns
    pub cooldowns: PlayerCooldowns,
}

impl Player {
    /// Creates a player at full health.
    #[must_use]
    pub fn new(position: Vec2, config: &PlayerConfig) -> Self {
        Self {
            body: Body::new(position, config.radius, config.max_speed),
            health: config.max_health,
            max_health: config.max_health,
            alive: true,
            cooldowns: PlayerCooldowns::default(),
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Reduces health, clamping at zero. Returns true on the fatal blow.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.alive || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            info!("player down");
            return true;
        }
        false
    }

    /// Restores health up to the cap. Returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.alive {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(self.max_health);
        self.health - before
    }

    /// Advances the player one tick.
    ///
    /// Returns the abilities that fired; stun and shoot still need the world.
    pub fn update(&mut self, dt: f32, input: &PlayerInput, config: &PlayerConfig, arena: &Arena) -> Vec<AbilityEffect> {
        let mut effects = Vec::new();
        if !self.alive || dt <= 0.0 {
            return effects;
        }
        self.cooldowns.tick(dt);

        let intent = input.movement.normalize_or_zero();
        if intent == Vec2::ZERO {
            self.body.velocity *= config.drag.powf(dt * DRAG_REFERENCE_HZ);
        } else {
            self.body.velocity += intent * config.acceleration * dt;
        }

        let mut dashing = false;
        if input.abilities.dash && self.cooldowns.dash.is_ready() {
            let heading = [intent, self.body.velocity.normalize_or_zero(), self.body.facing]
                .into_iter()
                .find(|v| *v != Vec2::ZERO)
                .unwrap_or(Vec2::X);
            self.body.velocity = heading * config.dash_force;
            self.cooldowns.dash.trigger(config.dash_cooldown);
            dashing = true;
            effects.push(AbilityEffect::Dash { direction: heading });
        }

        if input.abilities.stun && self.cooldowns.stun.is_ready() {
            self.cooldowns.stun.trigger(config.stun_cooldown);
            effects.push(AbilityEffect::Stun {
                center: self.body.position,
            });
        }

        if input.abilities.shoot && self.cooldowns.shoot.is_ready() {
            let heading = input
                .aim
                .map(|aim| direction(self.body.position, aim))
                .filter(|d| *d != Vec2::ZERO)
                .unwrap_or(self.body.facing);
            self.cooldowns.shoot.trigger(config.shoot_cooldown);
            effects.push(AbilityEffect::Shoot {
                origin: self.body.position,
                velocity: heading * config.projectile_speed,
            });
        }

        if !dashing {
            self.body.velocity = self.body.velocity.clamp_length_max(config.max_speed);
        }
        if !is_near_zero(self.body.velocity, 0.01) {
            self.body.facing = self.body.velocity.normalize_or_zero();
        }

        // Blocked axes stop dead rather than sliding with friction.
        if movement::slide_move(&mut self.body, dt, arena, 0.0, 0.0).is_none() {
            self.body.velocity = Vec2::ZERO;
        }
        self.body.position = arena.clamp_to_bounds(self.body.position, self.body.radius);

        if !effects.is_empty() {
            debug!(count = effects.len(), "player abilities");
        }
        effects
    }
}

impl Damageable for Player {
    fn position(&self) -> Vec2 {
        self.body.position
    }

    fn hit_radius(&self) -> f32 {
        self.body.radius
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn apply_damage(&mut self, amount: f32) -> bool {
        Player::apply_damage(self, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Rect;

    fn setup() -> (Player, PlayerConfig, Arena) {
        let config = PlayerConfig::default();
        let arena = Arena::from_obstacles(640.0, 480.0, 32.0, vec![Rect::new(400.0, 0.0, 40.0, 480.0)]);
        (Player::new(Vec2::new(200.0, 240.0), &config), config, arena)
    }

    #[test]
    fn test_acceleration_and_speed_cap() {
        let (mut player, config, arena) = setup();
        let input = PlayerInput::moving(Vec2::new(1.0, 0.0));
        for _ in 0..600 {
            player.update(1.0 / 60.0, &input, &config, &arena);
            assert!(player.body.velocity.length() <= config.max_speed + 1e-3);
        }
        // Walked into the wall and stopped at it.
        assert!(player.position().x <= 400.0 - player.body.radius);
    }

    #[test]
    fn test_drag_when_idle() {
        let (mut player, config, arena) = setup();
        player.body.velocity = Vec2::new(100.0, 0.0);
        player.update(1.0 / 60.0, &PlayerInput::default(), &config, &arena);
        assert!((player.body.velocity.x - 88.0).abs() < 1e-3);
    }

    #[test]
    fn test_dash_defaults_to_facing() {
        let (mut player, config, arena) = setup();
        let effects = player.update(1.0 / 60.0, &PlayerInput::default().with_dash(), &config, &arena);
        assert_eq!(effects, vec![AbilityEffect::Dash { direction: Vec2::X }]);
        assert_eq!(player.body.velocity, Vec2::new(750.0, 0.0));
        assert!(!player.cooldowns.dash.is_ready());

        // Next tick the cap applies again and the dash is cooling down.
        let effects = player.update(1.0 / 60.0, &PlayerInput::default().with_dash(), &config, &arena);
        assert!(effects.is_empty());
        assert!(player.body.velocity.length() <= config.max_speed + 1e-3);
    }

    #[test]
    fn test_shoot_aims_at_target() {
        let (mut player, config, arena) = setup();
        let input = PlayerInput::default().shooting_at(Vec2::new(200.0, 100.0));
        let effects = player.update(1.0 / 60.0, &input, &config, &arena);
        assert_eq!(
            effects,
            vec![AbilityEffect::Shoot {
                origin: Vec2::new(200.0, 240.0),
                velocity: Vec2::new(0.0, -520.0),
            }]
        );
        assert!(player.update(1.0 / 60.0, &input, &config, &arena).is_empty());
    }

    #[test]
    fn test_stun_cooldown() {
        let (mut player, config, arena) = setup();
        let input = PlayerInput::default().with_stun();
        assert_eq!(player.update(0.1, &input, &config, &arena).len(), 1);
        assert!(player.update(0.1, &input, &config, &arena).is_empty());
        for _ in 0..40 {
            player.update(0.1, &PlayerInput::default(), &config, &arena);
        }
        assert_eq!(player.update(0.1, &input, &config, &arena).len(), 1);
    }

    #[test]
    fn test_damage_and_heal() {
        let (mut player, _, _) = setup();
        assert!(!player.apply_damage(50.0));
        assert_eq!(player.heal(100.0), 50.0);
        assert_eq!(player.health, 120.0);
        assert!(player.apply_damage(500.0));
        assert_eq!(player.health, 0.0);
        assert!(!player.alive);
        assert!(!player.apply_damage(1.0));
        assert_eq!(player.heal(10.0), 0.0);
    }

    #[test]
    fn test_dead_player_ignores_input() {
        let (mut player, config, arena) = setup();
        player.apply_damage(1000.0);
        let before = player.position();
        let effects = player.update(0.1, &PlayerInput::moving(Vec2::X).with_stun(), &config, &arena);
        assert!(effects.is_empty());
        assert_eq!(player.position(), before);
    }
}
