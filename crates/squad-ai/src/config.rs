//! Simulation configuration.
//!
//! Every tunable the simulation reads lives here, grouped by subsystem.
//! All groups deserialize with `#[serde(default)]`, so a partial TOML table
//! only overrides the keys it names.

use serde::{Deserialize, Serialize};
use squad_common::ConfigError;

use crate::agent::Role;
use crate::arena::Rect;

/// Complete simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimConfig {
    /// Map geometry
    pub map: MapConfig,
    /// Target detection
    pub perception: PerceptionConfig,
    /// Flocking weights and radii
    pub steering: SteeringConfig,
    /// Movement resolver
    pub movement: MovementConfig,
    /// FSM thresholds and speeds
    pub behavior: BehaviorConfig,
    /// Abilities and projectiles
    pub combat: CombatConfig,
    /// Squad coordination
    pub squad: SquadConfig,
    /// Player avatar
    pub player: PlayerConfig,
    /// Spawning of agents and pickups
    pub spawn: SpawnConfig,
    /// Per-role base stats
    pub roles: RoleTable,
}

/// Map geometry and static obstacles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Viewport width, carried for the presentation shell
    pub view_width: f32,
    /// Viewport height, carried for the presentation shell
    pub view_height: f32,
    /// Map width in world units
    pub width: f32,
    /// Map height in world units
    pub height: f32,
    /// Grid tile edge length
    pub tile_size: f32,
    /// Axis-aligned obstacle rectangles
    pub obstacles: Vec<Rect>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            view_width: 960.0,
            view_height: 540.0,
            width: 1280.0,
            height: 720.0,
            tile_size: 32.0,
            obstacles: vec![
                Rect::new(300.0, 120.0, 160.0, 120.0),
                Rect::new(120.0, 380.0, 220.0, 100.0),
                Rect::new(680.0, 260.0, 180.0, 160.0),
                Rect::new(480.0, 480.0, 220.0, 100.0),
            ],
        }
    }
}

/// Target detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Maximum detection distance
    pub detection_range: f32,
    /// Full field-of-view angle in degrees
    pub fov_degrees: f32,
    /// Line-of-sight samples along the sight segment
    pub los_samples: u32,
    /// Step used by the ray-march occlusion query
    pub los_step: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            detection_range: 380.0,
            fov_degrees: 90.0,
            los_samples: 12,
            los_step: 8.0,
        }
    }
}

/// Flocking parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Radius inside which other live agents count as neighbors
    pub neighbor_radius: f32,
    /// Neighbors closer than this push the agent away
    pub separation_radius: f32,
    /// Numerator of the inverse-distance separation weight
    pub separation_strength: f32,
    /// Speed used to seek the neighbor centroid
    pub cohesion_speed: f32,
    /// Blend weight of separation
    pub separation_weight: f32,
    /// Blend weight of cohesion
    pub cohesion_weight: f32,
    /// Blend weight of alignment
    pub alignment_weight: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            neighbor_radius: 140.0,
            separation_radius: 50.0,
            separation_strength: 60.0,
            cohesion_speed: 40.0,
            separation_weight: 1.2,
            cohesion_weight: 0.35,
            alignment_weight: 0.4,
        }
    }
}

/// Movement resolver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Velocity smoothing rate per second
    pub velocity_smoothing: f32,
    /// Velocity factor applied to the blocked axis while sliding
    pub slide_friction: f32,
    /// Extra clearance kept from obstacles
    pub collision_margin: f32,
    /// Distance of the random unstick nudge
    pub unstick_nudge: f32,
    /// Minimum L1 speed before facing follows velocity
    pub facing_epsilon: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            velocity_smoothing: 6.0,
            slide_friction: 0.35,
            collision_margin: 2.0,
            unstick_nudge: 6.0,
            facing_epsilon: 0.01,
        }
    }
}

/// State machine thresholds, speeds and timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Fraction of max speed while patrolling
    pub patrol_speed_factor: f32,
    /// Distance at which a patrol point counts as reached
    pub patrol_arrival: f32,
    /// Patrol points stay this far from the map edge
    pub patrol_margin: f32,
    /// Draws spent looking for an unblocked patrol point
    pub patrol_attempts: u32,
    /// Seconds without sight before Engage gives up and searches
    pub lost_sight_grace: f32,
    /// Engage retreats below this health
    pub low_health_threshold: f32,
    /// Retreat ends above this health
    pub recover_health_threshold: f32,
    /// Fraction of max speed while fleeing
    pub retreat_speed_factor: f32,
    /// Minimum seconds spent in Retreat
    pub retreat_min_duration: f32,
    /// Mean search duration in seconds
    pub search_timeout_base: f32,
    /// Uniform jitter applied around the search base
    pub search_timeout_jitter: f32,
    /// Fraction of max speed while approaching the last-seen point
    pub search_speed_factor: f32,
    /// Distance to the last-seen point that starts the sweep
    pub search_arrival: f32,
    /// Inner radius of the sweep annulus
    pub sweep_radius_min: f32,
    /// Outer radius of the sweep annulus
    pub sweep_radius_max: f32,
    /// Fraction of max speed while sweeping
    pub sweep_speed_factor: f32,
    /// Distance at which a path waypoint counts as reached
    pub waypoint_arrival: f32,
    /// Seconds between path replans
    pub replan_interval: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            patrol_speed_factor: 0.45,
            patrol_arrival: 12.0,
            patrol_margin: 60.0,
            patrol_attempts: 16,
            lost_sight_grace: 0.7,
            low_health_threshold: 20.0,
            recover_health_threshold: 70.0,
            retreat_speed_factor: 0.9,
            retreat_min_duration: 2.5,
            search_timeout_base: 5.0,
            search_timeout_jitter: 1.0,
            search_speed_factor: 0.85,
            search_arrival: 30.0,
            sweep_radius_min: 60.0,
            sweep_radius_max: 150.0,
            sweep_speed_factor: 0.7,
            waypoint_arrival: 10.0,
            replan_interval: 0.6,
        }
    }
}

/// Ability and projectile tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Contact distance for melee damage
    pub melee_range: f32,
    /// Melee damage per second
    pub melee_dps: f32,
    /// Seconds between charges
    pub charge_cooldown: f32,
    /// Charge impulse speed
    pub charge_speed: f32,
    /// Charges only start beyond this distance
    pub charge_min_distance: f32,
    /// Seconds between Shooter shots
    pub shoot_cooldown: f32,
    /// Shooter fire range
    pub shoot_range: f32,
    /// Shooter projectile speed
    pub projectile_speed: f32,
    /// Shooter projectile damage
    pub projectile_damage: f32,
    /// Projectile lifetime in seconds
    pub projectile_ttl: f32,
    /// Seconds between Support heals
    pub heal_cooldown: f32,
    /// Heal scan radius
    pub heal_radius: f32,
    /// Health restored per heal
    pub heal_amount: f32,
    /// Allies at or above this health are not healed; heals cap here
    pub heal_ceiling: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            melee_range: 22.0,
            melee_dps: 18.0,
            charge_cooldown: 3.0,
            charge_speed: 420.0,
            charge_min_distance: 70.0,
            shoot_cooldown: 1.0,
            shoot_range: 420.0,
            projectile_speed: 440.0,
            projectile_damage: 18.0,
            projectile_ttl: 2.0,
            heal_cooldown: 5.0,
            heal_radius: 90.0,
            heal_amount: 28.0,
            heal_ceiling: 220.0,
        }
    }
}

/// Squad coordination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SquadConfig {
    /// Radius of the alert broadcast around the spotter
    pub broadcast_radius: f32,
}

impl Default for SquadConfig {
    fn default() -> Self {
        Self {
            broadcast_radius: 280.0,
        }
    }
}

/// Player avatar tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Collision radius
    pub radius: f32,
    /// Maximum health
    pub max_health: f32,
    /// Acceleration along the movement intent
    pub acceleration: f32,
    /// Speed cap
    pub max_speed: f32,
    /// Per-frame velocity retention when idle, referenced to 60 Hz
    pub drag: f32,
    /// Dash impulse speed
    pub dash_force: f32,
    /// Seconds between dashes
    pub dash_cooldown: f32,
    /// Stun burst radius
    pub stun_radius: f32,
    /// Stun burst damage
    pub stun_damage: f32,
    /// Seconds a stunned agent stays inert
    pub stun_duration: f32,
    /// Seconds between stun bursts
    pub stun_cooldown: f32,
    /// Seconds between shots
    pub shoot_cooldown: f32,
    /// Player projectile speed
    pub projectile_speed: f32,
    /// Player projectile damage
    pub projectile_damage: f32,
    /// Player projectile lifetime
    pub projectile_ttl: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 16.0,
            max_health: 120.0,
            acceleration: 220.0,
            max_speed: 280.0,
            drag: 0.88,
            dash_force: 750.0,
            dash_cooldown: 1.0,
            stun_radius: 160.0,
            stun_damage: 20.0,
            stun_duration: 0.6,
            stun_cooldown: 4.0,
            shoot_cooldown: 0.25,
            projectile_speed: 520.0,
            projectile_damage: 28.0,
            projectile_ttl: 2.0,
        }
    }
}

/// Spawn placement for agents and pickups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Agents spawned by `World::new`
    pub agent_count: u32,
    /// Heart pickups spawned by `World::new`
    pub pickup_count: u32,
    /// Pickup radius used for placement
    pub pickup_radius: f32,
    /// Player distance at which a pickup is collected
    pub pickup_reach: f32,
    /// Health restored by a pickup
    pub pickup_heal: f32,
    /// Random draws before falling back to the map center
    pub attempts: u32,
    /// Clearance from obstacles for spawned entities
    pub margin: f32,
    /// Spawn draws keep this far from the map edge beyond the radius
    pub edge_padding: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            agent_count: 4,
            pickup_count: 5,
            pickup_radius: 10.0,
            pickup_reach: 26.0,
            pickup_heal: 40.0,
            attempts: 600,
            margin: 6.0,
            edge_padding: 10.0,
        }
    }
}

/// Base stats of one role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoleStats {
    /// Starting health
    pub health: f32,
    /// Speed cap
    pub max_speed: f32,
    /// Collision radius
    pub radius: f32,
}

impl RoleStats {
    /// Creates role stats.
    #[must_use]
    pub const fn new(health: f32, max_speed: f32, radius: f32) -> Self {
        Self {
            health,
            max_speed,
            radius,
        }
    }
}

/// Stat overrides for each role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleTable {
    /// Heavy melee role
    pub brute: RoleStats,
    /// Ranged role
    pub shooter: RoleStats,
    /// Healer role
    pub support: RoleStats,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            brute: RoleStats::new(220.0, 110.0, 18.0),
            shooter: RoleStats::new(100.0, 150.0, 18.0),
            support: RoleStats::new(110.0, 140.0, 18.0),
        }
    }
}

impl RoleTable {
    /// Returns the stats for a role.
    #[must_use]
    pub const fn get(&self, role: Role) -> RoleStats {
        match role {
            Role::Brute => self.brute,
            Role::Shooter => self.shooter,
            Role::Support => self.support,
        }
    }
}

impl SimConfig {
    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Map
        self.map.tile_size = self.map.tile_size.clamp(4.0, 256.0);
        self.map.width = self.map.width.max(self.map.tile_size);
        self.map.height = self.map.height.max(self.map.tile_size);

        // Perception
        self.perception.detection_range = self.perception.detection_range.max(0.0);
        self.perception.fov_degrees = self.perception.fov_degrees.clamp(0.0, 360.0);
        self.perception.los_samples = self.perception.los_samples.clamp(1, 256);
        self.perception.los_step = self.perception.los_step.max(1.0);

        // Movement
        self.movement.velocity_smoothing = self.movement.velocity_smoothing.max(0.0);
        self.movement.slide_friction = self.movement.slide_friction.clamp(0.0, 1.0);
        self.movement.collision_margin = self.movement.collision_margin.max(0.0);

        // Behavior
        let b = &mut self.behavior;
        b.patrol_attempts = b.patrol_attempts.max(1);
        b.lost_sight_grace = b.lost_sight_grace.max(0.0);
        b.replan_interval = b.replan_interval.max(0.05);
        b.search_timeout_base = b.search_timeout_base.max(0.0);
        b.search_timeout_jitter = b.search_timeout_jitter.clamp(0.0, b.search_timeout_base);
        b.retreat_min_duration = b.retreat_min_duration.max(0.0);
        if b.sweep_radius_max < b.sweep_radius_min {
            b.sweep_radius_max = b.sweep_radius_min;
        }

        // Combat
        let c = &mut self.combat;
        c.charge_cooldown = c.charge_cooldown.max(0.0);
        c.shoot_cooldown = c.shoot_cooldown.max(0.0);
        c.heal_cooldown = c.heal_cooldown.max(0.0);
        c.projectile_ttl = c.projectile_ttl.max(0.0);

        // Player
        let p = &mut self.player;
        p.max_health = p.max_health.max(1.0);
        p.drag = p.drag.clamp(0.0, 1.0);
        p.radius = p.radius.max(1.0);

        // Spawning
        self.spawn.attempts = self.spawn.attempts.max(1);
    }

    /// Strict check used before building a world from untrusted input.
    pub fn check(&self) -> Result<(), ConfigError> {
        let positive = [
            ("map.tile_size", self.map.tile_size),
            ("map.width", self.map.width),
            ("map.height", self.map.height),
            ("behavior.replan_interval", self.behavior.replan_interval),
            ("player.max_health", self.player.max_health),
            ("player.radius", self.player.radius),
            ("roles.brute.health", self.roles.brute.health),
            ("roles.shooter.health", self.roles.shooter.health),
            ("roles.support.health", self.roles.support.health),
        ];
        for (field, value) in positive {
            if value <= 0.0 || value.is_nan() {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if self.map.width < self.map.tile_size || self.map.height < self.map.tile_size {
            return Err(ConfigError::MapTooSmall {
                width: self.map.width,
                height: self.map.height,
                tile: self.map.tile_size,
            });
        }

        for (index, rect) in self.map.obstacles.iter().enumerate() {
            if rect.x >= self.map.width
                || rect.y >= self.map.height
                || rect.right() <= 0.0
                || rect.bottom() <= 0.0
            {
                return Err(ConfigError::ObstacleOutsideMap { index });
            }
        }

        if self.behavior.sweep_radius_min > self.behavior.sweep_radius_max {
            return Err(ConfigError::InvalidRange {
                field: "behavior.sweep_radius",
                min: self.behavior.sweep_radius_min,
                max: self.behavior.sweep_radius_max,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.map.width, 1280.0);
        assert_eq!(config.map.obstacles.len(), 4);
        assert_eq!(config.perception.los_samples, 12);
        assert_eq!(config.spawn.agent_count, 4);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_role_table_lookup() {
        let roles = RoleTable::default();
        assert_eq!(roles.get(Role::Brute).health, 220.0);
        assert_eq!(roles.get(Role::Shooter).max_speed, 150.0);
        assert_eq!(roles.get(Role::Support).health, 110.0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig::default();
        config.map.tile_size = 0.0;
        config.perception.los_samples = 0;
        config.movement.slide_friction = 3.0;
        config.behavior.sweep_radius_max = 10.0;

        config.validate();

        assert_eq!(config.map.tile_size, 4.0);
        assert_eq!(config.perception.los_samples, 1);
        assert_eq!(config.movement.slide_friction, 1.0);
        assert_eq!(config.behavior.sweep_radius_max, config.behavior.sweep_radius_min);
        assert!(config.check().is_ok());
    }

    #[test]
    fn test_check_rejects_bad_values() {
        let mut config = SimConfig::default();
        config.roles.shooter.health = 0.0;
        assert!(matches!(
            config.check(),
            Err(ConfigError::NonPositive {
                field: "roles.shooter.health",
                ..
            })
        ));

        let mut config = SimConfig::default();
        config.map.obstacles.push(Rect::new(5000.0, 0.0, 10.0, 10.0));
        assert_eq!(
            config.check(),
            Err(ConfigError::ObstacleOutsideMap { index: 4 })
        );
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let json = r#"{ "perception": { "detection_range": 200.0 }, "spawn": { "agent_count": 2 } }"#;
        let config: SimConfig = serde_json::from_str(json).expect("parse");
        assert_eq!(config.perception.detection_range, 200.0);
        assert_eq!(config.perception.fov_degrees, 90.0);
        assert_eq!(config.spawn.agent_count, 2);
        assert_eq!(config.combat.charge_speed, 420.0);
    }
}
