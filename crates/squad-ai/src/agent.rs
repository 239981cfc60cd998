//! Agent data: role, body, memory, timers.

use serde::{Deserialize, Serialize};
use squad_common::{AgentId, Vec2};

use crate::config::RoleStats;
use crate::fsm::AgentState;
use crate::pathfinding::ActivePath;

/// Agent role.
///
/// Roles share one Engage behavior; each adds its own effect on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Heavy melee bruiser
    Brute,
    /// Ranged attacker
    Shooter,
    /// Heals nearby allies
    Support,
}

impl Role {
    /// All roles, in spawn-table order.
    pub const ALL: [Self; 3] = [Self::Brute, Self::Shooter, Self::Support];

    /// Every role deals contact damage.
    #[must_use]
    pub const fn is_melee(self) -> bool {
        matches!(self, Self::Brute | Self::Shooter | Self::Support)
    }

    /// Fires projectiles while engaged.
    #[must_use]
    pub const fn is_ranged(self) -> bool {
        matches!(self, Self::Shooter)
    }

    /// Heals allies while engaged.
    #[must_use]
    pub const fn is_support(self) -> bool {
        matches!(self, Self::Support)
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Brute => "Brute",
            Self::Shooter => "Shooter",
            Self::Support => "Support",
        }
    }
}

/// Countdown timer gating an ability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldown {
    remaining: f32,
}

impl Cooldown {
    /// Seconds left before the ability is ready.
    #[must_use]
    pub const fn remaining(self) -> f32 {
        self.remaining
    }

    /// Ready when the countdown has reached zero.
    #[must_use]
    pub fn is_ready(self) -> bool {
        self.remaining <= 0.0
    }

    /// Restarts the countdown.
    pub fn trigger(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
    }

    /// Counts down by `dt`, never below zero.
    pub fn tick(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt).max(0.0);
    }
}

/// Ability cooldowns of an agent. Unused ones for a role simply stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    /// Charge dash
    pub charge: Cooldown,
    /// Ranged shot
    pub shoot: Cooldown,
    /// Ally heal
    pub heal: Cooldown,
}

impl Cooldowns {
    /// Counts every cooldown down by `dt`.
    pub fn tick(&mut self, dt: f32) {
        self.charge.tick(dt);
        self.shoot.tick(dt);
        self.heal.tick(dt);
    }
}

/// What an agent remembers about its target.
///
/// Owned by the agent, so it survives state transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerceptionMemory {
    /// Last position the target was seen at
    pub last_seen: Option<Vec2>,
    /// Seconds since the target was last seen
    pub time_since_seen: f32,
    /// Result of this tick's sensing
    pub visible: bool,
}

impl PerceptionMemory {
    /// Records a sighting.
    pub fn refresh(&mut self, target: Vec2) {
        self.last_seen = Some(target);
        self.time_since_seen = 0.0;
        self.visible = true;
    }

    /// Records a tick without sight.
    pub fn lose(&mut self, dt: f32) {
        self.time_since_seen += dt;
        self.visible = false;
    }
}

/// Progress through a Search run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum SearchPhase {
    /// Heading for the last-seen position
    #[default]
    Approach,
    /// Circling the last-seen position
    Sweep {
        /// Current sweep point
        target: Vec2,
    },
}

/// Position, velocity and collision shape of a moving body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Center position
    pub position: Vec2,
    /// Velocity in units per second
    pub velocity: Vec2,
    /// Unit facing vector
    pub facing: Vec2,
    /// Collision radius
    pub radius: f32,
    /// Speed cap
    pub max_speed: f32,
}

impl Body {
    /// Creates a body at rest facing +X.
    #[must_use]
    pub const fn new(position: Vec2, radius: f32, max_speed: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            facing: Vec2::X,
            radius,
            max_speed,
        }
    }
}

/// A hostile squad member.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Handle in the world's agent collection
    pub id: AgentId,
    /// Role
    pub role: Role,
    /// Kinematics
    pub body: Body,
    /// Current health
    pub health: f32,
    /// False once health is exhausted; never set back
    pub alive: bool,
    /// Current FSM state
    pub state: AgentState,
    /// Ability cooldowns
    pub cooldowns: Cooldowns,
    /// Target memory
    pub memory: PerceptionMemory,
    /// Path being followed, if any
    pub path: Option<ActivePath>,
    /// Seconds until the next replan
    pub replan_timer: f32,
    /// Seconds of stun left
    pub stun_timer: f32,
    /// Current patrol point
    pub patrol_target: Option<Vec2>,
    /// Seconds spent in the current Search
    pub search_timer: f32,
    /// Timeout rolled for the current Search
    pub search_timeout: f32,
    /// Search progress
    pub search_phase: SearchPhase,
    /// Seconds spent in the current Retreat
    pub retreat_timer: f32,
}

impl Agent {
    /// Creates an agent with its role's stats, in Patrol.
    ///
    /// The Patrol enter hook has not run yet; the world runs it on spawn.
    #[must_use]
    pub fn new(id: AgentId, role: Role, position: Vec2, stats: RoleStats) -> Self {
        Self {
            id,
            role,
            body: Body::new(position, stats.radius, stats.max_speed),
            health: stats.health,
            alive: true,
            state: AgentState::Patrol,
            cooldowns: Cooldowns::default(),
            memory: PerceptionMemory::default(),
            path: None,
            replan_timer: 0.0,
            stun_timer: 0.0,
            patrol_target: None,
            search_timer: 0.0,
            search_timeout: 0.0,
            search_phase: SearchPhase::Approach,
            retreat_timer: 0.0,
        }
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.body.position
    }

    /// True while stunned.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun_timer > 0.0
    }

    /// Reduces health, clamping at zero. Returns true if this blow was fatal.
    ///
    /// `alive` flips here, the moment health runs out. The FSM's Dead
    /// transition and the squad retreat follow when the world resolves deaths.
    pub fn apply_damage(&mut self, amount: f32) -> bool {
        if !self.alive || amount <= 0.0 {
            return false;
        }
        self.health = (self.health - amount).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            return true;
        }
        false
    }

    /// Adds health up to `ceiling`. Dead agents are never healed.
    pub fn heal(&mut self, amount: f32, ceiling: f32) -> f32 {
        if !self.alive {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount).min(ceiling.max(before));
        self.health - before
    }

    /// True when the agent died but has not entered Dead yet.
    #[must_use]
    pub fn death_pending(&self) -> bool {
        !self.alive && self.state != AgentState::Dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn brute() -> Agent {
        Agent::new(
            AgentId::from_index(0),
            Role::Brute,
            Vec2::new(100.0, 100.0),
            RoleStats::new(220.0, 110.0, 18.0),
        )
    }

    #[test]
    fn test_role_capabilities() {
        assert!(Role::ALL.iter().all(|r| r.is_melee()));
        assert!(!Role::Brute.is_ranged());
        assert!(Role::Shooter.is_ranged());
        assert!(Role::Support.is_support());
        assert_eq!(Role::ALL.len(), 3);
    }

    #[test]
    fn test_cooldown_never_negative() {
        let mut cd = Cooldown::default();
        cd.trigger(0.5);
        assert!(!cd.is_ready());
        cd.tick(0.3);
        cd.tick(0.3);
        assert_eq!(cd.remaining(), 0.0);
        assert!(cd.is_ready());
    }

    #[test]
    fn test_damage_clamps_and_kills_once() {
        let mut agent = brute();
        assert!(!agent.apply_damage(100.0));
        assert!(agent.apply_damage(150.0));
        assert_eq!(agent.health, 0.0);
        assert!(!agent.alive);
        assert!(agent.death_pending());
        // Further damage is ignored.
        assert!(!agent.apply_damage(10.0));
        assert_eq!(agent.health, 0.0);
    }

    #[test]
    fn test_heal_caps_at_ceiling() {
        let mut agent = brute();
        agent.health = 200.0;
        assert_eq!(agent.heal(28.0, 220.0), 20.0);
        assert_eq!(agent.health, 220.0);
        agent.alive = false;
        assert_eq!(agent.heal(28.0, 220.0), 0.0);
    }

    #[test]
    fn test_memory_refresh_and_lose() {
        let mut memory = PerceptionMemory::default();
        memory.lose(0.5);
        assert_eq!(memory.time_since_seen, 0.5);
        memory.refresh(Vec2::new(3.0, 4.0));
        assert_eq!(memory.last_seen, Some(Vec2::new(3.0, 4.0)));
        assert_eq!(memory.time_since_seen, 0.0);
        assert!(memory.visible);
    }

    proptest! {
        #[test]
        fn prop_death_is_monotonic(hits in proptest::collection::vec(0.0f32..80.0, 1..20)) {
            let mut agent = brute();
            let mut deaths = 0;
            let mut was_dead = false;
            for hit in hits {
                if agent.apply_damage(hit) {
                    deaths += 1;
                }
                prop_assert!(agent.health >= 0.0);
                if was_dead {
                    prop_assert!(!agent.alive);
                }
                was_dead = !agent.alive;
            }
            prop_assert!(deaths <= 1);
            prop_assert_eq!(deaths == 1, !agent.alive);
        }
    }
}
