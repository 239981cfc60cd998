//! Combat and abilities.
//!
//! Every ability is gated by a [`Cooldown`](crate::agent::Cooldown) that
//! ticks toward zero once per update. An ability fires only when its
//! cooldown is ready, and firing restarts it.

use squad_common::{direction, Vec2};
use tracing::debug;

use crate::agent::Agent;
use crate::behavior::SquadView;
use crate::config::{CombatConfig, PlayerConfig};
use crate::events::{EventBus, Owner, SimEvent};
use crate::fsm::{self, AgentState, HookContext};
use crate::projectile::Projectile;
use crate::squad::SquadOrder;

/// Anything that can take damage from melee or projectiles.
pub trait Damageable {
    /// Center position.
    fn position(&self) -> Vec2;

    /// Radius used for hit tests.
    fn hit_radius(&self) -> f32;

    /// Dead targets are never hit.
    fn is_alive(&self) -> bool;

    /// Applies damage, clamping health at zero. Returns true on the fatal blow.
    fn apply_damage(&mut self, amount: f32) -> bool;
}

impl Damageable for Agent {
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
        Agent::apply_damage(self, amount)
    }
}

/// Applies contact damage for one tick if the target is within melee range.
pub fn melee<T: Damageable + ?Sized>(attacker: Vec2, target: &mut T, config: &CombatConfig, dt: f32) -> bool {
    if !target.is_alive() || attacker.distance(target.position()) >= config.melee_range {
        return false;
    }
    target.apply_damage(config.melee_dps * dt);
    true
}

/// Starts a charge if ready and far enough from the target.
///
/// Returns the impulse velocity; the caller moves the agent with it.
pub fn try_charge(agent: &mut Agent, target: Vec2, config: &CombatConfig) -> Option<Vec2> {
    if !agent.cooldowns.charge.is_ready() {
        return None;
    }
    let position = agent.position();
    if position.distance(target) <= config.charge_min_distance {
        return None;
    }
    let heading = direction(position, target);
    if heading == Vec2::ZERO {
        return None;
    }
    agent.cooldowns.charge.trigger(config.charge_cooldown);
    debug!(agent = %agent.id, "charge");
    Some(heading * config.charge_speed)
}

/// Fires a projectile at the target if the agent is ranged, ready and in range.
pub fn try_fire(
    agent: &mut Agent,
    target: Vec2,
    config: &CombatConfig,
    projectiles: &mut Vec<Projectile>,
    events: &EventBus,
) -> bool {
    if !agent.role.is_ranged() || !agent.cooldowns.shoot.is_ready() {
        return false;
    }
    let origin = agent.position();
    if origin.distance(target) >= config.shoot_range {
        return false;
    }
    let heading = direction(origin, target);
    if heading == Vec2::ZERO {
        return false;
    }

    let owner = Owner::Agent(agent.id);
    projectiles.push(Projectile::new(
        origin,
        heading * config.projectile_speed,
        config.projectile_damage,
        owner,
        config.projectile_ttl,
    ));
    agent.cooldowns.shoot.trigger(config.shoot_cooldown);
    events.publish(SimEvent::ProjectileFired {
        owner,
        position: origin,
    });
    true
}

/// Looks for one nearby ally below the heal ceiling.
///
/// Returns a heal order for the world to apply; the cooldown only restarts
/// when an ally was found.
pub fn try_heal(agent: &mut Agent, squad: &SquadView<'_>, config: &CombatConfig) -> Option<SquadOrder> {
    if !agent.role.is_support() || !agent.cooldowns.heal.is_ready() {
        return None;
    }
    let position = agent.position();
    let ally = squad.living().find(|ally| {
        ally.position().distance(position) < config.heal_radius && ally.health < config.heal_ceiling
    })?;
    agent.cooldowns.heal.trigger(config.heal_cooldown);
    Some(SquadOrder::Heal {
        healer: agent.id,
        target: ally.id,
        amount: config.heal_amount,
    })
}

/// Player stun burst: damages, halts and stuns every live agent in range,
/// forcing the survivors into Retreat. Returns the number of agents hit.
pub fn stun_burst(agents: &mut [Agent], center: Vec2, config: &PlayerConfig, hooks: &mut HookContext<'_>) -> usize {
    let mut hit = 0;
    for agent in agents.iter_mut().filter(|a| a.alive) {
        if agent.position().distance(center) >= config.stun_radius {
            continue;
        }
        hit += 1;
        agent.apply_damage(config.stun_damage);
        agent.body.velocity = Vec2::ZERO;
        if agent.alive {
            agent.stun_timer = config.stun_duration;
            fsm::change_state(agent, AgentState::Retreat, hooks);
        }
    }
    hit
}
