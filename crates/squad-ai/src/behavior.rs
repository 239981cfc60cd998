//! Per-state agent behaviors.
//!
//! [`update_agent`] is the per-tick entry point: cooldowns, stun, sensing,
//! then the FSM step, which calls back into the state functions here.
//! Everything an agent may touch besides itself arrives through a
//! [`TickContext`]; the other agents are visible only read-only through a
//! [`SquadView`], and effects on them are queued as [`SquadOrder`]s.

use std::f32::consts::TAU;

use fastrand::Rng;
use squad_common::{point_on_circle, Vec2};
use tracing::trace;

use crate::agent::{Agent, SearchPhase};
use crate::arena::Arena;
use crate::combat;
use crate::config::{BehaviorConfig, SimConfig};
use crate::events::{EventBus, SimEvent};
use crate::fsm::{self, HookContext};
use crate::movement;
use crate::pathfinding::{find_path, ActivePath};
use crate::perception;
use crate::player::Player;
use crate::projectile::Projectile;
use crate::squad::SquadOrder;
use crate::steering::{self, FlockForces, Neighbor};

/// Read-only view of every agent except the one being updated.
#[derive(Debug, Clone, Copy)]
pub struct SquadView<'w> {
    before: &'w [Agent],
    after: &'w [Agent],
}

impl<'w> SquadView<'w> {
    /// Wraps the agents stored before and after the updating one.
    #[must_use]
    pub const fn new(before: &'w [Agent], after: &'w [Agent]) -> Self {
        Self { before, after }
    }

    /// Every other agent, dead ones included.
    pub fn iter(&self) -> impl Iterator<Item = &'w Agent> + 'w {
        let (before, after) = (self.before, self.after);
        before.iter().chain(after)
    }

    /// Every other live agent.
    pub fn living(&self) -> impl Iterator<Item = &'w Agent> + 'w {
        self.iter().filter(|a| a.alive)
    }

    /// Live agents within `radius` of `position`, as steering neighbors.
    #[must_use]
    pub fn neighbors(&self, position: Vec2, radius: f32) -> Vec<Neighbor> {
        self.living()
            .filter(|a| a.position().distance(position) <= radius)
            .map(|a| Neighbor::new(a.body.position, a.body.velocity))
            .collect()
    }

    /// Number of other agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    /// True when the agent is alone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// World state borrowed for one agent's update.
pub struct TickContext<'w> {
    /// Simulation tunables
    pub config: &'w SimConfig,
    /// Level geometry
    pub arena: &'w Arena,
    /// The target
    pub player: &'w mut Player,
    /// The rest of the squad
    pub squad: SquadView<'w>,
    /// Projectiles in flight
    pub projectiles: &'w mut Vec<Projectile>,
    /// Shared random source
    pub rng: &'w mut Rng,
    /// Event sink
    pub events: &'w EventBus,
    /// Orders for the world to apply after this update
    pub orders: &'w mut Vec<SquadOrder>,
}

impl TickContext<'_> {
    /// Narrows the context to what transition hooks need.
    pub fn hooks(&mut self) -> HookContext<'_> {
        HookContext {
            config: self.config,
            arena: self.arena,
            rng: &mut *self.rng,
            events: self.events,
        }
    }
}

/// Advances one agent by one tick.
pub fn update_agent(agent: &mut Agent, dt: f32, ctx: &mut TickContext<'_>) {
    if !agent.alive || agent.state.is_terminal() {
        return;
    }
    agent.cooldowns.tick(dt);

    if agent.is_stunned() {
        agent.stun_timer = (agent.stun_timer - dt).max(0.0);
        return;
    }

    let target = ctx.player.alive.then(|| ctx.player.position());
    perception::perceive(agent, target, dt, &ctx.config.perception, ctx.arena);
    fsm::step(agent, dt, ctx);
}

/// Patrol: walk to the patrol point, picking a new one on arrival.
pub fn patrol(agent: &mut Agent, dt: f32, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let behavior = &config.behavior;
    let position = agent.position();

    let goal = match agent.patrol_target {
        Some(goal) if position.distance(goal) >= behavior.patrol_arrival => goal,
        _ => {
            let goal = fsm::pick_patrol_point(position, ctx.arena, config, ctx.rng);
            agent.patrol_target = Some(goal);
            agent.path = None;
            goal
        },
    };

    let seek_point = route(agent, goal, dt, config, ctx.arena).unwrap_or(goal);
    let desired = steering::seek(position, seek_point, agent.body.max_speed * behavior.patrol_speed_factor);
    movement::steer(&mut agent.body, desired, dt, &config.movement, ctx.arena, ctx.rng);
}

/// Engage: melee, pursue with flocking, charge, then the role's extra effect.
pub fn engage(agent: &mut Agent, dt: f32, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let position = agent.position();

    if agent.role.is_melee() {
        combat::melee(position, &mut *ctx.player, &config.combat, dt);
    }

    let Some(target) = agent.memory.last_seen else {
        movement::steer(&mut agent.body, Vec2::ZERO, dt, &config.movement, ctx.arena, ctx.rng);
        return;
    };
    let sighted = agent.memory.visible && ctx.player.alive;

    let waypoint = route(agent, target, dt, config, ctx.arena);
    let chase = steering::seek(position, waypoint.unwrap_or(target), agent.body.max_speed);
    let neighbors = ctx.squad.neighbors(position, config.steering.neighbor_radius);
    let forces = FlockForces::compute(position, &neighbors, &config.steering);
    let desired = steering::blend(chase, &forces, &config.steering, waypoint.is_none());

    let charge = if sighted {
        combat::try_charge(agent, target, &config.combat)
    } else {
        None
    };
    if let Some(velocity) = charge {
        ctx.events.publish(SimEvent::AgentCharged { agent: agent.id });
        movement::impulse(&mut agent.body, velocity, dt, &config.movement, ctx.arena, ctx.rng);
    } else {
        movement::steer(&mut agent.body, desired, dt, &config.movement, ctx.arena, ctx.rng);
    }

    role_effect(agent, target, sighted, ctx);
}

fn role_effect(agent: &mut Agent, target: Vec2, sighted: bool, ctx: &mut TickContext<'_>) {
    let tuning = &ctx.config.combat;
    if agent.role.is_ranged() && sighted {
        combat::try_fire(agent, target, tuning, ctx.projectiles, ctx.events);
    }
    if agent.role.is_support() {
        if let Some(order) = combat::try_heal(agent, &ctx.squad, tuning) {
            ctx.orders.push(order);
        }
    }
}

/// Search: approach the last-seen position, then sweep around it.
///
/// Without a last-seen position this falls back to patrol movement.
pub fn search(agent: &mut Agent, dt: f32, ctx: &mut TickContext<'_>) {
    let Some(last_seen) = agent.memory.last_seen else {
        patrol(agent, dt, ctx);
        return;
    };
    let config = ctx.config;
    let behavior = &config.behavior;
    let position = agent.position();

    let (goal, speed_factor) = match agent.search_phase {
        SearchPhase::Approach if position.distance(last_seen) > behavior.search_arrival => {
            (last_seen, behavior.search_speed_factor)
        },
        SearchPhase::Sweep { target } if position.distance(target) >= behavior.patrol_arrival => {
            (target, behavior.sweep_speed_factor)
        },
        _ => {
            let target = sweep_point(last_seen, behavior, ctx.arena, ctx.rng);
            agent.search_phase = SearchPhase::Sweep { target };
            agent.path = None;
            (target, behavior.sweep_speed_factor)
        },
    };

    let seek_point = route(agent, goal, dt, config, ctx.arena).unwrap_or(goal);
    let desired = steering::seek(position, seek_point, agent.body.max_speed * speed_factor);
    movement::steer(&mut agent.body, desired, dt, &config.movement, ctx.arena, ctx.rng);
}

/// Retreat: flee straight away from the threat.
pub fn retreat(agent: &mut Agent, dt: f32, ctx: &mut TickContext<'_>) {
    let config = ctx.config;
    let position = agent.position();
    let threat = if ctx.player.alive {
        Some(ctx.player.position())
    } else {
        agent.memory.last_seen
    };

    let desired = threat.map_or(Vec2::ZERO, |threat| {
        steering::flee(position, threat, agent.body.max_speed * config.behavior.retreat_speed_factor)
    });
    movement::steer(&mut agent.body, desired, dt, &config.movement, ctx.arena, ctx.rng);
}

/// Picks the point to steer at on the way to `goal`.
///
/// Plans an A* path whenever the agent holds none or the replan timer runs
/// out, then returns the current waypoint. `None` means steer straight at
/// the goal: the path is used up, or the goal is unreachable.
fn route(agent: &mut Agent, goal: Vec2, dt: f32, config: &SimConfig, arena: &Arena) -> Option<Vec2> {
    agent.replan_timer -= dt;
    if agent.path.is_none() || agent.replan_timer <= 0.0 {
        agent.replan_timer = config.behavior.replan_interval;
        agent.path = plan(arena, agent.position(), goal);
    }
    next_waypoint(agent, config.behavior.waypoint_arrival, arena)
}

fn plan(arena: &Arena, from: Vec2, to: Vec2) -> Option<ActivePath> {
    let start = arena.cell_of(from);
    let goal = arena.cell_of(to);
    let Some(cells) = find_path(arena, start, goal) else {
        trace!(?start, ?goal, "no path");
        return None;
    };
    let mut path = ActivePath::new(cells);
    // The first cell is the one the agent already stands in.
    path.advance();
    Some(path)
}

/// Skips waypoints already reached and returns the next one's center.
fn next_waypoint(agent: &mut Agent, arrival: f32, arena: &Arena) -> Option<Vec2> {
    let path = agent.path.as_mut()?;
    while let Some(cell) = path.current() {
        let point = arena.cell_center(cell);
        if agent.body.position.distance(point) > arrival {
            return Some(point);
        }
        path.advance();
    }
    None
}

/// Random open point on the sweep annulus around `center`.
fn sweep_point(center: Vec2, behavior: &BehaviorConfig, arena: &Arena, rng: &mut Rng) -> Vec2 {
    let span = behavior.sweep_radius_max - behavior.sweep_radius_min;
    for _ in 0..behavior.patrol_attempts.max(1) {
        let radius = behavior.sweep_radius_min + rng.f32() * span;
        let point = point_on_circle(center, rng.f32() * TAU, radius);
        if arena.point_in_bounds(point) && !arena.is_blocked(arena.cell_of(point)) {
            return point;
        }
    }
    center
}
