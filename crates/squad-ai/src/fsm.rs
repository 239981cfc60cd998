//! Per-agent finite state machine.
//!
//! States are plain tags; everything a state needs lives on the agent. The
//! controller here owns the transition protocol:
//! - `change_state` runs the old state's exit hook, then the new state's
//!   enter hook, before the new state ever updates
//! - `step` runs the current state's logic for one tick and applies any
//!   transition it asks for
//! - Dead is terminal; transitions out of it are ignored

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use squad_common::Vec2;
use tracing::{debug, trace};

use crate::agent::{Agent, SearchPhase};
use crate::arena::Arena;
use crate::behavior::{self, TickContext};
use crate::config::SimConfig;
use crate::events::{EventBus, SimEvent};
use crate::pathfinding::find_path;
use crate::squad::SquadOrder;

/// Behavior state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentState {
    /// Wandering between random points
    Patrol,
    /// Chasing and attacking the target
    Engage,
    /// Looking for a lost target
    Search,
    /// Fleeing from the target
    Retreat,
    /// Terminal
    Dead,
}

impl AgentState {
    /// Display name used by snapshots and the HUD.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Patrol => "Patrol",
            Self::Engage => "Engage",
            Self::Search => "Search",
            Self::Retreat => "Retreat",
            Self::Dead => "Dead",
        }
    }

    /// True for the state no agent ever leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Dead)
    }
}

/// World services available to enter/exit hooks.
pub struct HookContext<'w> {
    /// Simulation tunables
    pub config: &'w SimConfig,
    /// Level geometry
    pub arena: &'w Arena,
    /// Shared random source
    pub rng: &'w mut Rng,
    /// Event sink
    pub events: &'w EventBus,
}

/// Runs the enter hook of `state` and makes it current.
pub fn enter(agent: &mut Agent, state: AgentState, hooks: &mut HookContext<'_>) {
    agent.state = state;
    match state {
        AgentState::Patrol => {
            agent.path = None;
            if agent.patrol_target.is_none() {
                agent.patrol_target = Some(pick_patrol_point(agent.position(), hooks.arena, hooks.config, hooks.rng));
            }
        },
        AgentState::Engage => {
            agent.search_timer = 0.0;
        },
        AgentState::Search => {
            let behavior = &hooks.config.behavior;
            let jitter = (hooks.rng.f32() * 2.0 - 1.0) * behavior.search_timeout_jitter;
            agent.search_timer = 0.0;
            agent.search_timeout = (behavior.search_timeout_base + jitter).max(0.0);
            agent.search_phase = SearchPhase::Approach;
            agent.path = None;
            agent.replan_timer = 0.0;
        },
        AgentState::Retreat => {
            agent.retreat_timer = 0.0;
            agent.path = None;
        },
        AgentState::Dead => {
            agent.body.velocity = Vec2::ZERO;
            agent.path = None;
            agent.stun_timer = 0.0;
        },
    }
    hooks.events.publish(SimEvent::StateEntered { agent: agent.id, state });
}

/// Runs the exit hook of `state`.
pub fn exit(agent: &mut Agent, state: AgentState, hooks: &mut HookContext<'_>) {
    if state == AgentState::Search {
        agent.search_phase = SearchPhase::Approach;
    }
    hooks.events.publish(SimEvent::StateExited { agent: agent.id, state });
}

/// Moves an agent into `to`: exit hook of the current state, then enter hook of `to`.
///
/// Re-entering the current state runs both hooks again. Returns false when
/// the agent is Dead, which no transition can leave.
pub fn change_state(agent: &mut Agent, to: AgentState, hooks: &mut HookContext<'_>) -> bool {
    let from = agent.state;
    if from.is_terminal() {
        return false;
    }
    debug!(agent = %agent.id, from = from.name(), to = to.name(), "state transition");
    exit(agent, from, hooks);
    enter(agent, to, hooks);
    true
}

/// Runs the current state's logic for one tick and applies its transition.
///
/// Sensing has already happened; `agent.memory.visible` holds this tick's result.
pub fn step(agent: &mut Agent, dt: f32, ctx: &mut TickContext<'_>) {
    let next = match agent.state {
        AgentState::Patrol => {
            behavior::patrol(agent, dt, ctx);
            agent.memory.visible.then(|| {
                ctx.orders.push(SquadOrder::AlertEngage { spotter: agent.id });
                AgentState::Engage
            })
        },
        AgentState::Engage => {
            behavior::engage(agent, dt, ctx);
            let lost = agent.memory.last_seen.is_some()
                && agent.memory.time_since_seen > ctx.config.behavior.lost_sight_grace;
            if lost {
                Some(AgentState::Search)
            } else if agent.health < ctx.config.behavior.low_health_threshold {
                Some(AgentState::Retreat)
            } else {
                None
            }
        },
        AgentState::Search => {
            agent.search_timer += dt;
            if agent.memory.visible {
                ctx.orders.push(SquadOrder::AlertEngage { spotter: agent.id });
                Some(AgentState::Engage)
            } else {
                behavior::search(agent, dt, ctx);
                (agent.search_timer >= agent.search_timeout).then_some(AgentState::Patrol)
            }
        },
        AgentState::Retreat => {
            agent.retreat_timer += dt;
            behavior::retreat(agent, dt, ctx);
            let behavior = &ctx.config.behavior;
            let recovered = agent.health > behavior.recover_health_threshold
                && agent.retreat_timer >= behavior.retreat_min_duration;
            recovered.then_some(AgentState::Patrol)
        },
        AgentState::Dead => None,
    };

    if let Some(to) = next {
        change_state(agent, to, &mut ctx.hooks());
    }
}

/// Draws before giving up on a reachable patrol point.
const REACHABLE_DRAWS: u32 = 8;

/// Picks a patrol point in open space away from the map edge that A* can
/// reach from `from`.
///
/// An open cell can still sit in a walled-off pocket, so each draw is
/// checked with a path search. When no draw is reachable the agent holds
/// its position.
pub fn pick_patrol_point(from: Vec2, arena: &Arena, config: &SimConfig, rng: &mut Rng) -> Vec2 {
    let behavior = &config.behavior;
    let start = arena.cell_of(from);
    for _ in 0..REACHABLE_DRAWS {
        let point = arena.random_open_point(behavior.patrol_margin, behavior.patrol_attempts, rng);
        if find_path(arena, start, arena.cell_of(point)).is_some() {
            return point;
        }
    }
    trace!(x = from.x, y = from.y, "no reachable patrol point");
    from
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;
    use crate::arena::Rect;
    use crate::config::RoleStats;
    use squad_common::AgentId;

    struct Fixture {
        config: SimConfig,
        arena: Arena,
        rng: Rng,
        events: EventBus,
    }

    impl Fixture {
        fn new() -> Self {
            let config = SimConfig::default();
            let arena = Arena::new(&config.map);
            Self {
                config,
                arena,
                rng: Rng::with_seed(11),
                events: EventBus::default(),
            }
        }

        fn hooks(&mut self) -> HookContext<'_> {
            HookContext {
                config: &self.config,
                arena: &self.arena,
                rng: &mut self.rng,
                events: &self.events,
            }
        }
    }

    fn agent() -> Agent {
        Agent::new(
            AgentId::from_index(0),
            Role::Brute,
            Vec2::new(600.0, 100.0),
            RoleStats::new(220.0, 110.0, 18.0),
        )
    }

    #[test]
    fn test_patrol_enter_picks_open_point() {
        let mut fx = Fixture::new();
        let mut a = agent();
        enter(&mut a, AgentState::Patrol, &mut fx.hooks());
        let target = a.patrol_target.expect("patrol target");
        assert!(!fx.arena.is_blocked(fx.arena.cell_of(target)));
    }

    #[test]
    fn test_patrol_point_skips_sealed_pocket() {
        // The right half is sealed off by a full-height wall.
        let arena = Arena::from_obstacles(640.0, 320.0, 32.0, vec![Rect::new(320.0, 0.0, 64.0, 320.0)]);
        let config = SimConfig::default();
        let mut rng = Rng::with_seed(5);
        let from = Vec2::new(100.0, 160.0);
        for _ in 0..50 {
            let point = pick_patrol_point(from, &arena, &config, &mut rng);
            assert!(point.x < 320.0, "unreachable point {point:?}");
        }
    }

    #[test]
    fn test_patrol_point_falls_back_to_current_position() {
        // The only open cell sits inside the patrol margin, so no draw can land on it.
        let arena = Arena::from_obstacles(
            320.0,
            320.0,
            32.0,
            vec![
                Rect::new(0.0, 0.0, 320.0, 128.0),
                Rect::new(0.0, 160.0, 320.0, 160.0),
                Rect::new(32.0, 128.0, 288.0, 32.0),
            ],
        );
        let config = SimConfig::default();
        let mut rng = Rng::with_seed(3);
        let from = Vec2::new(16.0, 144.0);
        let point = pick_patrol_point(from, &arena, &config, &mut rng);
        assert_eq!(point, from);
    }

    #[test]
    fn test_exit_runs_before_enter() {
        let mut fx = Fixture::new();
        let mut a = agent();
        assert!(change_state(&mut a, AgentState::Engage, &mut fx.hooks()));
        assert_eq!(a.state, AgentState::Engage);

        let events = fx.events.drain();
        assert_eq!(
            events,
            vec![
                SimEvent::StateExited {
                    agent: a.id,
                    state: AgentState::Patrol
                },
                SimEvent::StateEntered {
                    agent: a.id,
                    state: AgentState::Engage
                },
            ]
        );
    }

    #[test]
    fn test_search_timeout_within_jitter() {
        let mut fx = Fixture::new();
        let base = fx.config.behavior.search_timeout_base;
        let jitter = fx.config.behavior.search_timeout_jitter;
        let mut a = agent();
        for _ in 0..20 {
            change_state(&mut a, AgentState::Search, &mut fx.hooks());
            assert!(a.search_timeout >= base - jitter && a.search_timeout <= base + jitter);
            assert_eq!(a.search_timer, 0.0);
            assert_eq!(a.search_phase, SearchPhase::Approach);
        }
    }

    #[test]
    fn test_dead_is_terminal() {
        let mut fx = Fixture::new();
        let mut a = agent();
        a.body.velocity = Vec2::new(5.0, 0.0);
        change_state(&mut a, AgentState::Dead, &mut fx.hooks());
        assert_eq!(a.body.velocity, Vec2::ZERO);
        assert!(!change_state(&mut a, AgentState::Patrol, &mut fx.hooks()));
        assert_eq!(a.state, AgentState::Dead);
    }

    #[test]
    fn test_retreat_enter_resets_timer() {
        let mut fx = Fixture::new();
        let mut a = agent();
        a.retreat_timer = 4.0;
        change_state(&mut a, AgentState::Retreat, &mut fx.hooks());
        assert_eq!(a.retreat_timer, 0.0);
        assert!(a.path.is_none());
    }

    #[test]
    fn test_state_names() {
        assert_eq!(AgentState::Search.name(), "Search");
        assert!(AgentState::Dead.is_terminal());
        assert!(!AgentState::Retreat.is_terminal());
    }
}
