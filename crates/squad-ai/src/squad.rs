//! Squad-wide coordination.
//!
//! Alerts pull nearby agents into Engage with the spotter's knowledge of
//! the target; a death sends every survivor into Retreat. Both run on the
//! whole agent collection, so agents raise them as [`SquadOrder`]s during
//! their own update and the world applies them right after.

use serde::{Deserialize, Serialize};
use squad_common::{AgentId, Vec2};
use tracing::info;

use crate::agent::Agent;
use crate::events::{EventBus, SimEvent};
use crate::fsm::{self, AgentState, HookContext};

/// Request raised by an agent that affects other agents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SquadOrder {
    /// Propagate a sighting
    AlertEngage {
        /// Agent that saw the target
        spotter: AgentId,
    },
    /// Heal one ally
    Heal {
        /// Support agent
        healer: AgentId,
        /// Ally to heal
        target: AgentId,
        /// Health to restore
        amount: f32,
    },
}

/// Shares the spotter's last-seen position with every live agent within
/// `radius` and forces those not already engaged into Engage.
///
/// Seeds the spotter's own memory with `target_position` if it has none.
/// Returns the number of agents moved into Engage.
pub fn alert_engage(
    agents: &mut [Agent],
    spotter: AgentId,
    target_position: Vec2,
    radius: f32,
    hooks: &mut HookContext<'_>,
) -> usize {
    let Some(source) = agents.get_mut(spotter.index()) else {
        return 0;
    };
    if !source.alive {
        return 0;
    }
    let last_seen = *source.memory.last_seen.get_or_insert(target_position);
    let origin = source.position();

    let mut recruited = 0;
    for agent in agents.iter_mut() {
        if agent.id == spotter || !agent.alive || agent.position().distance(origin) > radius {
            continue;
        }
        agent.memory.last_seen = Some(last_seen);
        agent.memory.time_since_seen = 0.0;
        if !matches!(agent.state, AgentState::Engage | AgentState::Dead) {
            fsm::change_state(agent, AgentState::Engage, hooks);
            recruited += 1;
        }
    }

    info!(spotter = %spotter, recruited, "squad alerted");
    hooks.events.publish(SimEvent::SquadAlerted {
        spotter,
        target: last_seen,
        recruited,
    });
    recruited
}

/// Forces every live agent into Retreat, regardless of distance.
pub fn broadcast_retreat(agents: &mut [Agent], cause: Option<AgentId>, hooks: &mut HookContext<'_>) -> usize {
    let mut count = 0;
    for agent in agents.iter_mut().filter(|a| a.alive) {
        if fsm::change_state(agent, AgentState::Retreat, hooks) {
            count += 1;
        }
    }
    info!(?cause, count, "squad retreat");
    hooks.events.publish(SimEvent::SquadRetreat { cause });
    count
}

/// Applies a heal order. Returns the health actually restored.
pub fn apply_heal(agents: &mut [Agent], healer: AgentId, target: AgentId, amount: f32, ceiling: f32, events: &EventBus) -> f32 {
    let Some(ally) = agents.get_mut(target.index()) else {
        return 0.0;
    };
    let healed = ally.heal(amount, ceiling);
    if healed > 0.0 {
        events.publish(SimEvent::AgentHealed {
            healer,
            target,
            amount: healed,
        });
    }
    healed
}
