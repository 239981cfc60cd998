//! Event bus for reporting simulation happenings to the shell.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use squad_common::{AgentId, Vec2};
use tracing::trace;

use crate::fsm::AgentState;

/// Queue size used by [`EventBus::default`].
const DEFAULT_CAPACITY: usize = 1024;

/// Who a projectile belongs to, for damage attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    /// Fired by an agent; only the player side can be hit
    Agent(AgentId),
    /// Fired by the player; only agents can be hit
    Player,
    /// Hits either side
    Neutral,
}

/// Player abilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAbility {
    /// Short high-speed burst
    Dash,
    /// Area stun burst
    Stun,
    /// Aimed projectile
    Shoot,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// An agent left a state (exit hook ran)
    StateExited {
        /// Agent
        agent: AgentId,
        /// State left
        state: AgentState,
    },
    /// An agent entered a state (enter hook ran)
    StateEntered {
        /// Agent
        agent: AgentId,
        /// State entered
        state: AgentState,
    },
    /// A spotter alerted the squad
    SquadAlerted {
        /// Spotter
        spotter: AgentId,
        /// Shared last-seen position
        target: Vec2,
        /// Agents pulled into Engage
        recruited: usize,
    },
    /// Every live agent was forced into Retreat
    SquadRetreat {
        /// Agent whose death caused it, if any
        cause: Option<AgentId>,
    },
    /// An agent died
    AgentDied {
        /// Agent
        agent: AgentId,
    },
    /// An agent charged at its target
    AgentCharged {
        /// Agent
        agent: AgentId,
    },
    /// A support agent healed an ally
    AgentHealed {
        /// Healer
        healer: AgentId,
        /// Ally healed
        target: AgentId,
        /// Health restored
        amount: f32,
    },
    /// A projectile was spawned
    ProjectileFired {
        /// Owner
        owner: Owner,
        /// Spawn position
        position: Vec2,
    },
    /// A projectile hit an agent
    ProjectileHitAgent {
        /// Owner
        owner: Owner,
        /// Agent hit
        agent: AgentId,
        /// Damage dealt
        damage: f32,
    },
    /// A projectile hit the player
    ProjectileHitPlayer {
        /// Owner
        owner: Owner,
        /// Damage dealt
        damage: f32,
    },
    /// The player used an ability
    AbilityUsed {
        /// Ability
        ability: PlayerAbility,
    },
    /// The player died
    PlayerDied,
    /// The player collected a pickup
    PickupCollected {
        /// Pickup position
        position: Vec2,
        /// Health restored
        healed: f32,
    },
}

/// Bounded queue of [`SimEvent`]s, drained by the shell once per tick.
///
/// Publishing never blocks. When the queue is full the event is counted as
/// dropped instead.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<SimEvent>,
    receiver: Receiver<SimEvent>,
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            dropped: AtomicU64::new(0),
        }
    }

    /// Queues an event.
    pub fn publish(&self, event: SimEvent) {
        if let Err(TrySendError::Full(event) | TrySendError::Disconnected(event)) = self.sender.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            trace!(?event, "event bus full");
        }
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<SimEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Events lost to a full queue since construction.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(SimEvent::PlayerDied);
        bus.publish(SimEvent::AgentDied {
            agent: AgentId::from_index(1),
        });
        assert_eq!(bus.pending(), 2);

        let events = bus.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], SimEvent::PlayerDied);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn test_full_bus_drops_events() {
        let bus = EventBus::new(1);
        bus.publish(SimEvent::PlayerDied);
        bus.publish(SimEvent::PlayerDied);
        bus.publish(SimEvent::PlayerDied);
        assert_eq!(bus.dropped(), 2);
        assert_eq!(bus.drain().len(), 1);
        bus.publish(SimEvent::PlayerDied);
        assert_eq!(bus.pending(), 1);
        assert_eq!(bus.dropped(), 2);
    }

    #[test]
    fn test_events_serialize() {
        let event = SimEvent::StateEntered {
            agent: AgentId::from_index(2),
            state: AgentState::Engage,
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("Engage"));
    }
}
