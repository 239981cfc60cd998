//! Heart pickups.

use serde::{Deserialize, Serialize};
use squad_common::Vec2;
use tracing::debug;

use crate::config::SpawnConfig;
use crate::events::{EventBus, SimEvent};
use crate::player::Player;

/// A heart lying in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Center position
    pub position: Vec2,
}

impl Pickup {
    /// Creates a pickup.
    #[must_use]
    pub const fn new(position: Vec2) -> Self {
        Self { position }
    }
}

/// Lets a live player collect the first pickup within reach.
///
/// Returns the health restored, or `None` when nothing was collected.
pub fn collect(pickups: &mut Vec<Pickup>, player: &mut Player, spawn: &SpawnConfig, events: &EventBus) -> Option<f32> {
    if !player.alive {
        return None;
    }
    let position = player.position();
    let index = pickups
        .iter()
        .position(|p| p.position.distance(position) < spawn.pickup_reach)?;
    let pickup = pickups.remove(index);
    let healed = player.heal(spawn.pickup_heal);
    debug!(healed, "pickup collected");
    events.publish(SimEvent::PickupCollected {
        position: pickup.position,
        healed,
    });
    Some(healed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;

    #[test]
    fn test_collect_in_reach() {
        let spawn = SpawnConfig::default();
        let events = EventBus::default();
        let mut player = Player::new(Vec2::new(100.0, 100.0), &PlayerConfig::default());
        player.health = 50.0;
        let mut pickups = vec![Pickup::new(Vec2::new(400.0, 100.0)), Pickup::new(Vec2::new(120.0, 100.0))];

        assert_eq!(collect(&mut pickups, &mut player, &spawn, &events), Some(40.0));
        assert_eq!(player.health, 90.0);
        assert_eq!(pickups, vec![Pickup::new(Vec2::new(400.0, 100.0))]);
        assert_eq!(collect(&mut pickups, &mut player, &spawn, &events), None);
        assert_eq!(events.drain().len(), 1);
    }

    #[test]
    fn test_heal_capped_and_dead_player_ignored() {
        let spawn = SpawnConfig::default();
        let events = EventBus::default();
        let mut player = Player::new(Vec2::new(100.0, 100.0), &PlayerConfig::default());
        player.health = 100.0;
        let mut pickups = vec![Pickup::new(Vec2::new(100.0, 110.0)), Pickup::new(Vec2::new(100.0, 90.0))];

        assert_eq!(collect(&mut pickups, &mut player, &spawn, &events), Some(20.0));
        player.apply_damage(1000.0);
        assert_eq!(collect(&mut pickups, &mut player, &spawn, &events), None);
        assert_eq!(pickups.len(), 1);
    }
}
