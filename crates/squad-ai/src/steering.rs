//! Steering behaviors.
//!
//! Each function returns a desired-velocity contribution. They are pure and
//! independent; callers combine them by weighted summation (see [`blend`]).

use serde::{Deserialize, Serialize};
use squad_common::{direction, Vec2, EPSILON};

use crate::config::SteeringConfig;

/// Kinematic state of a neighboring agent as seen by steering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Neighbor position
    pub position: Vec2,
    /// Neighbor velocity
    pub velocity: Vec2,
}

impl Neighbor {
    /// Creates a neighbor record.
    #[must_use]
    pub const fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }
}

/// Unit vector toward `target` scaled to `speed`; zero when already there.
#[must_use]
pub fn seek(position: Vec2, target: Vec2, speed: f32) -> Vec2 {
    direction(position, target) * speed
}

/// Unit vector away from `target` scaled to `speed`; zero when on top of it.
#[must_use]
pub fn flee(position: Vec2, target: Vec2, speed: f32) -> Vec2 {
    direction(target, position) * speed
}

/// Push away from neighbors closer than `radius`, each weighted by `strength / distance`.
#[must_use]
pub fn separation(position: Vec2, neighbors: &[Neighbor], radius: f32, strength: f32) -> Vec2 {
    neighbors
        .iter()
        .filter_map(|n| {
            let offset = position - n.position;
            let dist = offset.length();
            // Coincident neighbors have no defined push direction.
            (dist > EPSILON && dist < radius).then(|| offset / dist * (strength / dist))
        })
        .sum()
}

/// Seek toward the centroid of the neighbors.
#[must_use]
pub fn cohesion(position: Vec2, neighbors: &[Neighbor], speed: f32) -> Vec2 {
    if neighbors.is_empty() {
        return Vec2::ZERO;
    }
    let centroid = neighbors.iter().map(|n| n.position).sum::<Vec2>() / neighbors.len() as f32;
    seek(position, centroid, speed)
}

/// Average neighbor velocity.
#[must_use]
pub fn alignment(neighbors: &[Neighbor]) -> Vec2 {
    if neighbors.is_empty() {
        return Vec2::ZERO;
    }
    neighbors.iter().map(|n| n.velocity).sum::<Vec2>() / neighbors.len() as f32
}

/// Flocking contributions computed once per tick and reused by the blend.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlockForces {
    /// Separation contribution
    pub separation: Vec2,
    /// Cohesion contribution
    pub cohesion: Vec2,
    /// Alignment contribution
    pub alignment: Vec2,
}

impl FlockForces {
    /// Computes all three flocking rules for one agent.
    #[must_use]
    pub fn compute(position: Vec2, neighbors: &[Neighbor], config: &SteeringConfig) -> Self {
        Self {
            separation: separation(
                position,
                neighbors,
                config.separation_radius,
                config.separation_strength,
            ),
            cohesion: cohesion(position, neighbors, config.cohesion_speed),
            alignment: alignment(neighbors),
        }
    }
}

/// Weighted sum of a chase vector and the flocking rules.
///
/// Cohesion is left out while an agent follows a path, so the squad does
/// not pull it off its waypoints.
#[must_use]
pub fn blend(chase: Vec2, forces: &FlockForces, config: &SteeringConfig, with_cohesion: bool) -> Vec2 {
    let mut desired = chase
        + forces.separation * config.separation_weight
        + forces.alignment * config.alignment_weight;
    if with_cohesion {
        desired += forces.cohesion * config.cohesion_weight;
    }
    desired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_seek_and_flee() {
        let pos = Vec2::ZERO;
        let target = Vec2::new(10.0, 0.0);
        assert!(approx(seek(pos, target, 5.0), Vec2::new(5.0, 0.0)));
        assert!(approx(flee(pos, target, 5.0), Vec2::new(-5.0, 0.0)));
        assert_eq!(seek(target, target, 5.0), Vec2::ZERO);
    }

    #[test]
    fn test_separation_weights_by_inverse_distance() {
        let neighbors = [
            Neighbor::new(Vec2::new(10.0, 0.0), Vec2::ZERO),
            Neighbor::new(Vec2::new(0.0, 20.0), Vec2::ZERO),
            Neighbor::new(Vec2::new(100.0, 0.0), Vec2::ZERO),
        ];
        let push = separation(Vec2::ZERO, &neighbors, 50.0, 60.0);
        // 60/10 to the left, 60/20 upward; the far one is ignored.
        assert!(approx(push, Vec2::new(-6.0, -3.0)));
    }

    #[test]
    fn test_separation_zero_without_close_neighbors() {
        let neighbors = [Neighbor::new(Vec2::new(80.0, 0.0), Vec2::ZERO)];
        assert_eq!(separation(Vec2::ZERO, &neighbors, 50.0, 60.0), Vec2::ZERO);
        let same = [Neighbor::new(Vec2::ZERO, Vec2::ZERO)];
        assert_eq!(separation(Vec2::ZERO, &same, 50.0, 60.0), Vec2::ZERO);
    }

    #[test]
    fn test_cohesion_and_alignment() {
        let neighbors = [
            Neighbor::new(Vec2::new(10.0, 0.0), Vec2::new(2.0, 0.0)),
            Neighbor::new(Vec2::new(10.0, 20.0), Vec2::new(0.0, 4.0)),
        ];
        let c = cohesion(Vec2::new(10.0, 0.0), &neighbors, 40.0);
        assert!(approx(c, Vec2::new(0.0, 40.0)));
        assert!(approx(alignment(&neighbors), Vec2::new(1.0, 2.0)));
        assert_eq!(cohesion(Vec2::ZERO, &[], 40.0), Vec2::ZERO);
        assert_eq!(alignment(&[]), Vec2::ZERO);
    }

    #[test]
    fn test_blend_drops_cohesion_on_request() {
        let config = SteeringConfig::default();
        let forces = FlockForces {
            separation: Vec2::new(1.0, 0.0),
            cohesion: Vec2::new(0.0, 10.0),
            alignment: Vec2::new(0.0, -1.0),
        };
        let with = blend(Vec2::ZERO, &forces, &config, true);
        let without = blend(Vec2::ZERO, &forces, &config, false);
        assert!(approx(with, Vec2::new(1.2, 3.5 - 0.4)));
        assert!(approx(without, Vec2::new(1.2, -0.4)));
    }
}
