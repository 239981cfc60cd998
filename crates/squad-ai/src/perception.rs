//! Target detection.
//!
//! Three tests run in a fixed order and short-circuit on the first failure:
//! - range: squared distance against the squared detection range
//! - field of view: dot product against the cosine of the half angle
//! - line of sight: evenly spaced samples along the sight segment
//!
//! The sampled test is the only one that touches level geometry, so it
//! runs last.

use squad_common::{half_angle_cos, Vec2};

use crate::agent::Agent;
use crate::arena::ObstacleQuery;
use crate::config::PerceptionConfig;

/// Checks whether an observer at `eye` facing `facing` can see `target`.
pub fn can_see<Q: ObstacleQuery + ?Sized>(
    eye: Vec2,
    facing: Vec2,
    target: Vec2,
    config: &PerceptionConfig,
    obstacles: &Q,
) -> bool {
    let offset = target - eye;
    let range = config.detection_range;
    if offset.length_squared() > range * range {
        return false;
    }

    let to_target = offset.normalize_or_zero();
    if to_target != Vec2::ZERO {
        let facing = facing.normalize_or_zero();
        if facing.dot(to_target) < half_angle_cos(config.fov_degrees) {
            return false;
        }
    }

    line_of_sight(eye, target, config.los_samples, obstacles)
}

/// Samples `samples` points from just past `from` up to and including `to`.
pub fn line_of_sight<Q: ObstacleQuery + ?Sized>(from: Vec2, to: Vec2, samples: u32, obstacles: &Q) -> bool {
    let samples = samples.max(1);
    (1..=samples).all(|i| {
        let t = i as f32 / samples as f32;
        !obstacles.point_blocked(from.lerp(to, t))
    })
}

/// Senses the target for one tick and updates the agent's memory.
///
/// `target` is `None` when there is nothing to see (a dead player), which
/// counts as a miss.
pub fn perceive<Q: ObstacleQuery + ?Sized>(
    agent: &mut Agent,
    target: Option<Vec2>,
    dt: f32,
    config: &PerceptionConfig,
    obstacles: &Q,
) -> bool {
    let visible = target.is_some_and(|t| can_see(agent.body.position, agent.body.facing, t, config, obstacles));
    match target {
        Some(t) if visible => agent.memory.refresh(t),
        _ => agent.memory.lose(dt),
    }
    visible
}
