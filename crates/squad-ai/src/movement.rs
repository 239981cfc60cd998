//! Movement and collision resolution.
//!
//! Desired velocities are smoothed and clamped, then integrated against the
//! arena with circle-vs-inflated-rectangle tests. A blocked move falls back
//! to axis-separated sliding, and a body that cannot slide either gets a
//! small random nudge so it does not stay wedged in a concave corner.

use std::f32::consts::TAU;

use fastrand::Rng;
use squad_common::{approach, is_near_zero, unit_from_angle, Vec2};
use tracing::trace;

use crate::agent::Body;
use crate::arena::Arena;
use crate::config::MovementConfig;

/// How a move resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Full displacement applied
    Moved,
    /// Only the X component applied
    SlidX,
    /// Only the Y component applied
    SlidY,
    /// Blocked; pushed a short random distance instead
    Nudged,
    /// Blocked with nowhere to go; velocity zeroed
    Stuck,
}

/// Smooths velocity toward `desired`, clamps it, and moves the body.
pub fn steer(
    body: &mut Body,
    desired: Vec2,
    dt: f32,
    config: &MovementConfig,
    arena: &Arena,
    rng: &mut Rng,
) -> MoveOutcome {
    body.velocity = approach(body.velocity, desired, config.velocity_smoothing, dt)
        .clamp_length_max(body.max_speed);
    update_facing(body, config.facing_epsilon);
    resolve(body, dt, config, arena, rng)
}

/// Launches the body at `velocity` for one tick, skipping smoothing.
///
/// The move covers the full launch speed; the velocity left on the body is
/// clamped back to max speed.
pub fn impulse(
    body: &mut Body,
    velocity: Vec2,
    dt: f32,
    config: &MovementConfig,
    arena: &Arena,
    rng: &mut Rng,
) -> MoveOutcome {
    body.velocity = velocity;
    update_facing(body, config.facing_epsilon);
    let outcome = resolve(body, dt, config, arena, rng);
    body.velocity = body.velocity.clamp_length_max(body.max_speed);
    outcome
}

/// Points facing along velocity unless the body is nearly at rest.
pub fn update_facing(body: &mut Body, epsilon: f32) {
    if !is_near_zero(body.velocity, epsilon) {
        body.facing = body.velocity.normalize_or_zero();
    }
}

/// Tries the full move, then X only, then Y only.
///
/// The blocked axis keeps `friction` of its velocity while sliding.
/// Returns `None` without touching the body when all three are blocked.
pub fn slide_move(body: &mut Body, dt: f32, arena: &Arena, margin: f32, friction: f32) -> Option<MoveOutcome> {
    let step = body.velocity * dt;
    let radius = body.radius;

    let full = body.position + step;
    if !arena.circle_blocked(full, radius, margin) {
        body.position = full;
        return Some(MoveOutcome::Moved);
    }

    if step.x != 0.0 {
        let x_only = body.position + Vec2::new(step.x, 0.0);
        if !arena.circle_blocked(x_only, radius, margin) {
            body.position = x_only;
            body.velocity.y *= friction;
            return Some(MoveOutcome::SlidX);
        }
    }

    if step.y != 0.0 {
        let y_only = body.position + Vec2::new(0.0, step.y);
        if !arena.circle_blocked(y_only, radius, margin) {
            body.position = y_only;
            body.velocity.x *= friction;
            return Some(MoveOutcome::SlidY);
        }
    }

    None
}

/// Integrates velocity with sliding and anti-stuck recovery.
fn resolve(body: &mut Body, dt: f32, config: &MovementConfig, arena: &Arena, rng: &mut Rng) -> MoveOutcome {
    if let Some(outcome) = slide_move(body, dt, arena, config.collision_margin, config.slide_friction) {
        return outcome;
    }

    let nudge = body.position + unit_from_angle(rng.f32() * TAU) * config.unstick_nudge;
    let outcome = if arena.circle_blocked(nudge, body.radius, config.collision_margin) {
        MoveOutcome::Stuck
    } else {
        body.position = nudge;
        MoveOutcome::Nudged
    };
    body.position = arena.clamp_to_bounds(body.position, body.radius);
    body.velocity = Vec2::ZERO;
    trace!(x = body.position.x, y = body.position.y, ?outcome, "unstick");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Rect;
    use proptest::prelude::*;

    fn arena() -> Arena {
        Arena::from_obstacles(640.0, 640.0, 32.0, vec![Rect::new(200.0, 200.0, 100.0, 100.0)])
    }

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(Vec2::new(x, y), 18.0, 150.0)
    }

    #[test]
    fn test_free_move_smooths_and_clamps() {
        let arena = arena();
        let config = MovementConfig::default();
        let mut rng = Rng::with_seed(1);
        let mut body = body_at(100.0, 100.0);

        let outcome = steer(&mut body, Vec2::new(1000.0, 0.0), 0.1, &config, &arena, &mut rng);
        assert_eq!(outcome, MoveOutcome::Moved);
        // 60% of the way to 1000, clamped to 150.
        assert!((body.velocity.length() - 150.0).abs() < 1e-3);
        assert!((body.position.x - 115.0).abs() < 1e-3);
        assert_eq!(body.facing, Vec2::X);
    }

    #[test]
    fn test_facing_holds_at_rest() {
        let mut body = body_at(100.0, 100.0);
        body.facing = Vec2::Y;
        body.velocity = Vec2::new(0.001, 0.0);
        update_facing(&mut body, 0.01);
        assert_eq!(body.facing, Vec2::Y);
    }

    #[test]
    fn test_slide_along_wall() {
        let arena = arena();
        let config = MovementConfig::default();
        let mut rng = Rng::with_seed(1);
        // Left of the block, moving diagonally into it.
        let mut body = body_at(178.0, 250.0);
        body.velocity = Vec2::new(100.0, 100.0);

        let outcome = impulse(&mut body, Vec2::new(100.0, 100.0), 0.1, &config, &arena, &mut rng);
        assert_eq!(outcome, MoveOutcome::SlidY);
        assert!((body.position.y - 260.0).abs() < 1e-3);
        assert!((body.velocity.x - 35.0).abs() < 1e-3);
    }

    #[test]
    fn test_stuck_body_is_nudged_or_halted() {
        let arena = arena();
        let config = MovementConfig::default();
        let mut rng = Rng::with_seed(9);
        // Overlapping the inflated obstacle already, so every move is blocked.
        let mut body = body_at(190.0, 250.0);
        let outcome = impulse(&mut body, Vec2::new(50.0, 0.0), 0.1, &config, &arena, &mut rng);
        assert!(matches!(outcome, MoveOutcome::Nudged | MoveOutcome::Stuck));
        assert_eq!(body.velocity, Vec2::ZERO);
        assert!(arena.point_in_bounds(body.position));
    }

    #[test]
    fn test_map_edge_blocks_movement() {
        let arena = arena();
        let config = MovementConfig::default();
        let mut rng = Rng::with_seed(2);
        let mut body = body_at(19.0, 100.0);
        impulse(&mut body, Vec2::new(-300.0, 0.0), 0.1, &config, &arena, &mut rng);
        assert!(body.position.x >= body.radius);
    }

    #[test]
    fn test_impulse_moves_fast_but_leaves_max_speed() {
        let arena = arena();
        let config = MovementConfig::default();
        let mut rng = Rng::with_seed(4);
        let mut body = body_at(100.0, 400.0);

        let outcome = impulse(&mut body, Vec2::new(420.0, 0.0), 0.1, &config, &arena, &mut rng);
        assert_eq!(outcome, MoveOutcome::Moved);
        assert!((body.position.x - 142.0).abs() < 1e-3);
        assert!((body.velocity.x - body.max_speed).abs() < 1e-3);
        assert_eq!(body.facing, Vec2::X);
    }

    proptest! {
        #[test]
        fn prop_impulse_never_leaves_excess_speed(
            x in 20.0f32..620.0, y in 20.0f32..620.0,
            vx in -2000.0f32..2000.0, vy in -2000.0f32..2000.0,
            dt in 0.001f32..0.25,
            seed in any::<u64>(),
        ) {
            let arena = arena();
            let config = MovementConfig::default();
            let mut rng = Rng::with_seed(seed);
            let mut body = body_at(x, y);
            impulse(&mut body, Vec2::new(vx, vy), dt, &config, &arena, &mut rng);
            prop_assert!(body.velocity.length() <= body.max_speed + 1e-3);
            steer(&mut body, Vec2::new(vx, vy), dt, &config, &arena, &mut rng);
            prop_assert!(body.velocity.length() <= body.max_speed + 1e-3);
        }

        #[test]
        fn prop_speed_never_exceeds_max(
            x in 20.0f32..620.0, y in 20.0f32..620.0,
            dx in -2000.0f32..2000.0, dy in -2000.0f32..2000.0,
            vx in -150.0f32..150.0, vy in -150.0f32..150.0,
            dt in 0.001f32..0.25,
            seed in any::<u64>(),
        ) {
            let arena = arena();
            let config = MovementConfig::default();
            let mut rng = Rng::with_seed(seed);
            let mut body = body_at(x, y);
            body.velocity = Vec2::new(vx, vy).clamp_length_max(body.max_speed);
            for _ in 0..5 {
                steer(&mut body, Vec2::new(dx, dy), dt, &config, &arena, &mut rng);
                prop_assert!(body.velocity.length() <= body.max_speed + 1e-3);
            }
        }
    }
}
