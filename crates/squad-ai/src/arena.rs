//! Static level geometry.
//!
//! The arena owns the obstacle rectangles and the occupancy grid derived
//! from them. Both are built once and never change, which is what lets
//! agents keep paths between replans without revalidating them.

use fastrand::Rng;
use serde::{Deserialize, Serialize};
use squad_common::Vec2;

use crate::config::{MapConfig, SpawnConfig};

/// Axis-aligned rectangle with half-open containment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub w: f32,
    /// Height
    pub h: f32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Right edge (exclusive).
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Center point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Checks `x <= px < right` and `y <= py < bottom`.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Returns the rectangle grown by `pad` on every side.
    #[must_use]
    pub fn inflated(&self, pad: f32) -> Self {
        Self::new(self.x - pad, self.y - pad, self.w + pad * 2.0, self.h + pad * 2.0)
    }
}

/// Grid cell coordinate (column, row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridCell {
    /// Creates a grid cell.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another cell.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbors: right, left, down, up.
    #[must_use]
    pub const fn neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x + 1, self.y),
            Self::new(self.x - 1, self.y),
            Self::new(self.x, self.y + 1),
            Self::new(self.x, self.y - 1),
        ]
    }
}

/// Point-level obstacle lookup used by line-of-sight sampling.
pub trait ObstacleQuery {
    /// Returns true if the point lies inside an obstacle.
    fn point_blocked(&self, point: Vec2) -> bool;
}

/// Map bounds, obstacles and the derived occupancy grid.
#[derive(Debug, Clone)]
pub struct Arena {
    width: f32,
    height: f32,
    tile_size: f32,
    obstacles: Vec<Rect>,
    columns: i32,
    rows: i32,
    blocked: Vec<bool>,
}

impl Arena {
    /// Builds the arena described by a map configuration.
    #[must_use]
    pub fn new(map: &MapConfig) -> Self {
        Self::from_obstacles(map.width, map.height, map.tile_size, map.obstacles.clone())
    }

    /// Builds an arena with no obstacles.
    #[must_use]
    pub fn open(width: f32, height: f32, tile_size: f32) -> Self {
        Self::from_obstacles(width, height, tile_size, Vec::new())
    }

    /// Builds an arena and rasterizes its occupancy grid.
    ///
    /// A cell is blocked iff its center lies inside any obstacle.
    #[must_use]
    pub fn from_obstacles(width: f32, height: f32, tile_size: f32, obstacles: Vec<Rect>) -> Self {
        let tile_size = tile_size.max(1.0);
        let columns = (width / tile_size).floor().max(0.0) as i32;
        let rows = (height / tile_size).floor().max(0.0) as i32;

        let mut blocked = Vec::with_capacity((columns * rows).max(0) as usize);
        for y in 0..rows {
            for x in 0..columns {
                let center = Vec2::new(
                    (x as f32 + 0.5) * tile_size,
                    (y as f32 + 0.5) * tile_size,
                );
                blocked.push(obstacles.iter().any(|r| r.contains(center)));
            }
        }

        Self {
            width,
            height,
            tile_size,
            obstacles,
            columns,
            rows,
            blocked,
        }
    }

    /// Map width.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Map height.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }

    /// Tile edge length.
    #[must_use]
    pub const fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn columns(&self) -> i32 {
        self.columns
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn rows(&self) -> i32 {
        self.rows
    }

    /// Obstacle rectangles.
    #[must_use]
    pub fn obstacles(&self) -> &[Rect] {
        &self.obstacles
    }

    /// Row-major occupancy grid.
    #[must_use]
    pub fn blocked_cells(&self) -> &[bool] {
        &self.blocked
    }

    /// Map center.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Checks whether a cell lies inside the grid.
    #[must_use]
    pub const fn in_grid(&self, cell: GridCell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.columns && cell.y < self.rows
    }

    /// Checks whether a cell is blocked. Cells outside the grid count as blocked.
    #[must_use]
    pub fn is_blocked(&self, cell: GridCell) -> bool {
        if !self.in_grid(cell) {
            return true;
        }
        self.blocked[(cell.y * self.columns + cell.x) as usize]
    }

    /// Cell containing a world point.
    #[must_use]
    pub fn cell_of(&self, point: Vec2) -> GridCell {
        GridCell::new(
            (point.x / self.tile_size).floor() as i32,
            (point.y / self.tile_size).floor() as i32,
        )
    }

    /// World-space center of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: GridCell) -> Vec2 {
        Vec2::new(
            (cell.x as f32 + 0.5) * self.tile_size,
            (cell.y as f32 + 0.5) * self.tile_size,
        )
    }

    /// Checks whether a point is inside any obstacle.
    #[must_use]
    pub fn point_in_obstacle(&self, point: Vec2) -> bool {
        self.obstacles.iter().any(|r| r.contains(point))
    }

    /// Checks whether a point is inside the map.
    #[must_use]
    pub fn point_in_bounds(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }

    /// Tests a circle against obstacles inflated by `radius + margin` and
    /// against the map edges.
    #[must_use]
    pub fn circle_blocked(&self, center: Vec2, radius: f32, margin: f32) -> bool {
        if center.x < radius
            || center.y < radius
            || center.x > self.width - radius
            || center.y > self.height - radius
        {
            return true;
        }
        let pad = radius + margin;
        self.obstacles.iter().any(|r| r.inflated(pad).contains(center))
    }

    /// Spawn-grade clearance test: unblocked and at least `radius + 1` from every edge.
    #[must_use]
    pub fn is_free(&self, center: Vec2, radius: f32, margin: f32) -> bool {
        let edge = radius + 1.0;
        center.x >= edge
            && center.y >= edge
            && center.x <= self.width - edge
            && center.y <= self.height - edge
            && !self.circle_blocked(center, radius, margin)
    }

    /// Clamps a circle's center so the circle stays inside the map.
    #[must_use]
    pub fn clamp_to_bounds(&self, center: Vec2, radius: f32) -> Vec2 {
        let max_x = (self.width - radius).max(radius);
        let max_y = (self.height - radius).max(radius);
        Vec2::new(center.x.clamp(radius, max_x), center.y.clamp(radius, max_y))
    }

    /// Draws random positions until one is free, falling back to the map center.
    pub fn find_free_position(&self, radius: f32, spawn: &SpawnConfig, rng: &mut Rng) -> Vec2 {
        let pad = radius + spawn.edge_padding;
        let (lo_x, hi_x) = (pad, self.width - pad);
        let (lo_y, hi_y) = (pad, self.height - pad);
        if hi_x > lo_x && hi_y > lo_y {
            for _ in 0..spawn.attempts {
                let candidate = Vec2::new(
                    lo_x + rng.f32() * (hi_x - lo_x),
                    lo_y + rng.f32() * (hi_y - lo_y),
                );
                if self.is_free(candidate, radius, spawn.margin) {
                    return candidate;
                }
            }
        }
        tracing::trace!(radius, "no free spawn position, using map center");
        self.center()
    }

    /// Draws a random point at least `margin` from the edges whose cell is open.
    pub fn random_open_point(&self, margin: f32, attempts: u32, rng: &mut Rng) -> Vec2 {
        let (lo_x, hi_x) = (margin, self.width - margin);
        let (lo_y, hi_y) = (margin, self.height - margin);
        if hi_x > lo_x && hi_y > lo_y {
            for _ in 0..attempts {
                let candidate = Vec2::new(
                    lo_x + rng.f32() * (hi_x - lo_x),
                    lo_y + rng.f32() * (hi_y - lo_y),
                );
                if !self.is_blocked(self.cell_of(candidate)) {
                    return candidate;
                }
            }
        }
        self.center()
    }

    /// Marches a ray and returns the distance to the first obstacle or map edge.
    ///
    /// Returns `max_distance` when nothing is hit. Used by the shell to draw
    /// occluded view cones.
    #[must_use]
    pub fn ray_hit_distance(&self, origin: Vec2, direction: Vec2, max_distance: f32, step: f32) -> f32 {
        let dir = direction.normalize_or_zero();
        if dir == Vec2::ZERO {
            return 0.0;
        }
        let step = step.max(0.5);
        let mut travelled = 0.0;
        while travelled < max_distance {
            let point = origin + dir * travelled;
            if !self.point_in_bounds(point) || self.point_in_obstacle(point) {
                return travelled;
            }
            travelled += step;
        }
        max_distance
    }
}

impl ObstacleQuery for Arena {
    fn point_blocked(&self, point: Vec2) -> bool {
        self.point_in_obstacle(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_arena() -> Arena {
        Arena::from_obstacles(320.0, 320.0, 32.0, vec![Rect::new(64.0, 64.0, 64.0, 32.0)])
    }

    #[test]
    fn test_rect_half_open_containment() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Vec2::new(0.0, 0.0)));
        assert!(r.contains(Vec2::new(9.99, 9.99)));
        assert!(!r.contains(Vec2::new(10.0, 5.0)));
    }

    #[test]
    fn test_grid_blocks_cells_by_center() {
        let arena = sample_arena();
        assert_eq!(arena.columns(), 10);
        assert_eq!(arena.rows(), 10);
        // Centers (80,80) and (112,80) lie inside the rect.
        assert!(arena.is_blocked(GridCell::new(2, 2)));
        assert!(arena.is_blocked(GridCell::new(3, 2)));
        // Center (80,112) lies below it.
        assert!(!arena.is_blocked(GridCell::new(2, 3)));
        assert!(!arena.is_blocked(GridCell::new(0, 0)));
        assert_eq!(arena.blocked_cells().iter().filter(|b| **b).count(), 2);
    }

    #[test]
    fn test_out_of_grid_is_blocked() {
        let arena = sample_arena();
        assert!(arena.is_blocked(GridCell::new(-1, 0)));
        assert!(arena.is_blocked(GridCell::new(0, 10)));
    }

    #[test]
    fn test_cell_roundtrip() {
        let arena = sample_arena();
        let cell = arena.cell_of(Vec2::new(100.0, 40.0));
        assert_eq!(cell, GridCell::new(3, 1));
        assert_eq!(arena.cell_center(cell), Vec2::new(112.0, 48.0));
    }

    #[test]
    fn test_circle_blocked_uses_inflated_rect() {
        let arena = sample_arena();
        // 10 units left of the rect: a point test passes, a radius 8 circle does not.
        let p = Vec2::new(54.0, 80.0);
        assert!(!arena.point_in_obstacle(p));
        assert!(arena.circle_blocked(p, 8.0, 2.0));
        assert!(!arena.circle_blocked(p, 4.0, 2.0));
    }

    #[test]
    fn test_circle_blocked_at_map_edges() {
        let arena = sample_arena();
        assert!(arena.circle_blocked(Vec2::new(5.0, 200.0), 8.0, 0.0));
        assert!(!arena.circle_blocked(Vec2::new(20.0, 200.0), 8.0, 0.0));
    }

    #[test]
    fn test_clamp_to_bounds() {
        let arena = sample_arena();
        let p = arena.clamp_to_bounds(Vec2::new(-50.0, 400.0), 10.0);
        assert_eq!(p, Vec2::new(10.0, 310.0));
    }

    #[test]
    fn test_find_free_position_is_free() {
        let arena = sample_arena();
        let spawn = SpawnConfig::default();
        let mut rng = Rng::with_seed(7);
        for _ in 0..20 {
            let p = arena.find_free_position(18.0, &spawn, &mut rng);
            assert!(arena.is_free(p, 18.0, spawn.margin));
        }
    }

    #[test]
    fn test_find_free_position_falls_back_to_center() {
        let arena = Arena::from_obstacles(100.0, 100.0, 10.0, vec![Rect::new(0.0, 0.0, 100.0, 100.0)]);
        let spawn = SpawnConfig {
            attempts: 5,
            ..SpawnConfig::default()
        };
        let mut rng = Rng::with_seed(1);
        assert_eq!(arena.find_free_position(5.0, &spawn, &mut rng), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_random_open_point_avoids_blocked_cells() {
        let arena = sample_arena();
        let mut rng = Rng::with_seed(3);
        for _ in 0..50 {
            let p = arena.random_open_point(20.0, 32, &mut rng);
            assert!(!arena.is_blocked(arena.cell_of(p)));
        }
    }

    #[test]
    fn test_ray_hit_distance() {
        let arena = sample_arena();
        let d = arena.ray_hit_distance(Vec2::new(0.5, 80.0), Vec2::X, 300.0, 8.0);
        assert!((64.0..=72.5).contains(&d));
        let clear = arena.ray_hit_distance(Vec2::new(10.0, 10.0), Vec2::Y, 40.0, 8.0);
        assert_eq!(clear, 40.0);
    }

    #[test]
    fn test_manhattan_and_neighbors() {
        let a = GridCell::new(1, 1);
        assert_eq!(a.manhattan(GridCell::new(4, -1)), 5);
        assert!(a.neighbors().iter().all(|n| n.manhattan(a) == 1));
    }
}
