//! A* search over the occupancy grid.
//!
//! 4-directional moves, uniform edge cost and a Manhattan heuristic. Entries
//! with equal `f` leave the open set in insertion order, so a given grid and
//! endpoint pair always yields the same path.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::arena::{Arena, GridCell};

/// Grid view used by the pathfinder.
pub trait NavGrid {
    /// Grid size as (columns, rows).
    fn dimensions(&self) -> (i32, i32);

    /// Returns true if the cell can be stepped on.
    fn is_walkable(&self, cell: GridCell) -> bool;

    /// Checks whether a cell lies inside the grid.
    fn contains(&self, cell: GridCell) -> bool {
        let (columns, rows) = self.dimensions();
        cell.x >= 0 && cell.y >= 0 && cell.x < columns && cell.y < rows
    }
}

impl NavGrid for Arena {
    fn dimensions(&self) -> (i32, i32) {
        (self.columns(), self.rows())
    }

    fn is_walkable(&self, cell: GridCell) -> bool {
        !self.is_blocked(cell)
    }
}

/// Finds the shortest 4-connected path from `start` to `goal`, both inclusive.
///
/// Returns `None` when either endpoint is outside the grid, the goal is
/// blocked, or no route exists. The start cell itself may be blocked (an
/// agent hugging an obstacle can sit in one); only the cells stepped onto
/// must be walkable.
pub fn find_path<G: NavGrid + ?Sized>(grid: &G, start: GridCell, goal: GridCell) -> Option<Vec<GridCell>> {
    if !grid.contains(start) || !grid.contains(goal) || !grid.is_walkable(goal) {
        return None;
    }
    if start == goal {
        return Some(vec![start]);
    }

    let (columns, rows) = grid.dimensions();
    let cell_count = (columns * rows) as usize;
    let index = |cell: GridCell| (cell.y * columns + cell.x) as usize;

    let mut g_score = vec![u32::MAX; cell_count];
    let mut came_from: Vec<Option<GridCell>> = vec![None; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open = BinaryHeap::new();
    let mut sequence: u64 = 0;

    g_score[index(start)] = 0;
    open.push(Reverse((start.manhattan(goal), sequence, start)));

    while let Some(Reverse((_, _, current))) = open.pop() {
        let current_index = index(current);
        if closed[current_index] {
            continue;
        }
        if current == goal {
            return Some(reconstruct(&came_from, current, index));
        }
        closed[current_index] = true;

        let next_g = g_score[current_index] + 1;
        for neighbor in current.neighbors() {
            if !grid.contains(neighbor) || !grid.is_walkable(neighbor) {
                continue;
            }
            let neighbor_index = index(neighbor);
            if closed[neighbor_index] || next_g >= g_score[neighbor_index] {
                continue;
            }
            g_score[neighbor_index] = next_g;
            came_from[neighbor_index] = Some(current);
            sequence += 1;
            open.push(Reverse((next_g + neighbor.manhattan(goal), sequence, neighbor)));
        }
    }

    None
}

fn reconstruct(
    came_from: &[Option<GridCell>],
    goal: GridCell,
    index: impl Fn(GridCell) -> usize,
) -> Vec<GridCell> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(previous) = came_from[index(cursor)] {
        path.push(previous);
        cursor = previous;
    }
    path.reverse();
    path
}

/// A computed path plus the index of the next waypoint to reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivePath {
    cells: Vec<GridCell>,
    cursor: usize,
}

impl ActivePath {
    /// Wraps a cell sequence with the cursor at its first cell.
    #[must_use]
    pub fn new(cells: Vec<GridCell>) -> Self {
        Self { cells, cursor: 0 }
    }

    /// Cells of the path, start to goal.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Index of the next waypoint.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Next waypoint cell, if any remain.
    #[must_use]
    pub fn current(&self) -> Option<GridCell> {
        self.cells.get(self.cursor).copied()
    }

    /// Moves the cursor past the current waypoint.
    pub fn advance(&mut self) {
        if self.cursor < self.cells.len() {
            self.cursor += 1;
        }
    }

    /// True once every waypoint has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.cells.len()
    }
}
