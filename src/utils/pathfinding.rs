//! # Pathfinding Algorithms
//!
//! A* route search, neighbor queries and drop-cell search over any
//! passability predicate.

use crate::Cell;
use ::pathfinding::prelude::bfs;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Travel distance reported when no route exists.
pub const UNREACHABLE: u32 = u32::MAX;

/// A passability predicate over a bounded grid.
///
/// Implemented by [`crate::Assessor`]; tests and tools may supply their own.
pub trait Passability {
    /// Whether the cell lies on the map at all.
    fn in_bounds(&self, cell: Cell) -> bool;

    /// Whether the mover may enter the cell.
    fn is_passable(&self, cell: Cell) -> bool;
}

/// Returns the in-bounds, passable neighbors of `cell`. An adjacent `goal` is
/// always included, whatever the predicate says about it.
pub fn neighbors_of<P: Passability + ?Sized>(cell: Cell, goal: Option<Cell>, assessor: &P) -> Vec<Cell> {
    cell.neighbors()
        .into_iter()
        .filter(|&n| assessor.in_bounds(n))
        .filter(|&n| Some(n) == goal || assessor.is_passable(n))
        .collect()
}

/// Finds a route from `start` to `goal` with A*.
///
/// Edges and the heuristic are Euclidean. Among open nodes with equal
/// f-score the one pushed first wins, so routes are reproducible. The goal is
/// always treated as passable. The returned path excludes `start` and ends at
/// `goal`; `None` means unreachable.
///
/// # Examples
///
/// ```
/// use warband::{find_route, Cell, Passability};
///
/// struct Open;
/// impl Passability for Open {
///     fn in_bounds(&self, c: Cell) -> bool { (0..5).contains(&c.row) && (0..5).contains(&c.col) }
///     fn is_passable(&self, _: Cell) -> bool { true }
/// }
///
/// let route = find_route(Cell::new(0, 0), Cell::new(3, 3), &Open).unwrap();
/// assert_eq!(route.len(), 3);
/// assert_eq!(route.last(), Some(&Cell::new(3, 3)));
/// ```
pub fn find_route<P: Passability + ?Sized>(start: Cell, goal: Cell, assessor: &P) -> Option<Vec<Cell>> {
    if start == goal {
        return Some(Vec::new());
    }
    if !assessor.in_bounds(goal) {
        return None;
    }

    let mut open_set = BinaryHeap::new();
    let mut closed = HashSet::new();
    let mut came_from: HashMap<Cell, Cell> = HashMap::new();
    let mut g_score: HashMap<Cell, f64> = HashMap::new();
    let mut sequence = 0u64;

    g_score.insert(start, 0.0);
    open_set.push(AStarNode {
        cell: start,
        f_score: start.cartesian_distance(goal),
        sequence,
    });

    while let Some(node) = open_set.pop() {
        let current = node.cell;

        if current == goal {
            let mut path = vec![goal];
            let mut cursor = goal;
            while let Some(&prev) = came_from.get(&cursor) {
                if prev == start {
                    break;
                }
                path.push(prev);
                cursor = prev;
            }
            path.reverse();
            return Some(path);
        }

        if !closed.insert(current) {
            continue;
        }

        let current_g = g_score.get(&current).copied().unwrap_or(f64::INFINITY);

        for neighbor in neighbors_of(current, Some(goal), assessor) {
            if closed.contains(&neighbor) {
                continue;
            }

            let tentative = current_g + current.cartesian_distance(neighbor);
            if tentative < g_score.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative);
                sequence += 1;
                open_set.push(AStarNode {
                    cell: neighbor,
                    f_score: tentative + neighbor.cartesian_distance(goal),
                    sequence,
                });
            }
        }
    }

    None
}

/// Length of the A* route, or [`UNREACHABLE`].
pub fn travel_distance<P: Passability + ?Sized>(start: Cell, goal: Cell, assessor: &P) -> u32 {
    find_route(start, goal, assessor)
        .map(|route| route.len() as u32)
        .unwrap_or(UNREACHABLE)
}

/// Breadth-first search outward from `near` for the closest cell the
/// assessor accepts and `is_free` approves.
pub fn find_drop_cell<P, F>(near: Cell, assessor: &P, is_free: F) -> Option<Cell>
where
    P: Passability + ?Sized,
    F: Fn(Cell) -> bool,
{
    let path = bfs(
        &near,
        |&cell| neighbors_of(cell, None, assessor),
        |&cell| is_free(cell) && (cell == near || assessor.is_passable(cell)),
    )?;
    path.last().copied()
}

/// Open-set entry for A*.
#[derive(Debug, Clone)]
pub struct AStarNode {
    pub cell: Cell,
    pub f_score: f64,
    /// Push order; breaks f-score ties.
    pub sequence: u64,
}

impl PartialEq for AStarNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AStarNode {}

impl PartialOrd for AStarNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AStarNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior in BinaryHeap
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}
