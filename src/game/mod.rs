//! # Game Module
//!
//! Core world representation: cells, terrain, features, mobiles, regions and
//! the simulation that drives them.
//!
//! This module contains the fundamental building blocks of Warband:
//! - Grid coordinates and distance metrics
//! - Terrain grids and static features
//! - Mobiles (party members, monsters and neutral actors)
//! - The effect script handed to the external animator
//! - The turn scheduler and mode state machine

pub mod effects;
pub mod entities;
pub mod feature;
pub mod region;
pub mod state;
pub mod terrain;
pub mod turns;

pub use effects::*;
pub use entities::*;
pub use feature::*;
pub use region::*;
pub use state::*;
pub use terrain::*;
pub use turns::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A grid coordinate, addressed as (row, col).
///
/// # Examples
///
/// ```
/// use warband::Cell;
///
/// let cell = Cell::new(2, 7);
/// assert_eq!(cell.row, 2);
/// assert_eq!(cell.col, 7);
///
/// let neighbors = cell.neighbors();
/// assert_eq!(neighbors.len(), 8); // All 8 surrounding cells
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    /// Creates a new cell at the given row and column.
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Calculates the Euclidean ("cartesian") distance to another cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::Cell;
    ///
    /// assert_eq!(Cell::new(0, 0).cartesian_distance(Cell::new(3, 4)), 5.0);
    /// ```
    pub fn cartesian_distance(self, other: Cell) -> f64 {
        let dr = (self.row - other.row) as f64;
        let dc = (self.col - other.col) as f64;
        (dr * dr + dc * dc).sqrt()
    }

    /// Calculates the Chebyshev ("diagonal") distance to another cell: the
    /// number of king-moves between them. All range checks use this metric.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::Cell;
    ///
    /// assert_eq!(Cell::new(0, 0).diagonal_distance(Cell::new(3, 4)), 4);
    /// ```
    pub fn diagonal_distance(self, other: Cell) -> u32 {
        let dr = (self.row - other.row).unsigned_abs();
        let dc = (self.col - other.col).unsigned_abs();
        dr.max(dc)
    }

    /// Returns true if the other cell is one king-move away.
    pub fn is_adjacent(self, other: Cell) -> bool {
        self != other && self.diagonal_distance(other) == 1
    }

    /// Returns the cell one step away in the given direction.
    pub fn step(self, direction: Direction) -> Cell {
        self + direction.to_delta()
    }

    /// Returns all 8 neighboring cells, in `Direction::all()` order.
    ///
    /// Bounds are not checked here; callers clip against their grid.
    pub fn neighbors(self) -> Vec<Cell> {
        Direction::all().into_iter().map(|d| self.step(d)).collect()
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl std::ops::Add for Cell {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.row + other.row, self.col + other.col)
    }
}

impl std::ops::Sub for Cell {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.row - other.row, self.col - other.col)
    }
}

/// The eight king-move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Direction {
    /// Converts a direction to a (row, col) delta.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::{Cell, Direction};
    ///
    /// assert_eq!(Direction::North.to_delta(), Cell::new(-1, 0));
    /// ```
    pub fn to_delta(self) -> Cell {
        match self {
            Direction::North => Cell::new(-1, 0),
            Direction::South => Cell::new(1, 0),
            Direction::East => Cell::new(0, 1),
            Direction::West => Cell::new(0, -1),
            Direction::Northeast => Cell::new(-1, 1),
            Direction::Northwest => Cell::new(-1, -1),
            Direction::Southeast => Cell::new(1, 1),
            Direction::Southwest => Cell::new(1, -1),
        }
    }

    /// Converts a delta to a direction.
    ///
    /// Returns None if the delta isn't a single king-move.
    pub fn from_delta(delta: Cell) -> Option<Direction> {
        match (delta.row, delta.col) {
            (-1, 0) => Some(Direction::North),
            (1, 0) => Some(Direction::South),
            (0, 1) => Some(Direction::East),
            (0, -1) => Some(Direction::West),
            (-1, 1) => Some(Direction::Northeast),
            (-1, -1) => Some(Direction::Northwest),
            (1, 1) => Some(Direction::Southeast),
            (1, -1) => Some(Direction::Southwest),
            _ => None,
        }
    }

    /// Returns all 8 directions, cardinals first.
    pub fn all() -> [Direction; 8] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
            Direction::Northeast,
            Direction::Northwest,
            Direction::Southeast,
            Direction::Southwest,
        ]
    }
}

/// Unique identifier for mobiles.
pub type MobileId = Uuid;

/// Creates a new unique mobile ID.
pub fn new_mobile_id() -> MobileId {
    Uuid::new_v4()
}
