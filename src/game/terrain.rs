//! # Terrain
//!
//! Terrain descriptors and the fixed-size grid that holds them.

use crate::{Cell, WarbandError, WarbandResult};
use serde::{Deserialize, Serialize};

/// How a mobile gets around. Aerial movers cross water and chasms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementMode {
    Ground,
    Aerial,
}

/// Broad terrain categories, used for narration and display lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainKind {
    Floor,
    Wall,
    Water,
    Chasm,
    Pillar,
}

/// A single terrain descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    pub kind: TerrainKind,
    pub opaque: bool,
    pub walkable: bool,
    pub flyable: bool,
}

impl Terrain {
    pub fn floor() -> Self {
        Self {
            kind: TerrainKind::Floor,
            opaque: false,
            walkable: true,
            flyable: true,
        }
    }

    pub fn wall() -> Self {
        Self {
            kind: TerrainKind::Wall,
            opaque: true,
            walkable: false,
            flyable: false,
        }
    }

    pub fn water() -> Self {
        Self {
            kind: TerrainKind::Water,
            opaque: false,
            walkable: false,
            flyable: true,
        }
    }

    pub fn chasm() -> Self {
        Self {
            kind: TerrainKind::Chasm,
            opaque: false,
            walkable: false,
            flyable: true,
        }
    }

    /// A pillar blocks movement but not sight.
    pub fn pillar() -> Self {
        Self {
            kind: TerrainKind::Pillar,
            opaque: false,
            walkable: false,
            flyable: false,
        }
    }

    /// Whether a mobile with the given movement mode may stand here.
    pub fn passable_for(&self, mode: MovementMode) -> bool {
        match mode {
            MovementMode::Ground => self.walkable,
            MovementMode::Aerial => self.flyable,
        }
    }
}

/// A rectangular terrain grid. Its size is fixed at construction; cell
/// contents may change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainGrid {
    rows: i32,
    cols: i32,
    cells: Vec<Terrain>,
}

impl TerrainGrid {
    /// Creates a grid filled with the given terrain.
    pub fn filled(rows: i32, cols: i32, terrain: Terrain) -> Self {
        let count = (rows.max(0) * cols.max(0)) as usize;
        Self {
            rows: rows.max(0),
            cols: cols.max(0),
            cells: vec![terrain; count],
        }
    }

    /// Builds a grid from ASCII rows: `#` wall, `~` water, `:` chasm,
    /// `O` pillar, anything else floor.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::{Cell, TerrainGrid};
    ///
    /// let grid = TerrainGrid::from_ascii(&["###", "#.#", "###"]).unwrap();
    /// assert_eq!(grid.rows(), 3);
    /// assert!(grid.get(Cell::new(1, 1)).unwrap().walkable);
    /// ```
    pub fn from_ascii(lines: &[&str]) -> WarbandResult<Self> {
        let rows = lines.len() as i32;
        let cols = lines.first().map(|l| l.chars().count()).unwrap_or(0) as i32;
        let mut cells = Vec::with_capacity((rows * cols) as usize);

        for (row, line) in lines.iter().enumerate() {
            if line.chars().count() as i32 != cols {
                return Err(WarbandError::InvalidMap(format!(
                    "row {} has {} columns, expected {}",
                    row,
                    line.chars().count(),
                    cols
                )));
            }
            cells.extend(line.chars().map(|c| match c {
                '#' => Terrain::wall(),
                '~' => Terrain::water(),
                ':' => Terrain::chasm(),
                'O' => Terrain::pillar(),
                _ => Terrain::floor(),
            }));
        }

        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    /// Checks whether a cell lies inside the grid.
    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0 && cell.col >= 0 && cell.row < self.rows && cell.col < self.cols
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if self.in_bounds(cell) {
            Some((cell.row * self.cols + cell.col) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, cell: Cell) -> Option<&Terrain> {
        self.index(cell).map(|i| &self.cells[i])
    }

    /// Replaces the terrain at a cell.
    pub fn set(&mut self, cell: Cell, terrain: Terrain) -> WarbandResult<()> {
        let index = self
            .index(cell)
            .ok_or_else(|| WarbandError::InvalidMap(format!("cell {} is out of bounds", cell)))?;
        self.cells[index] = terrain;
        Ok(())
    }

    /// Iterates every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Cell::new(row, col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_passability_by_mode() {
        assert!(Terrain::floor().passable_for(MovementMode::Ground));
        assert!(!Terrain::water().passable_for(MovementMode::Ground));
        assert!(Terrain::water().passable_for(MovementMode::Aerial));
        assert!(!Terrain::wall().passable_for(MovementMode::Aerial));
        assert!(!Terrain::pillar().opaque);
    }

    #[test]
    fn test_grid_bounds() {
        let grid = TerrainGrid::filled(4, 6, Terrain::floor());
        assert!(grid.in_bounds(Cell::new(0, 0)));
        assert!(grid.in_bounds(Cell::new(3, 5)));
        assert!(!grid.in_bounds(Cell::new(4, 0)));
        assert!(!grid.in_bounds(Cell::new(0, -1)));
        assert!(grid.get(Cell::new(-1, 2)).is_none());
        assert_eq!(grid.cells().count(), 24);
    }

    #[test]
    fn test_grid_set_out_of_bounds_fails() {
        let mut grid = TerrainGrid::filled(2, 2, Terrain::floor());
        assert!(grid.set(Cell::new(1, 1), Terrain::wall()).is_ok());
        assert_eq!(grid.get(Cell::new(1, 1)).unwrap().kind, TerrainKind::Wall);
        assert!(grid.set(Cell::new(2, 1), Terrain::wall()).is_err());
    }

    #[test]
    fn test_from_ascii_rejects_ragged_rows() {
        assert!(TerrainGrid::from_ascii(&["###", "##"]).is_err());
        let grid = TerrainGrid::from_ascii(&["#~:O."]).unwrap();
        assert_eq!(grid.get(Cell::new(0, 1)).unwrap().kind, TerrainKind::Water);
        assert_eq!(grid.get(Cell::new(0, 2)).unwrap().kind, TerrainKind::Chasm);
        assert_eq!(grid.get(Cell::new(0, 4)).unwrap().kind, TerrainKind::Floor);
    }
}
