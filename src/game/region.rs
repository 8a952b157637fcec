//! # Region
//!
//! A region owns the terrain grid, the feature index, the ordered mobile list
//! and the "seen" bitmap. It is the single source of truth for what occupies
//! a cell and whether one cell can see another.

use crate::utils::rasterize_line;
use crate::{Cell, Feature, Mobile, MobileId, Script, Effect, TerrainGrid, WarbandError, WarbandResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A loaded map and everything standing on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub grid: TerrainGrid,
    features: HashMap<Cell, Feature>,
    /// Insertion order is the region iteration order.
    mobiles: Vec<Mobile>,
    seen: Vec<bool>,
}

impl Region {
    /// Creates an empty region over the given grid.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::{Region, Terrain, TerrainGrid};
    ///
    /// let region = Region::new("cellar", TerrainGrid::filled(5, 5, Terrain::floor()));
    /// assert_eq!(region.mobiles().count(), 0);
    /// ```
    pub fn new(name: impl Into<String>, grid: TerrainGrid) -> Self {
        let seen = vec![false; (grid.rows() * grid.cols()) as usize];
        Self {
            name: name.into(),
            grid,
            features: HashMap::new(),
            mobiles: Vec::new(),
            seen,
        }
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        self.grid.in_bounds(cell)
    }

    /// Places a feature, replacing any previous one at the cell.
    pub fn place_feature(&mut self, cell: Cell, feature: Feature) -> WarbandResult<()> {
        if !self.in_bounds(cell) {
            return Err(WarbandError::InvalidMap(format!(
                "feature placed out of bounds at {}",
                cell
            )));
        }
        self.features.insert(cell, feature);
        Ok(())
    }

    pub fn feature_at(&self, cell: Cell) -> Option<&Feature> {
        self.features.get(&cell)
    }

    pub fn feature_at_mut(&mut self, cell: Cell) -> Option<&mut Feature> {
        self.features.get_mut(&cell)
    }

    /// Adds a mobile at the end of the iteration order.
    pub fn add_mobile(&mut self, mobile: Mobile) -> WarbandResult<MobileId> {
        if !self.in_bounds(mobile.cell) {
            return Err(WarbandError::InvalidMap(format!(
                "{} placed out of bounds at {}",
                mobile.name, mobile.cell
            )));
        }
        let id = mobile.id;
        self.mobiles.push(mobile);
        Ok(id)
    }

    /// Removes a mobile, returning it if present.
    pub fn remove_mobile(&mut self, id: MobileId) -> Option<Mobile> {
        let index = self.mobiles.iter().position(|m| m.id == id)?;
        Some(self.mobiles.remove(index))
    }

    pub fn mobile(&self, id: MobileId) -> Option<&Mobile> {
        self.mobiles.iter().find(|m| m.id == id)
    }

    pub fn mobile_mut(&mut self, id: MobileId) -> Option<&mut Mobile> {
        self.mobiles.iter_mut().find(|m| m.id == id)
    }

    /// Like [`Region::mobile`], but a missing id is an error.
    pub fn expect_mobile(&self, id: MobileId) -> WarbandResult<&Mobile> {
        self.mobile(id).ok_or(WarbandError::UnknownMobile(id))
    }

    /// All mobiles in region iteration order, dead or alive.
    pub fn mobiles(&self) -> impl Iterator<Item = &Mobile> {
        self.mobiles.iter()
    }

    pub fn mobiles_mut(&mut self) -> impl Iterator<Item = &mut Mobile> {
        self.mobiles.iter_mut()
    }

    /// The living, visible mobile standing on a cell.
    ///
    /// Hidden party members riding along with the leader are not occupants.
    pub fn mobile_at(&self, cell: Cell) -> Option<&Mobile> {
        self.mobiles
            .iter()
            .find(|m| m.cell == cell && m.visible && m.is_alive())
    }

    /// Moves a mobile and records the move. Features are not triggered here.
    pub fn relocate(&mut self, id: MobileId, to: Cell, script: &mut Script) -> WarbandResult<()> {
        let mobile = self.mobile_mut(id).ok_or(WarbandError::UnknownMobile(id))?;
        let from = mobile.cell;
        mobile.cell = to;
        if mobile.visible {
            script.push(Effect::Move { mobile: id, from, to });
        }
        Ok(())
    }

    /// Removes every dead mobile, returning their ids in iteration order.
    pub fn purge_dead(&mut self) -> Vec<MobileId> {
        let dead: Vec<MobileId> = self
            .mobiles
            .iter()
            .filter(|m| !m.is_alive())
            .map(|m| m.id)
            .collect();
        self.mobiles.retain(|m| m.is_alive());
        dead
    }

    /// Whether terrain or a feature at the cell blocks sight. Out-of-bounds
    /// cells are opaque.
    pub fn is_opaque(&self, cell: Cell) -> bool {
        let terrain_opaque = self.grid.get(cell).map(|t| t.opaque).unwrap_or(true);
        terrain_opaque || self.feature_at(cell).map(|f| f.opaque).unwrap_or(false)
    }

    /// True iff no cell strictly between `a` and `b` on the rasterized line is
    /// opaque. The target cell itself may be opaque and still be seen.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::{Cell, Region, TerrainGrid};
    ///
    /// let grid = TerrainGrid::from_ascii(&[".....", "..#..", "....."]).unwrap();
    /// let region = Region::new("hall", grid);
    /// assert!(!region.in_line_of_sight(Cell::new(1, 0), Cell::new(1, 4)));
    /// assert!(region.in_line_of_sight(Cell::new(0, 0), Cell::new(0, 4)));
    /// ```
    pub fn in_line_of_sight(&self, a: Cell, b: Cell) -> bool {
        let line = rasterize_line(a, b);
        line.iter()
            .take(line.len().saturating_sub(1))
            .all(|&cell| !self.is_opaque(cell))
    }

    /// Marks every cell within `radius` of `from` that is in line of sight as seen.
    pub fn reveal_from(&mut self, from: Cell, radius: u32) {
        let r = radius as i32;
        for row in from.row - r..=from.row + r {
            for col in from.col - r..=from.col + r {
                let cell = Cell::new(row, col);
                if !self.in_bounds(cell) || !self.in_line_of_sight(from, cell) {
                    continue;
                }
                let index = (cell.row * self.grid.cols() + cell.col) as usize;
                self.seen[index] = true;
            }
        }
    }

    /// Whether the party has ever laid eyes on the cell.
    pub fn is_seen(&self, cell: Cell) -> bool {
        if !self.in_bounds(cell) {
            return false;
        }
        self.seen[(cell.row * self.grid.cols() + cell.col) as usize]
    }
}
