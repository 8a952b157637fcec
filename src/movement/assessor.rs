//! # Avoidance Policy
//!
//! A mobile's passability predicate, closed over an avoidance profile and a
//! movement mode. Profiles are plain data so any mobile can ask for any of
//! them.

use crate::utils::Passability;
use crate::{Cell, Mobile, MobileId, MovementMode, Region, Relation, Side};
use serde::{Deserialize, Serialize};

/// What to steer around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvoidanceProfile {
    /// Any other mobile.
    pub actors: bool,
    /// Cells held by enemies.
    pub hazards: bool,
    /// Features, judged by their own passability.
    pub obstacles: bool,
}

impl AvoidanceProfile {
    /// Default for routing toward arbitrary goals.
    pub const EVERYTHING: Self = Self {
        actors: true,
        hazards: true,
        obstacles: true,
    };

    /// Measures whether a teammate can reach a cell, ignoring friendly and
    /// neutral clutter.
    pub const HAZARDS: Self = Self {
        actors: false,
        hazards: true,
        obstacles: true,
    };

    /// Raw terrain only; used for placement searches.
    pub const TERRAIN_ONLY: Self = Self {
        actors: false,
        hazards: false,
        obstacles: false,
    };
}

/// A passability predicate bound to a region.
#[derive(Debug, Clone, Copy)]
pub struct Assessor<'a> {
    region: &'a Region,
    profile: AvoidanceProfile,
    mode: MovementMode,
    side: Side,
    mover: Option<MobileId>,
}

impl<'a> Assessor<'a> {
    pub fn new(region: &'a Region, profile: AvoidanceProfile, mode: MovementMode, side: Side) -> Self {
        Self {
            region,
            profile,
            mode,
            side,
            mover: None,
        }
    }

    /// The assessor a mobile uses with the given profile. The mobile never
    /// blocks itself.
    pub fn for_mobile(region: &'a Region, mobile: &Mobile, profile: AvoidanceProfile) -> Self {
        Self {
            region,
            profile,
            mode: mobile.movement,
            side: mobile.side,
            mover: Some(mobile.id),
        }
    }

    /// The mobile's default: avoid everything.
    pub fn default_for(region: &'a Region, mobile: &Mobile) -> Self {
        Self::for_mobile(region, mobile, AvoidanceProfile::EVERYTHING)
    }

    pub fn region(&self) -> &'a Region {
        self.region
    }

    pub fn profile(&self) -> AvoidanceProfile {
        self.profile
    }
}

impl Passability for Assessor<'_> {
    fn in_bounds(&self, cell: Cell) -> bool {
        self.region.in_bounds(cell)
    }

    fn is_passable(&self, cell: Cell) -> bool {
        let occupant = self
            .region
            .mobile_at(cell)
            .filter(|m| Some(m.id) != self.mover);

        if let Some(occupant) = occupant {
            if self.profile.actors {
                return false;
            }
            if self.profile.hazards && self.side.relation(occupant.side) == Relation::Enemy {
                return false;
            }
        }

        if self.profile.obstacles {
            if let Some(feature) = self.region.feature_at(cell) {
                return feature.passable_for(self.mode);
            }
        }

        self.region
            .grid
            .get(cell)
            .map(|terrain| terrain.passable_for(self.mode))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::BehaviorTable;
    use crate::{CombatStats, Feature, Terrain, TerrainGrid, Weapon};

    fn stats() -> CombatStats {
        CombatStats::new(5, 0, 40, Weapon::fists())
    }

    fn setup() -> (Region, MobileId) {
        let mut region = Region::new("test", TerrainGrid::filled(5, 5, Terrain::floor()));
        let hero = region.add_mobile(Mobile::hero("Aria", Cell::new(0, 0), stats())).unwrap();
        (region, hero)
    }

    #[test]
    fn test_hostile_cell_rejected_by_hazards_accepted_by_terrain_only() {
        let (mut region, hero) = setup();
        let goblin = BehaviorTable::default().get("goblin").unwrap();
        region
            .add_mobile(Mobile::monster("goblin", "goblin", Cell::new(1, 1), stats(), goblin))
            .unwrap();

        let mover = region.mobile(hero).unwrap().clone();
        let hazards = Assessor::for_mobile(&region, &mover, AvoidanceProfile::HAZARDS);
        let terrain = Assessor::for_mobile(&region, &mover, AvoidanceProfile::TERRAIN_ONLY);
        assert!(!hazards.is_passable(Cell::new(1, 1)));
        assert!(terrain.is_passable(Cell::new(1, 1)));
    }

    #[test]
    fn test_neutral_cell_accepted_by_hazards_rejected_by_everything() {
        let (mut region, hero) = setup();
        region
            .add_mobile(Mobile::neutral("Miller", Cell::new(2, 2), stats(), true))
            .unwrap();

        let mover = region.mobile(hero).unwrap().clone();
        assert!(Assessor::for_mobile(&region, &mover, AvoidanceProfile::HAZARDS).is_passable(Cell::new(2, 2)));
        assert!(!Assessor::default_for(&region, &mover).is_passable(Cell::new(2, 2)));
    }

    #[test]
    fn test_features_defer_to_their_own_passability() {
        let (mut region, hero) = setup();
        region.place_feature(Cell::new(3, 3), Feature::door()).unwrap();
        region.place_feature(Cell::new(3, 4), Feature::fountain(3)).unwrap();
        region.grid.set(Cell::new(4, 4), Terrain::water()).unwrap();

        let walker = region.mobile(hero).unwrap().clone();
        let flier = walker.clone().with_movement(MovementMode::Aerial);

        let walk = Assessor::default_for(&region, &walker);
        assert!(!walk.is_passable(Cell::new(3, 3)));
        assert!(!walk.is_passable(Cell::new(3, 4)));
        assert!(!walk.is_passable(Cell::new(4, 4)));

        let fly = Assessor::default_for(&region, &flier);
        assert!(fly.is_passable(Cell::new(3, 4)));
        assert!(fly.is_passable(Cell::new(4, 4)));

        let terrain = Assessor::for_mobile(&region, &walker, AvoidanceProfile::TERRAIN_ONLY);
        assert!(terrain.is_passable(Cell::new(3, 3)));
    }

    #[test]
    fn test_mover_never_blocks_itself() {
        let (region, hero) = setup();
        let mover = region.mobile(hero).unwrap().clone();
        assert!(Assessor::default_for(&region, &mover).is_passable(Cell::new(0, 0)));
    }
}
