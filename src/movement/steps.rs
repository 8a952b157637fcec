//! # Movement Primitives
//!
//! Single-step heuristics and the composite routines built from them.
//!
//! Step primitives only look at the board and return a destination. The
//! composites spend the mobile's movement points, move it, and record every
//! step in the script.

use crate::feature::trigger_step;
use crate::utils::{find_route, neighbors_of, percent_chance};
use crate::{Assessor, Cell, MobileId, Region, Script};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a mobile closes with its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Approach {
    /// Follow the A* route.
    Smart,
    /// Greedy steps; can get stuck behind concave obstacles.
    Naive,
    /// A smart step with `focus`% chance, otherwise a random one.
    Erratic { focus: u32 },
}

/// A uniformly random passable neighbor.
pub fn step_randomly<R: Rng>(assessor: &Assessor, here: Cell, rng: &mut R) -> Option<Cell> {
    neighbors_of(here, None, assessor).choose(rng).copied()
}

/// The neighbor (or the adjacent goal) closest to `goal`. Only steps that
/// get strictly closer are taken.
pub fn step_naively(assessor: &Assessor, here: Cell, goal: Cell) -> Option<Cell> {
    let current = here.cartesian_distance(goal);
    neighbors_of(here, Some(goal), assessor)
        .into_iter()
        .map(|cell| (cell, cell.cartesian_distance(goal)))
        .filter(|&(_, distance)| distance < current)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(cell, _)| cell)
}

/// The first cell of the A* route to `goal`.
pub fn step_smartly(assessor: &Assessor, here: Cell, goal: Cell) -> Option<Cell> {
    find_route(here, goal, assessor).and_then(|route| route.first().copied())
}

/// The neighbor farthest from `threat`. Only steps that get strictly farther
/// are taken; the first of equally good neighbors wins.
pub fn step_away_naively(assessor: &Assessor, here: Cell, threat: Cell) -> Option<Cell> {
    let mut best: Option<(Cell, f64)> = None;
    let mut best_distance = here.cartesian_distance(threat);
    for cell in neighbors_of(here, None, assessor) {
        let distance = cell.cartesian_distance(threat);
        if distance > best_distance {
            best_distance = distance;
            best = Some((cell, distance));
        }
    }
    best.map(|(cell, _)| cell)
}

/// Moves a mobile one cell, spending a movement point and firing the on-step
/// effect of any feature there. Refuses to enter a cell held by another
/// living mobile or to move without points.
pub fn take_step(region: &mut Region, id: MobileId, to: Cell, script: &mut Script) -> bool {
    if region.mobile_at(to).map(|m| m.id != id).unwrap_or(false) {
        return false;
    }
    let Some(mobile) = region.mobile_mut(id) else {
        return false;
    };
    if mobile.movement_points == 0 || !mobile.is_alive() {
        return false;
    }
    mobile.movement_points -= 1;

    if region.relocate(id, to, script).is_err() {
        return false;
    }
    trigger_step(region, id, to, script);
    true
}

/// Forfeits a single movement point without moving.
fn idle_point(region: &mut Region, id: MobileId) {
    if let Some(mobile) = region.mobile_mut(id) {
        mobile.movement_points = mobile.movement_points.saturating_sub(1);
    }
}

/// The closest living, visible enemy of `id` by diagonal distance. With
/// `require_sight`, only enemies in line of sight count. Ties go to the
/// earlier mobile in region order.
pub fn nearest_enemy(region: &Region, id: MobileId, require_sight: bool) -> Option<(MobileId, Cell)> {
    let me = region.mobile(id)?;
    region
        .mobiles()
        .filter(|m| m.is_alive() && m.visible && me.is_enemy_of(m))
        .filter(|m| !require_sight || region.in_line_of_sight(me.cell, m.cell))
        .min_by_key(|m| me.cell.diagonal_distance(m.cell))
        .map(|m| (m.id, m.cell))
}

/// Whether `id` has an enemy within weapon range and in sight.
pub fn enemy_in_reach(region: &Region, id: MobileId, range: u32) -> Option<MobileId> {
    let me = region.mobile(id)?;
    region
        .mobiles()
        .filter(|m| m.is_alive() && m.visible && me.is_enemy_of(m))
        .filter(|m| me.cell.diagonal_distance(m.cell) <= range)
        .filter(|m| region.in_line_of_sight(me.cell, m.cell))
        .min_by_key(|m| me.cell.diagonal_distance(m.cell))
        .map(|m| m.id)
}

/// Steps toward the nearest enemy until one is within `reach` and in sight,
/// points run out, the mover dies, or no step exists. Returns true if an
/// enemy ends up within reach.
pub fn close_with_enemy<R: Rng>(
    region: &mut Region,
    id: MobileId,
    reach: u32,
    approach: Approach,
    rng: &mut R,
    script: &mut Script,
) -> bool {
    loop {
        let Some(mobile) = region.mobile(id) else {
            return false;
        };
        if !mobile.is_alive() {
            return false;
        }
        if enemy_in_reach(region, id, reach).is_some() {
            return true;
        }
        if mobile.movement_points == 0 {
            return false;
        }
        let Some((_, target)) = nearest_enemy(region, id, false) else {
            return false;
        };

        let dest = {
            let assessor = Assessor::default_for(region, mobile);
            let here = mobile.cell;
            match approach {
                Approach::Smart => step_smartly(&assessor, here, target),
                Approach::Naive => step_naively(&assessor, here, target),
                Approach::Erratic { focus } => {
                    if percent_chance(rng, focus) {
                        step_smartly(&assessor, here, target)
                    } else {
                        step_randomly(&assessor, here, rng)
                    }
                }
            }
        };

        let Some(dest) = dest else {
            return false;
        };
        if !take_step(region, id, dest, script) {
            return false;
        }
    }
}

/// Flees from `threat` until points run out or no step improves the
/// distance. Returns the number of steps taken.
pub fn run_away_naively(region: &mut Region, id: MobileId, threat: Cell, script: &mut Script) -> u32 {
    let mut steps = 0;
    loop {
        let dest = {
            let Some(mobile) = region.mobile(id) else {
                return steps;
            };
            if mobile.movement_points == 0 {
                return steps;
            }
            step_away_naively(&Assessor::default_for(region, mobile), mobile.cell, threat)
        };
        match dest {
            Some(dest) if take_step(region, id, dest, script) => steps += 1,
            _ => return steps,
        }
    }
}

/// Spends every movement point, each one on a random step with
/// `restlessness`% chance.
pub fn wander<R: Rng>(
    region: &mut Region,
    id: MobileId,
    restlessness: u32,
    rng: &mut R,
    script: &mut Script,
) {
    loop {
        let dest = {
            let Some(mobile) = region.mobile(id) else {
                return;
            };
            if mobile.movement_points == 0 {
                return;
            }
            if percent_chance(rng, restlessness) {
                step_randomly(&Assessor::default_for(region, mobile), mobile.cell, rng)
            } else {
                None
            }
        };
        match dest {
            Some(dest) if take_step(region, id, dest, script) => {}
            _ => idle_point(region, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::BehaviorTable;
    use crate::{CombatStats, Effect, Feature, Mobile, TerrainGrid, Weapon};
    use rand::{rngs::StdRng, SeedableRng};

    fn stats() -> CombatStats {
        CombatStats::new(8, 0, 40, Weapon::fists())
    }

    fn region(lines: &[&str]) -> Region {
        Region::new("test", TerrainGrid::from_ascii(lines).unwrap())
    }

    #[test]
    fn test_step_naively_dead_ends_in_concave_pocket() {
        // The walker sits inside a pocket that opens away from the goal.
        let region = {
            let mut r = region(&[
                ".......",
                ".#####.",
                ".#...#.",
                ".......",
            ]);
            r.add_mobile(Mobile::hero("A", Cell::new(2, 3), stats())).unwrap();
            r
        };
        let mover = region.mobiles().next().unwrap().clone();
        let assessor = Assessor::default_for(&region, &mover);
        assert_eq!(step_naively(&assessor, Cell::new(2, 3), Cell::new(0, 3)), None);
        assert!(step_smartly(&assessor, Cell::new(2, 3), Cell::new(0, 3)).is_some());
    }

    #[test]
    fn test_step_naively_takes_adjacent_goal() {
        let mut r = region(&["...", "...", "..."]);
        let id = r.add_mobile(Mobile::hero("A", Cell::new(1, 1), stats())).unwrap();
        let mover = r.mobile(id).unwrap().clone();
        let assessor = Assessor::default_for(&r, &mover);
        assert_eq!(step_naively(&assessor, Cell::new(1, 1), Cell::new(2, 2)), Some(Cell::new(2, 2)));
    }

    #[test]
    fn test_step_away_increases_distance() {
        let mut r = region(&[".....", ".....", "....."]);
        let id = r.add_mobile(Mobile::hero("A", Cell::new(1, 2), stats())).unwrap();
        let mover = r.mobile(id).unwrap().clone();
        let assessor = Assessor::default_for(&r, &mover);
        let threat = Cell::new(1, 0);
        let dest = step_away_naively(&assessor, Cell::new(1, 2), threat).unwrap();
        assert!(dest.cartesian_distance(threat) > Cell::new(1, 2).cartesian_distance(threat));
    }

    #[test]
    fn test_run_away_stops_when_cornered() {
        let mut r = region(&["....."]);
        let id = r
            .add_mobile(Mobile::hero("A", Cell::new(0, 2), stats()).with_movement_points(5))
            .unwrap();
        r.mobile_mut(id).unwrap().movement_points = 5;
        let mut script = Script::new();
        let steps = run_away_naively(&mut r, id, Cell::new(0, 0), &mut script);
        assert_eq!(steps, 2);
        assert_eq!(r.mobile(id).unwrap().cell, Cell::new(0, 4));
        assert_eq!(r.mobile(id).unwrap().movement_points, 3);
    }

    #[test]
    fn test_take_step_refuses_occupied_cell() {
        let mut r = region(&["..."]);
        let a = r.add_mobile(Mobile::hero("A", Cell::new(0, 0), stats())).unwrap();
        r.add_mobile(Mobile::hero("B", Cell::new(0, 1), stats())).unwrap();
        r.mobile_mut(a).unwrap().movement_points = 3;
        let mut script = Script::new();
        assert!(!take_step(&mut r, a, Cell::new(0, 1), &mut script));
        assert!(script.is_empty());
    }

    #[test]
    fn test_step_onto_trap_springs_it() {
        let mut r = region(&["..."]);
        r.place_feature(Cell::new(0, 1), Feature::trap(3)).unwrap();
        let a = r.add_mobile(Mobile::hero("A", Cell::new(0, 0), stats())).unwrap();
        r.mobile_mut(a).unwrap().movement_points = 1;
        let mut script = Script::new();
        assert!(take_step(&mut r, a, Cell::new(0, 1), &mut script));
        assert_eq!(r.mobile(a).unwrap().stats.hit_points, 5);
        assert!(script.effects().contains(&Effect::ToggleFeature {
            cell: Cell::new(0, 1),
            open: true
        }));
    }

    #[test]
    fn test_close_with_enemy_smart_reaches_melee() {
        let mut r = region(&[
            ".......",
            "...#...",
            "...#...",
            ".......",
        ]);
        let hero = r
            .add_mobile(Mobile::hero("A", Cell::new(1, 0), stats()).with_movement_points(10))
            .unwrap();
        let goblin = BehaviorTable::default().get("goblin").unwrap();
        r.add_mobile(Mobile::monster("g", "goblin", Cell::new(1, 6), stats(), goblin))
            .unwrap();
        r.mobile_mut(hero).unwrap().movement_points = 10;

        let mut rng = StdRng::seed_from_u64(3);
        let mut script = Script::new();
        assert!(close_with_enemy(&mut r, hero, 1, Approach::Smart, &mut rng, &mut script));
        assert!(r.mobile(hero).unwrap().cell.is_adjacent(Cell::new(1, 6)));
    }

    #[test]
    fn test_wander_spends_all_points() {
        let mut r = region(&[".....", ".....", "....."]);
        let a = r.add_mobile(Mobile::hero("A", Cell::new(1, 2), stats())).unwrap();
        r.mobile_mut(a).unwrap().movement_points = 4;
        let mut rng = StdRng::seed_from_u64(11);
        let mut script = Script::new();
        wander(&mut r, a, 50, &mut rng, &mut script);
        assert_eq!(r.mobile(a).unwrap().movement_points, 0);
        assert!(script.len() <= 4);
    }

    #[test]
    fn test_wander_without_restlessness_stays_put() {
        let mut r = region(&["...", "...", "..."]);
        let a = r.add_mobile(Mobile::hero("A", Cell::new(1, 1), stats())).unwrap();
        r.mobile_mut(a).unwrap().movement_points = 3;
        let mut rng = StdRng::seed_from_u64(5);
        let mut script = Script::new();
        wander(&mut r, a, 0, &mut rng, &mut script);
        assert_eq!(r.mobile(a).unwrap().cell, Cell::new(1, 1));
        assert!(script.is_empty());
    }

    #[test]
    fn test_nearest_enemy_respects_sight() {
        let mut r = region(&[".#...", ".....", "....."]);
        let hero = r.add_mobile(Mobile::hero("A", Cell::new(0, 0), stats())).unwrap();
        let goblin = BehaviorTable::default().get("goblin").unwrap();
        let hidden = r
            .add_mobile(Mobile::monster("g1", "goblin", Cell::new(0, 2), stats(), goblin.clone()))
            .unwrap();
        let seen = r
            .add_mobile(Mobile::monster("g2", "goblin", Cell::new(2, 3), stats(), goblin))
            .unwrap();
        assert_eq!(nearest_enemy(&r, hero, false).map(|e| e.0), Some(hidden));
        assert_eq!(nearest_enemy(&r, hero, true).map(|e| e.0), Some(seen));
    }
}
