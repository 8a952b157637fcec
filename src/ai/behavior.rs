//! # Behavior
//!
//! A [`Behavior`] pairs a [`Strategy`] with the [`BehaviorProfile`] of
//! numbers that tune it. Running a behavior first settles the monster's
//! posture and then acts on it.

use crate::ai::{broadcast_alert, AlertRule, Posture};
use crate::combat::Engagement;
use crate::movement::{close_with_enemy, enemy_in_reach, nearest_enemy, run_away_naively, wander, Approach};
use crate::utils::percent_chance;
use crate::{MobileId, Region, Script, WarbandResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The closed set of monster strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Sleeps, wanders, and hunts whatever it notices.
    Prowler,
    /// A prowler that runs once badly hurt.
    Coward,
    /// Holds its post until something comes close.
    Sentinel,
    /// Sits until alerted with an enemy in view.
    Idler,
}

impl Strategy {
    /// The posture a monster returns to when it gives up a chase.
    pub fn resting_posture(self) -> Posture {
        match self {
            Strategy::Prowler | Strategy::Coward => Posture::Wandering,
            Strategy::Sentinel => Posture::Guarding,
            Strategy::Idler => Posture::Sitting,
        }
    }
}

/// Tuning numbers shared by every monster of an archetype.
///
/// Ranges are Chebyshev distances; percentages are compared against a
/// uniform 1..=100 roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorProfile {
    pub alert_rule: AlertRule,
    /// Distance at which a visible enemy is noticed, and alerts are heard.
    pub notice_range: u32,
    /// Distance at which a visible enemy disturbs a sleeper or sitter.
    pub wakeup_range: u32,
    /// A chase is abandoned once no enemy is this close.
    pub chase_range: u32,
    /// Farthest the monster will strike from. Capped by its weapon's range.
    pub attack_range: u32,
    /// Chance per turn that a wandering monster dozes off.
    pub sleepiness: u32,
    /// Chance per movement point that a wanderer takes a step.
    pub restlessness: u32,
    pub approach: Approach,
    /// A coward flees below this share of its hit points.
    pub flee_below_percent: u32,
    pub initial_posture: Posture,
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self {
            alert_rule: AlertRule::SameSpecies,
            notice_range: 6,
            wakeup_range: 3,
            chase_range: 10,
            attack_range: 1,
            sleepiness: 0,
            restlessness: 50,
            approach: Approach::Smart,
            flee_below_percent: 0,
            initial_posture: Posture::Wandering,
        }
    }
}

/// An archetype's immutable decision-making: strategy plus profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub strategy: Strategy,
    #[serde(default)]
    pub profile: BehaviorProfile,
}

/// What a monster knows about its enemies at the start of its turn.
#[derive(Debug, Clone, Copy)]
struct Senses {
    /// Distance to the nearest enemy, seen or not.
    nearest: Option<u32>,
    /// Distance to the nearest enemy in line of sight.
    nearest_visible: Option<u32>,
    alerted: bool,
    health_percent: u32,
}

impl Senses {
    fn gather(region: &Region, id: MobileId) -> Option<Self> {
        let me = region.mobile(id)?;
        let distance = |cell: crate::Cell| me.cell.diagonal_distance(cell);
        Some(Self {
            nearest: nearest_enemy(region, id, false).map(|(_, cell)| distance(cell)),
            nearest_visible: nearest_enemy(region, id, true).map(|(_, cell)| distance(cell)),
            alerted: me.monster_state()?.alerted,
            health_percent: me.health_percent(),
        })
    }

    fn enemy_within(&self, range: u32) -> bool {
        self.nearest.map(|d| d <= range).unwrap_or(false)
    }

    fn visible_enemy_within(&self, range: u32) -> bool {
        self.nearest_visible.map(|d| d <= range).unwrap_or(false)
    }
}

impl Behavior {
    pub fn new(strategy: Strategy, profile: BehaviorProfile) -> Self {
        Self { strategy, profile }
    }

    /// The distance this monster closes to and strikes from when armed with a
    /// weapon of `weapon_range`.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::BehaviorTable;
    ///
    /// let archer = BehaviorTable::default().get("goblin_archer").unwrap();
    /// assert_eq!(archer.reach(5), 5);
    /// assert_eq!(archer.reach(1), 1);
    /// ```
    pub fn reach(&self, weapon_range: u32) -> u32 {
        self.profile.attack_range.min(weapon_range).max(1)
    }

    /// Runs one monster turn: settle the posture, act on it, then forfeit
    /// any unspent movement points.
    pub fn run<R: Rng>(
        &self,
        region: &mut Region,
        id: MobileId,
        now: u64,
        rng: &mut R,
        script: &mut Script,
    ) -> WarbandResult<()> {
        let Some(mobile) = region.mobile(id) else {
            return Err(crate::WarbandError::UnknownMobile(id));
        };
        if !mobile.is_alive() {
            return Ok(());
        }

        let posture = self.transition(region, id, rng, script);
        self.act(posture, region, id, now, rng, script)?;

        if let Some(mobile) = region.mobile_mut(id) {
            mobile.movement_points = 0;
        }
        Ok(())
    }

    /// Applies this strategy's transition rules and returns the new posture.
    pub fn transition<R: Rng>(
        &self,
        region: &mut Region,
        id: MobileId,
        rng: &mut R,
        script: &mut Script,
    ) -> Posture {
        let current = match region.mobile(id).and_then(|m| m.monster_state()) {
            Some(state) => state.posture,
            None => return Posture::Sitting,
        };
        let Some(senses) = Senses::gather(region, id) else {
            return current;
        };
        let p = &self.profile;
        let resting = self.strategy.resting_posture();

        let mut noticed = false;
        let mut give_up = false;
        let next = match current {
            Posture::Sleeping => {
                if senses.visible_enemy_within(p.wakeup_range) {
                    if senses.alerted {
                        Posture::Chasing
                    } else {
                        resting
                    }
                } else {
                    Posture::Sleeping
                }
            }
            Posture::Wandering | Posture::Guarding => {
                if senses.alerted && senses.enemy_within(p.chase_range) {
                    Posture::Chasing
                } else if senses.visible_enemy_within(p.notice_range) {
                    noticed = true;
                    Posture::Chasing
                } else if current == Posture::Wandering && percent_chance(rng, p.sleepiness) {
                    Posture::Sleeping
                } else {
                    current
                }
            }
            Posture::Sitting => {
                if senses.alerted && senses.visible_enemy_within(p.wakeup_range) {
                    Posture::Chasing
                } else {
                    Posture::Sitting
                }
            }
            Posture::Chasing => {
                if !senses.enemy_within(p.chase_range) {
                    give_up = true;
                    self.settle(rng)
                } else if self.strategy == Strategy::Coward && senses.health_percent < p.flee_below_percent {
                    Posture::RunningAway
                } else {
                    Posture::Chasing
                }
            }
            Posture::RunningAway => {
                if !senses.enemy_within(p.chase_range) {
                    give_up = true;
                    self.settle(rng)
                } else {
                    Posture::RunningAway
                }
            }
        };

        if let Some(state) = region.mobile_mut(id).and_then(|m| m.monster_state_mut()) {
            state.posture = next;
            if give_up {
                state.alerted = false;
            }
            if noticed {
                state.alerted = true;
            }
        }
        if noticed {
            broadcast_alert(region, id, script);
        }
        if next != current {
            log::debug!("{} goes from {:?} to {:?}", id, current, next);
        }
        next
    }

    /// The posture taken after giving up: the strategy's resting posture,
    /// except that wanderers may drop straight off to sleep.
    fn settle<R: Rng>(&self, rng: &mut R) -> Posture {
        let resting = self.strategy.resting_posture();
        if resting == Posture::Wandering && percent_chance(rng, self.profile.sleepiness) {
            Posture::Sleeping
        } else {
            resting
        }
    }

    fn act<R: Rng>(
        &self,
        posture: Posture,
        region: &mut Region,
        id: MobileId,
        now: u64,
        rng: &mut R,
        script: &mut Script,
    ) -> WarbandResult<()> {
        let Some(reach) = region
            .mobile(id)
            .filter(|m| m.is_alive())
            .map(|m| self.reach(m.stats.weapon.range))
        else {
            return Ok(());
        };

        match posture {
            Posture::Sleeping | Posture::Sitting | Posture::Guarding => return Ok(()),
            Posture::Wandering => {
                wander(region, id, self.profile.restlessness, rng, script);
                return Ok(());
            }
            Posture::Chasing => {
                close_with_enemy(region, id, reach, self.profile.approach, rng, script);
            }
            Posture::RunningAway => {
                if let Some((_, threat)) = nearest_enemy(region, id, false) {
                    run_away_naively(region, id, threat, script);
                }
            }
        }

        // A trap on the way may have killed it.
        if !region.mobile(id).map(|m| m.is_alive()).unwrap_or(false) {
            return Ok(());
        }
        if let Some(target) = enemy_in_reach(region, id, reach) {
            Engagement::new(region, id, target, now)?.resolve(region, rng, script)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::BehaviorTable;
    use crate::{Cell, CombatStats, Dice, Effect, Feature, Mobile, Terrain, TerrainGrid, Weapon};
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Arc;

    fn stats() -> CombatStats {
        CombatStats::new(10, 0, 50, Weapon::fists())
    }

    fn profile() -> BehaviorProfile {
        BehaviorProfile {
            sleepiness: 0,
            restlessness: 0,
            ..BehaviorProfile::default()
        }
    }

    fn setup(behavior: Behavior, monster_at: Cell, hero_at: Cell) -> (Region, MobileId, MobileId) {
        let mut region = Region::new("test", TerrainGrid::filled(5, 30, Terrain::floor()));
        let hero = region.add_mobile(Mobile::hero("Aria", hero_at, stats())).unwrap();
        let monster = region
            .add_mobile(Mobile::monster("m", "goblin", monster_at, stats(), Arc::new(behavior)))
            .unwrap();
        (region, hero, monster)
    }

    fn posture(region: &Region, id: MobileId) -> Posture {
        region.mobile(id).unwrap().monster_state().unwrap().posture
    }

    fn run(region: &mut Region, id: MobileId, seed: u64) -> Script {
        let behavior = region.mobile(id).unwrap().monster_state().unwrap().behavior.clone();
        region.mobile_mut(id).unwrap().movement_points = 4;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut script = Script::new();
        behavior.run(region, id, 0, &mut rng, &mut script).unwrap();
        script
    }

    fn chase(region: &mut Region, id: MobileId) {
        let state = region.mobile_mut(id).unwrap().monster_state_mut().unwrap();
        state.posture = Posture::Chasing;
        state.alerted = true;
    }

    #[test]
    fn test_monster_killed_by_trap_does_not_strike() {
        let mut region = Region::new("hall", TerrainGrid::filled(1, 3, Terrain::floor()));
        region.place_feature(Cell::new(0, 1), Feature::trap(3)).unwrap();
        let hero = region.add_mobile(Mobile::hero("Aria", Cell::new(0, 0), stats())).unwrap();
        let frail = CombatStats::new(1, 0, 50, Weapon::fists());
        let monster = region
            .add_mobile(Mobile::monster(
                "g",
                "goblin",
                Cell::new(0, 2),
                frail,
                Arc::new(Behavior::new(Strategy::Prowler, profile())),
            ))
            .unwrap();
        chase(&mut region, monster);

        let script = run(&mut region, monster, 9);
        assert!(!region.mobile(monster).unwrap().is_alive());
        let death = script.position(|e| *e == Effect::Death { mobile: monster }).unwrap();
        assert!(script.effects()[death..]
            .iter()
            .all(|e| !matches!(e, Effect::Marker { .. } | Effect::Damage { .. })));
        assert_eq!(region.mobile(hero).unwrap().stats.hit_points, 10);
    }

    #[test]
    fn test_reach_is_capped_by_weapon_and_profile() {
        let bow = Weapon::new("bow", "shoots", Dice::new(1, 4, 0), 5);

        // A melee brawler with a bow still walks up to melee before shooting.
        let brawler = Behavior::new(Strategy::Prowler, profile());
        let (mut region, _, monster) = setup(brawler, Cell::new(2, 9), Cell::new(2, 5));
        region.mobile_mut(monster).unwrap().stats.weapon = bow;
        chase(&mut region, monster);
        let script = run(&mut region, monster, 4);
        assert!(region.mobile(monster).unwrap().cell.is_adjacent(Cell::new(2, 5)));
        assert!(script.effects().iter().any(|e| matches!(e, Effect::Marker { .. })));
        assert!(!script.effects().iter().any(|e| matches!(e, Effect::Projectile { .. })));

        // An archer caught with bare fists has to close in as well.
        let archer = Behavior::new(
            Strategy::Prowler,
            BehaviorProfile {
                attack_range: 5,
                ..profile()
            },
        );
        let (mut region, _, monster) = setup(archer, Cell::new(2, 9), Cell::new(2, 5));
        chase(&mut region, monster);
        let script = run(&mut region, monster, 4);
        assert!(region.mobile(monster).unwrap().cell.is_adjacent(Cell::new(2, 5)));
        assert!(!script.effects().iter().any(|e| matches!(e, Effect::Projectile { .. })));
    }

    #[test]
    fn test_wanderer_notices_and_broadcasts() {
        let behavior = Behavior::new(Strategy::Prowler, profile());
        let (mut region, _, monster) = setup(behavior, Cell::new(2, 10), Cell::new(2, 5));
        let script = run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Chasing);
        assert!(region.mobile(monster).unwrap().monster_state().unwrap().alerted);
        assert!(script.effects().iter().any(|e| matches!(e, Effect::Alert { .. })));
    }

    #[test]
    fn test_sleeper_wakes_to_wandering_unless_alerted() {
        let p = BehaviorProfile {
            initial_posture: Posture::Sleeping,
            ..profile()
        };
        let (mut region, _, monster) = setup(Behavior::new(Strategy::Prowler, p), Cell::new(2, 8), Cell::new(2, 5));
        run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Wandering);

        let p = BehaviorProfile {
            initial_posture: Posture::Sleeping,
            ..profile()
        };
        let (mut region, _, monster) = setup(Behavior::new(Strategy::Prowler, p), Cell::new(2, 8), Cell::new(2, 5));
        region.mobile_mut(monster).unwrap().monster_state_mut().unwrap().alerted = true;
        run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Chasing);
    }

    #[test]
    fn test_sleeper_ignores_distant_enemy() {
        let p = BehaviorProfile {
            initial_posture: Posture::Sleeping,
            ..profile()
        };
        let (mut region, _, monster) = setup(Behavior::new(Strategy::Prowler, p), Cell::new(2, 20), Cell::new(2, 5));
        let script = run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Sleeping);
        assert!(script.is_empty());
    }

    #[test]
    fn test_chaser_gives_up_and_clears_alert() {
        let (mut region, _, monster) = setup(Behavior::new(Strategy::Prowler, profile()), Cell::new(2, 28), Cell::new(2, 0));
        {
            let state = region.mobile_mut(monster).unwrap().monster_state_mut().unwrap();
            state.posture = Posture::Chasing;
            state.alerted = true;
        }
        run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Wandering);
        assert!(!region.mobile(monster).unwrap().monster_state().unwrap().alerted);
    }

    #[test]
    fn test_coward_flees_when_hurt() {
        let p = BehaviorProfile {
            flee_below_percent: 50,
            ..profile()
        };
        let (mut region, hero, monster) = setup(Behavior::new(Strategy::Coward, p), Cell::new(2, 6), Cell::new(2, 5));
        {
            let m = region.mobile_mut(monster).unwrap();
            m.stats.hit_points = 2;
            m.monster_state_mut().unwrap().posture = Posture::Chasing;
        }
        run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::RunningAway);
        let hero_cell = region.mobile(hero).unwrap().cell;
        assert!(region.mobile(monster).unwrap().cell.diagonal_distance(hero_cell) > 1);
    }

    #[test]
    fn test_sentinel_returns_to_guarding() {
        let p = BehaviorProfile {
            initial_posture: Posture::Guarding,
            ..profile()
        };
        let (mut region, _, monster) = setup(Behavior::new(Strategy::Sentinel, p), Cell::new(2, 28), Cell::new(2, 0));
        region.mobile_mut(monster).unwrap().monster_state_mut().unwrap().posture = Posture::Chasing;
        run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Guarding);
    }

    #[test]
    fn test_idler_needs_alert_to_stand() {
        let p = BehaviorProfile {
            initial_posture: Posture::Sitting,
            ..profile()
        };
        let (mut region, _, monster) = setup(Behavior::new(Strategy::Idler, p), Cell::new(2, 7), Cell::new(2, 5));
        run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Sitting);

        region.mobile_mut(monster).unwrap().monster_state_mut().unwrap().alerted = true;
        run(&mut region, monster, 1);
        assert_eq!(posture(&region, monster), Posture::Chasing);
    }

    #[test]
    fn test_chaser_closes_and_attacks() {
        let (mut region, hero, monster) = setup(Behavior::new(Strategy::Prowler, profile()), Cell::new(2, 8), Cell::new(2, 5));
        let script = run(&mut region, monster, 3);
        let hero_cell = region.mobile(hero).unwrap().cell;
        assert!(region.mobile(monster).unwrap().cell.is_adjacent(hero_cell));
        assert!(script.effects().iter().any(|e| matches!(e, Effect::Marker { cell, .. } if *cell == hero_cell)));
        assert_eq!(region.mobile(monster).unwrap().movement_points, 0);
    }

    #[test]
    fn test_posture_sequence_is_deterministic_for_seed() {
        let goblin = BehaviorTable::default().get("goblin").unwrap();
        let trace = |seed: u64| {
            let (mut region, _, monster) = setup((*goblin).clone(), Cell::new(2, 25), Cell::new(2, 0));
            let mut rng = StdRng::seed_from_u64(seed);
            let mut postures = Vec::new();
            for tick in 0..20 {
                region.mobile_mut(monster).unwrap().movement_points = 4;
                let mut script = Script::new();
                goblin.run(&mut region, monster, tick, &mut rng, &mut script).unwrap();
                postures.push((posture(&region, monster), region.mobile(monster).unwrap().cell));
            }
            postures
        };
        assert_eq!(trace(42), trace(42));
    }
}
