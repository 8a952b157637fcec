//! # Turn Discipline
//!
//! Exploration and combat modes, the combat move order, and the party
//! bookkeeping that happens when the mode changes.

use crate::combat::apply_damage;
use crate::movement::{Assessor, AvoidanceProfile};
use crate::utils::find_drop_cell;
use crate::{Cell, Condition, Effect, MobileId, Region, Script};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// The scheduler's two modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Only the leader moves, one step per tick.
    Exploration,
    /// Everyone nearby takes turns in a fixed order.
    Combat,
}

/// Why the party could not leave combat.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeRejection {
    #[error("You can't leave combat with enemies nearby.")]
    EnemiesNearby,

    #[error("The party must gather before leaving combat.")]
    PartyScattered,
}

/// FIFO of the actors still to act this combat round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOrder {
    queue: VecDeque<MobileId>,
}

impl MoveOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refills the queue: living party members in party order, then living
    /// monsters within `idle_range` of any living party member, in region
    /// order.
    pub fn rebuild(&mut self, region: &Region, party: &[MobileId], idle_range: u32) {
        self.queue.clear();
        let members: Vec<(MobileId, Cell)> = party
            .iter()
            .filter_map(|&id| region.mobile(id))
            .filter(|m| m.is_alive())
            .map(|m| (m.id, m.cell))
            .collect();

        self.queue.extend(members.iter().map(|&(id, _)| id));
        self.queue.extend(
            region
                .mobiles()
                .filter(|m| m.is_monster() && m.is_alive())
                .filter(|m| members.iter().any(|&(_, cell)| cell.diagonal_distance(m.cell) <= idle_range))
                .map(|m| m.id),
        );
    }

    pub fn front(&self) -> Option<MobileId> {
        self.queue.front().copied()
    }

    pub fn pop(&mut self) -> Option<MobileId> {
        self.queue.pop_front()
    }

    pub fn remove(&mut self, id: MobileId) {
        self.queue.retain(|&other| other != id);
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn contains(&self, id: MobileId) -> bool {
        self.queue.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MobileId> {
        self.queue.iter()
    }
}

/// Whether any living party member has an awake, visible enemy in sight
/// within `range`.
pub fn enemy_threatens(region: &Region, party: &[MobileId], range: u32) -> bool {
    party
        .iter()
        .filter_map(|&id| region.mobile(id))
        .filter(|m| m.is_alive())
        .any(|member| {
            region.mobiles().any(|other| {
                other.is_alive()
                    && other.visible
                    && other.is_awake()
                    && member.is_enemy_of(other)
                    && member.cell.diagonal_distance(other.cell) <= range
                    && region.in_line_of_sight(member.cell, other.cell)
            })
        })
}

/// Checks whether the party may leave combat, measured around `active`.
pub fn may_leave_combat(
    region: &Region,
    party: &[MobileId],
    active: MobileId,
    leave_range: u32,
    cohesion_range: u32,
) -> Result<(), ModeRejection> {
    if enemy_threatens(region, party, leave_range) {
        return Err(ModeRejection::EnemiesNearby);
    }
    let Some(anchor) = region.mobile(active).map(|m| m.cell) else {
        return Ok(());
    };
    let scattered = party
        .iter()
        .filter_map(|&id| region.mobile(id))
        .filter(|m| m.is_alive())
        .any(|m| m.cell.diagonal_distance(anchor) > cohesion_range);
    if scattered {
        return Err(ModeRejection::PartyScattered);
    }
    Ok(())
}

/// Brings hidden party members out onto free cells near the leader.
pub fn deploy_party(region: &mut Region, party: &[MobileId], leader: MobileId, script: &mut Script) {
    let Some(origin) = region.mobile(leader).map(|m| m.cell) else {
        return;
    };

    for &id in party.iter().filter(|&&id| id != leader) {
        let drop = {
            let Some(member) = region.mobile(id) else {
                continue;
            };
            if member.visible || !member.is_alive() {
                continue;
            }
            let assessor = Assessor::for_mobile(region, member, AvoidanceProfile::TERRAIN_ONLY);
            find_drop_cell(origin, &assessor, |cell| region.mobile_at(cell).is_none())
        };

        let Some(member) = region.mobile_mut(id) else {
            continue;
        };
        match drop {
            Some(cell) => {
                member.visible = true;
                member.cell = cell;
                script.push(Effect::Move {
                    mobile: id,
                    from: origin,
                    to: cell,
                });
            }
            None => log::warn!("no room to deploy {} near {}", member.name, origin),
        }
    }
}

/// Hides every living member other than the leader on the leader's cell.
pub fn gather_party(region: &mut Region, party: &[MobileId], leader: MobileId) {
    let Some(origin) = region.mobile(leader).map(|m| m.cell) else {
        return;
    };
    for &id in party.iter().filter(|&&id| id != leader) {
        if let Some(member) = region.mobile_mut(id).filter(|m| m.is_alive()) {
            member.visible = false;
            member.cell = origin;
        }
    }
}

/// Round-boundary upkeep: poison bites, expired conditions drop off.
pub fn tick_conditions(region: &mut Region, now: u64, script: &mut Script) {
    let poisoned: Vec<(MobileId, String)> = region
        .mobiles()
        .filter(|m| m.is_alive() && m.has_condition(Condition::Poisoned, now))
        .map(|m| (m.id, m.name.clone()))
        .collect();
    for (id, name) in poisoned {
        script.narrate(format!("{} suffers from poison.", name));
        apply_damage(region, id, 1, script);
    }
    for mobile in region.mobiles_mut() {
        mobile.expire_conditions(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{BehaviorTable, Posture};
    use crate::{CombatStats, Mobile, Terrain, TerrainGrid, Weapon};

    fn stats() -> CombatStats {
        CombatStats::new(10, 0, 50, Weapon::fists())
    }

    fn field() -> Region {
        Region::new("field", TerrainGrid::filled(10, 20, Terrain::floor()))
    }

    #[test]
    fn test_rebuild_orders_party_then_nearby_monsters() {
        let mut region = field();
        let goblin = BehaviorTable::default().get("goblin").unwrap();
        let m1 = region
            .add_mobile(Mobile::monster("g1", "goblin", Cell::new(0, 5), stats(), goblin.clone()))
            .unwrap();
        let a = region.add_mobile(Mobile::hero("A", Cell::new(0, 0), stats())).unwrap();
        let far = region
            .add_mobile(Mobile::monster("g2", "goblin", Cell::new(9, 19), stats(), goblin.clone()))
            .unwrap();
        let b = region.add_mobile(Mobile::hero("B", Cell::new(1, 0), stats())).unwrap();

        let mut order = MoveOrder::new();
        order.rebuild(&region, &[b, a], 8);
        assert_eq!(order.iter().copied().collect::<Vec<_>>(), vec![b, a, m1]);
        assert!(!order.contains(far));

        order.remove(a);
        assert_eq!(order.pop(), Some(b));
        assert_eq!(order.front(), Some(m1));
    }

    #[test]
    fn test_sleeping_enemies_do_not_threaten() {
        let mut region = field();
        let goblin = BehaviorTable::default().get("goblin").unwrap();
        let hero = region.add_mobile(Mobile::hero("A", Cell::new(0, 0), stats())).unwrap();
        let g = region
            .add_mobile(Mobile::monster("g", "goblin", Cell::new(0, 3), stats(), goblin))
            .unwrap();
        assert_eq!(region.mobile(g).unwrap().monster_state().unwrap().posture, Posture::Sleeping);
        assert!(!enemy_threatens(&region, &[hero], 6));

        region.mobile_mut(g).unwrap().monster_state_mut().unwrap().posture = Posture::Wandering;
        assert!(enemy_threatens(&region, &[hero], 6));
        assert!(!enemy_threatens(&region, &[hero], 2));
    }

    #[test]
    fn test_leaving_combat_requires_calm_and_cohesion() {
        let mut region = field();
        let wolf = BehaviorTable::default().get("wolf").unwrap();
        let a = region.add_mobile(Mobile::hero("A", Cell::new(0, 0), stats())).unwrap();
        let b = region.add_mobile(Mobile::hero("B", Cell::new(0, 9), stats())).unwrap();
        let w = region
            .add_mobile(Mobile::monster("w", "wolf", Cell::new(2, 0), stats(), wolf))
            .unwrap();

        assert_eq!(may_leave_combat(&region, &[a, b], a, 4, 5), Err(ModeRejection::EnemiesNearby));
        region.mobile_mut(w).unwrap().stats.hit_points = 0;
        assert_eq!(may_leave_combat(&region, &[a, b], a, 4, 5), Err(ModeRejection::PartyScattered));
        region.mobile_mut(b).unwrap().cell = Cell::new(0, 4);
        assert_eq!(may_leave_combat(&region, &[a, b], a, 4, 5), Ok(()));
    }

    #[test]
    fn test_deploy_and_gather() {
        let mut region = field();
        let a = region.add_mobile(Mobile::hero("A", Cell::new(4, 4), stats())).unwrap();
        let b = region.add_mobile(Mobile::hero("B", Cell::new(0, 0), stats())).unwrap();
        let c = region.add_mobile(Mobile::hero("C", Cell::new(0, 0), stats())).unwrap();
        let party = [a, b, c];

        gather_party(&mut region, &party, a);
        assert!(!region.mobile(b).unwrap().visible);
        assert_eq!(region.mobile(c).unwrap().cell, Cell::new(4, 4));

        let mut script = Script::new();
        deploy_party(&mut region, &party, a, &mut script);
        let cb = region.mobile(b).unwrap().cell;
        let cc = region.mobile(c).unwrap().cell;
        assert!(cb.is_adjacent(Cell::new(4, 4)));
        assert!(cc.is_adjacent(Cell::new(4, 4)));
        assert_ne!(cb, cc);
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_poison_ticks_then_expires() {
        let mut region = field();
        let a = region.add_mobile(Mobile::hero("A", Cell::new(0, 0), stats())).unwrap();
        region.mobile_mut(a).unwrap().inflict(Condition::Poisoned, 0, 15);

        let mut script = Script::new();
        tick_conditions(&mut region, 10, &mut script);
        assert_eq!(region.mobile(a).unwrap().stats.hit_points, 9);
        tick_conditions(&mut region, 20, &mut script);
        assert_eq!(region.mobile(a).unwrap().stats.hit_points, 9);
        assert!(region.mobile(a).unwrap().conditions.is_empty());
    }
}
