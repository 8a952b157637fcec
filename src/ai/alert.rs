//! # Alert Protocol
//!
//! Alerts are broadcast, not shared state: the source appends an alert
//! effect and every other living faction-friend monster decides for itself,
//! by its own rule, whether to become alerted.

use crate::{Effect, MarkerKind, MobileId, Region, Relation, Script, MARKER_FRAMES};
use serde::{Deserialize, Serialize};

/// How a monster responds to alerts raised by others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertRule {
    /// Only its own species, within its notice range.
    SameSpecies,
    /// Any friend within its notice range.
    Pack,
    /// Nobody else; only its own perception or pain.
    Deaf,
}

/// Raises the alarm from `source`: records the alert and offers it to every
/// other living monster that is a friend of the source.
pub fn broadcast_alert(region: &mut Region, source: MobileId, script: &mut Script) {
    let Some(origin) = region.mobile(source) else {
        return;
    };
    let origin_cell = origin.cell;
    let origin_side = origin.side;

    script.push(Effect::Alert { source });
    script.push(Effect::Marker {
        cell: origin_cell,
        kind: MarkerKind::Alert,
        frames: MARKER_FRAMES,
    });

    let receivers: Vec<MobileId> = region
        .mobiles()
        .filter(|m| m.id != source && m.is_alive() && m.is_monster())
        .filter(|m| m.side.relation(origin_side) == Relation::Friend)
        .map(|m| m.id)
        .collect();

    for receiver in receivers {
        if on_alert(region, receiver, source) {
            log::debug!("alert from {} reached {}", source, receiver);
        }
    }
}

/// Offers an alert from `source` to `receiver`. A monster alerting itself
/// always listens. Returns true if the receiver is newly alerted.
pub fn on_alert(region: &mut Region, receiver: MobileId, source: MobileId) -> bool {
    let Some(origin) = region.mobile(source) else {
        return false;
    };
    let (origin_cell, origin_species) = (origin.cell, origin.species.clone());

    let Some(listener) = region.mobile_mut(receiver) else {
        return false;
    };
    let cell = listener.cell;
    let species_match = listener.species == origin_species;
    let Some(state) = listener.monster_state_mut() else {
        return false;
    };

    let heeds = if receiver == source {
        true
    } else {
        let in_range = cell.diagonal_distance(origin_cell) <= state.behavior.profile.notice_range;
        match state.behavior.profile.alert_rule {
            AlertRule::SameSpecies => species_match && in_range,
            AlertRule::Pack => in_range,
            AlertRule::Deaf => false,
        }
    };

    if heeds && !state.alerted {
        state.alerted = true;
        return true;
    }
    false
}

/// Damage hook: a wounded monster is always alerted, and it raises the alarm.
pub fn on_damaged(region: &mut Region, id: MobileId, script: &mut Script) {
    if !region.mobile(id).map(|m| m.is_monster()).unwrap_or(false) {
        return;
    }
    on_alert(region, id, id);
    broadcast_alert(region, id, script);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::BehaviorTable;
    use crate::{Cell, CombatStats, Mobile, Terrain, TerrainGrid, Weapon};

    fn stats() -> CombatStats {
        CombatStats::new(6, 0, 30, Weapon::fists())
    }

    fn alerted(region: &Region, id: MobileId) -> bool {
        region.mobile(id).unwrap().monster_state().unwrap().alerted
    }

    #[test]
    fn test_same_species_rule_filters_species_and_range() {
        let table = BehaviorTable::default();
        let goblin = table.get("goblin").unwrap();
        let notice = goblin.profile.notice_range as i32;
        let mut region = Region::new("test", TerrainGrid::filled(3, 40, Terrain::floor()));

        let source = region
            .add_mobile(Mobile::monster("g0", "goblin", Cell::new(1, 0), stats(), goblin.clone()))
            .unwrap();
        let near = region
            .add_mobile(Mobile::monster("g1", "goblin", Cell::new(1, notice), stats(), goblin.clone()))
            .unwrap();
        let far = region
            .add_mobile(Mobile::monster("g2", "goblin", Cell::new(1, notice + 1), stats(), goblin.clone()))
            .unwrap();
        let other = region
            .add_mobile(Mobile::monster("k", "kobold", Cell::new(0, 1), stats(), goblin))
            .unwrap();

        let mut script = Script::new();
        on_damaged(&mut region, source, &mut script);

        assert!(alerted(&region, source));
        assert!(alerted(&region, near));
        assert!(!alerted(&region, far));
        assert!(!alerted(&region, other));
        assert_eq!(script.effects()[0], Effect::Alert { source });
    }

    #[test]
    fn test_deaf_monsters_ignore_others() {
        let table = BehaviorTable::default();
        let mut region = Region::new("test", TerrainGrid::filled(3, 10, Terrain::floor()));
        let source = region
            .add_mobile(Mobile::monster("w", "wolf", Cell::new(1, 0), stats(), table.get("wolf").unwrap()))
            .unwrap();
        let ogre = region
            .add_mobile(Mobile::monster("o", "wolf", Cell::new(1, 1), stats(), table.get("ogre").unwrap()))
            .unwrap();
        let mut script = Script::new();
        broadcast_alert(&mut region, source, &mut script);
        assert!(!alerted(&region, ogre));
        assert!(on_alert(&mut region, ogre, ogre));
    }

    #[test]
    fn test_alerts_never_cross_factions() {
        let table = BehaviorTable::default();
        let mut region = Region::new("test", TerrainGrid::filled(3, 10, Terrain::floor()));
        let source = region
            .add_mobile(Mobile::monster("w", "wolf", Cell::new(1, 0), stats(), table.get("wolf").unwrap()))
            .unwrap();
        let hero = region.add_mobile(Mobile::hero("Aria", Cell::new(1, 1), stats())).unwrap();
        let mut script = Script::new();
        broadcast_alert(&mut region, source, &mut script);
        assert!(region.mobile(hero).unwrap().monster_state().is_none());
    }
}
