//! # Features
//!
//! Static cell occupants: doors, chests, exits, traps and fountains, along
//! with their on-step and on-interact effects.

use crate::combat::apply_damage;
use crate::{Cell, Effect, MobileId, MovementMode, Region, Script};
use serde::{Deserialize, Serialize};

/// What a feature is and what it does when used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Door,
    Chest { contents: String },
    Exit { destination: String },
    Trap { damage: u32 },
    Fountain { heal: u32 },
}

/// A static feature occupying a cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub kind: FeatureKind,
    /// Door open, chest emptied, trap sprung.
    pub open: bool,
    pub walkable: bool,
    pub flyable: bool,
    pub opaque: bool,
    pub interactable: bool,
}

impl Feature {
    /// A closed door: blocks movement and sight until opened.
    pub fn door() -> Self {
        Self {
            kind: FeatureKind::Door,
            open: false,
            walkable: false,
            flyable: false,
            opaque: true,
            interactable: true,
        }
    }

    pub fn chest(contents: impl Into<String>) -> Self {
        Self {
            kind: FeatureKind::Chest {
                contents: contents.into(),
            },
            open: false,
            walkable: false,
            flyable: true,
            opaque: false,
            interactable: true,
        }
    }

    pub fn exit(destination: impl Into<String>) -> Self {
        Self {
            kind: FeatureKind::Exit {
                destination: destination.into(),
            },
            open: false,
            walkable: true,
            flyable: true,
            opaque: false,
            interactable: true,
        }
    }

    /// A hidden trap. Only ground movers set it off.
    pub fn trap(damage: u32) -> Self {
        Self {
            kind: FeatureKind::Trap { damage },
            open: false,
            walkable: true,
            flyable: true,
            opaque: false,
            interactable: false,
        }
    }

    pub fn fountain(heal: u32) -> Self {
        Self {
            kind: FeatureKind::Fountain { heal },
            open: false,
            walkable: false,
            flyable: true,
            opaque: false,
            interactable: true,
        }
    }

    pub fn passable_for(&self, mode: MovementMode) -> bool {
        match mode {
            MovementMode::Ground => self.walkable,
            MovementMode::Aerial => self.flyable,
        }
    }

    /// Flips the open state. Doors also flip their passability and opacity;
    /// chests can only be opened once.
    pub fn toggle(&mut self) {
        self.open = !self.open;
        match self.kind {
            FeatureKind::Door => {
                self.walkable = self.open;
                self.flyable = self.open;
                self.opaque = !self.open;
            }
            FeatureKind::Chest { .. } => {
                self.interactable = !self.open;
            }
            _ => {}
        }
    }

    fn label(&self) -> &'static str {
        match self.kind {
            FeatureKind::Door => "door",
            FeatureKind::Chest { .. } => "chest",
            FeatureKind::Exit { .. } => "exit",
            FeatureKind::Trap { .. } => "trap",
            FeatureKind::Fountain { .. } => "fountain",
        }
    }
}

/// Fires the on-step effect of the feature at `cell`, if any, for a mobile
/// that just entered it.
pub fn trigger_step(region: &mut Region, mobile: MobileId, cell: Cell, script: &mut Script) {
    let Some(mover) = region.mobile(mobile) else {
        return;
    };
    let (name, movement, is_hero) = (mover.name.clone(), mover.movement, mover.is_hero());

    let Some(feature) = region.feature_at_mut(cell) else {
        return;
    };

    match feature.kind.clone() {
        FeatureKind::Trap { damage } if !feature.open && movement == MovementMode::Ground => {
            feature.toggle();
            script.push(Effect::ToggleFeature { cell, open: true });
            script.narrate(format!("{} springs a trap!", name));
            apply_damage(region, mobile, damage, script);
        }
        FeatureKind::Exit { destination } if is_hero => {
            script.push(Effect::TransitionRegion { destination });
        }
        _ => {}
    }
}

/// Uses the feature at `cell`. Returns false when there is nothing there to
/// interact with.
pub fn interact(region: &mut Region, mobile: MobileId, cell: Cell, script: &mut Script) -> bool {
    let Some(actor) = region.mobile(mobile) else {
        return false;
    };
    let name = actor.name.clone();

    let Some(feature) = region.feature_at_mut(cell) else {
        return false;
    };
    if !feature.interactable {
        return false;
    }

    match feature.kind.clone() {
        FeatureKind::Door => {
            feature.toggle();
            let open = feature.open;
            script.push(Effect::ToggleFeature { cell, open });
            script.narrate(format!(
                "{} {} the door.",
                name,
                if open { "opens" } else { "closes" }
            ));
        }
        FeatureKind::Chest { contents } => {
            feature.toggle();
            script.push(Effect::ToggleFeature { cell, open: true });
            script.narrate(format!("{} opens the chest and finds {}.", name, contents));
        }
        FeatureKind::Exit { destination } => {
            script.push(Effect::TransitionRegion { destination });
        }
        FeatureKind::Fountain { heal } => {
            let label = feature.label();
            if let Some(actor) = region.mobile_mut(mobile) {
                let before = actor.stats.hit_points;
                actor.stats.hit_points = (before + heal).min(actor.stats.max_hit_points);
                let amount = actor.stats.hit_points - before;
                let remaining = actor.stats.hit_points;
                script.push(Effect::Heal {
                    mobile,
                    amount,
                    remaining,
                });
                script.narrate(format!("{} drinks from the {} and recovers {}.", name, label, amount));
            }
        }
        FeatureKind::Trap { .. } => return false,
    }

    true
}
