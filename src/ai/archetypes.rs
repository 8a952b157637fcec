//! # Archetypes
//!
//! The table of named monster behaviors. Every monster of an archetype holds
//! the same `Arc<Behavior>`, so the table is the only place profiles live.

use crate::ai::{AlertRule, Behavior, BehaviorProfile, Posture, Strategy};
use crate::movement::Approach;
use crate::WarbandResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Named behaviors, keyed by archetype.
///
/// # Examples
///
/// ```
/// use warband::ai::{BehaviorTable, Strategy};
///
/// let table = BehaviorTable::default();
/// let goblin = table.get("goblin").unwrap();
/// assert_eq!(goblin.strategy, Strategy::Prowler);
/// assert!(table.get("dragon").is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BehaviorTable {
    behaviors: HashMap<String, Arc<Behavior>>,
}

impl BehaviorTable {
    pub fn empty() -> Self {
        Self {
            behaviors: HashMap::new(),
        }
    }

    /// Parses a JSON object mapping archetype names to behaviors.
    ///
    /// ```
    /// use warband::ai::{BehaviorTable, Posture};
    ///
    /// let json = r#"{ "bat": { "strategy": "Prowler",
    ///                          "profile": { "alert_rule": "Pack", "initial_posture": "Sleeping" } } }"#;
    /// let table = BehaviorTable::from_json(json).unwrap();
    /// assert_eq!(table.get("bat").unwrap().profile.initial_posture, Posture::Sleeping);
    /// ```
    pub fn from_json(json: &str) -> WarbandResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, name: impl Into<String>, behavior: Behavior) {
        self.behaviors.insert(name.into(), Arc::new(behavior));
    }

    pub fn get(&self, name: &str) -> Option<Arc<Behavior>> {
        self.behaviors.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.behaviors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl Default for BehaviorTable {
    /// The built-in bestiary.
    fn default() -> Self {
        let mut table = Self::empty();

        table.insert(
            "goblin",
            Behavior::new(
                Strategy::Prowler,
                BehaviorProfile {
                    alert_rule: AlertRule::SameSpecies,
                    notice_range: 6,
                    wakeup_range: 3,
                    chase_range: 10,
                    attack_range: 1,
                    sleepiness: 5,
                    restlessness: 40,
                    approach: Approach::Erratic { focus: 75 },
                    flee_below_percent: 0,
                    initial_posture: Posture::Sleeping,
                },
            ),
        );
        table.insert(
            "goblin_archer",
            Behavior::new(
                Strategy::Prowler,
                BehaviorProfile {
                    alert_rule: AlertRule::SameSpecies,
                    notice_range: 8,
                    wakeup_range: 3,
                    chase_range: 12,
                    attack_range: 5,
                    sleepiness: 5,
                    restlessness: 30,
                    approach: Approach::Smart,
                    flee_below_percent: 0,
                    initial_posture: Posture::Wandering,
                },
            ),
        );
        table.insert(
            "wolf",
            Behavior::new(
                Strategy::Prowler,
                BehaviorProfile {
                    alert_rule: AlertRule::Pack,
                    notice_range: 8,
                    wakeup_range: 4,
                    chase_range: 14,
                    attack_range: 1,
                    sleepiness: 2,
                    restlessness: 70,
                    approach: Approach::Smart,
                    flee_below_percent: 0,
                    initial_posture: Posture::Wandering,
                },
            ),
        );
        table.insert(
            "rat",
            Behavior::new(
                Strategy::Coward,
                BehaviorProfile {
                    alert_rule: AlertRule::Deaf,
                    notice_range: 4,
                    wakeup_range: 2,
                    chase_range: 6,
                    attack_range: 1,
                    sleepiness: 10,
                    restlessness: 80,
                    approach: Approach::Naive,
                    flee_below_percent: 50,
                    initial_posture: Posture::Wandering,
                },
            ),
        );
        table.insert(
            "skeleton",
            Behavior::new(
                Strategy::Sentinel,
                BehaviorProfile {
                    alert_rule: AlertRule::SameSpecies,
                    notice_range: 5,
                    wakeup_range: 5,
                    chase_range: 8,
                    attack_range: 1,
                    sleepiness: 0,
                    restlessness: 0,
                    approach: Approach::Smart,
                    flee_below_percent: 0,
                    initial_posture: Posture::Guarding,
                },
            ),
        );
        table.insert(
            "ogre",
            Behavior::new(
                Strategy::Idler,
                BehaviorProfile {
                    alert_rule: AlertRule::Deaf,
                    notice_range: 4,
                    wakeup_range: 6,
                    chase_range: 9,
                    attack_range: 1,
                    sleepiness: 0,
                    restlessness: 0,
                    approach: Approach::Naive,
                    flee_below_percent: 0,
                    initial_posture: Posture::Sitting,
                },
            ),
        );

        table
    }
}
