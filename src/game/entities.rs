//! # Entities
//!
//! Mobiles and the combat, hero and monster state they carry.
//!
//! Every mobile is a combatant: it has a position, a faction side, a movement
//! budget and hit points. What drives it is decided by its [`Role`]: heroes
//! follow user-supplied goals, monsters run their shared [`Behavior`], and
//! neutral actors stand around waiting to be talked to.

use crate::ai::{Behavior, Posture};
use crate::combat::Dice;
use crate::{new_mobile_id, Cell, MobileId, MovementMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Faction membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Hero,
    Monster,
    Neutral,
}

/// How two sides regard each other. The relation is symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Friend,
    Enemy,
    Neutral,
}

impl Side {
    /// # Examples
    ///
    /// ```
    /// use warband::{Relation, Side};
    ///
    /// assert_eq!(Side::Hero.relation(Side::Monster), Relation::Enemy);
    /// assert_eq!(Side::Monster.relation(Side::Monster), Relation::Friend);
    /// assert_eq!(Side::Neutral.relation(Side::Hero), Relation::Neutral);
    /// ```
    pub fn relation(self, other: Side) -> Relation {
        if self == other {
            Relation::Friend
        } else if self == Side::Neutral || other == Side::Neutral {
            Relation::Neutral
        } else {
            Relation::Enemy
        }
    }
}

/// Timed status conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    /// No movement points while active.
    Stunned,
    /// Loses one hit point at every combat round boundary.
    Poisoned,
    /// Half movement points while active.
    Slowed,
}

/// A wielded weapon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Verb used in narration ("slashes", "shoots").
    pub verb: String,
    pub damage: Dice,
    /// Reach in diagonal cells; 1 is melee.
    pub range: u32,
    /// Condition and duration in ticks laid on the defender by a hit.
    #[serde(default)]
    pub inflicts: Option<(Condition, u64)>,
}

impl Weapon {
    pub fn new(name: impl Into<String>, verb: impl Into<String>, damage: Dice, range: u32) -> Self {
        Self {
            name: name.into(),
            verb: verb.into(),
            damage,
            range: range.max(1),
            inflicts: None,
        }
    }

    pub fn inflicting(mut self, condition: Condition, duration: u64) -> Self {
        self.inflicts = Some((condition, duration));
        self
    }

    pub fn fists() -> Self {
        Self::new("fists", "punches", Dice::new(1, 2, 0), 1)
    }
}

/// Hit points and fighting ability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub hit_points: u32,
    pub max_hit_points: u32,
    pub defense: i32,
    pub skill: i32,
    pub weapon: Weapon,
}

impl CombatStats {
    pub fn new(max_hit_points: u32, defense: i32, skill: i32, weapon: Weapon) -> Self {
        Self {
            hit_points: max_hit_points,
            max_hit_points,
            defense,
            skill,
            weapon,
        }
    }
}

/// What a hero intends to do with its goal cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalIntent {
    /// Stay put and end the turn.
    Wait,
    /// Walk the cached route.
    Move,
    /// Close in on and attack a mobile.
    Attack(MobileId),
    /// Use the feature at a cell.
    Interact(Cell),
    /// Strike up a conversation.
    Talk(MobileId),
}

/// State specific to player-controlled party members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroState {
    pub goal: Option<Cell>,
    pub intent: GoalIntent,
    pub route: Vec<Cell>,
    pub experience: u32,
}

impl HeroState {
    pub fn new() -> Self {
        Self {
            goal: None,
            intent: GoalIntent::Wait,
            route: Vec::new(),
            experience: 0,
        }
    }

    /// Drops the goal, intent and cached route.
    pub fn clear_goal(&mut self) {
        self.goal = None;
        self.intent = GoalIntent::Wait;
        self.route.clear();
    }
}

impl Default for HeroState {
    fn default() -> Self {
        Self::new()
    }
}

/// State specific to autonomous monsters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonsterState {
    pub posture: Posture,
    pub alerted: bool,
    pub behavior: Arc<Behavior>,
    /// Experience handed to the party when this monster dies.
    pub experience_value: u32,
}

/// State specific to neutral actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeutralState {
    pub talkable: bool,
}

/// Who, or what, drives a mobile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Role {
    Hero(HeroState),
    Monster(MonsterState),
    Neutral(NeutralState),
}

/// Anything that occupies a cell and can act.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mobile {
    pub id: MobileId,
    pub name: String,
    pub species: String,
    pub cell: Cell,
    pub visible: bool,
    pub movement: MovementMode,
    pub side: Side,
    pub movement_points: u32,
    pub max_movement_points: u32,
    pub stats: CombatStats,
    /// Condition -> clock tick at which it expires.
    pub conditions: HashMap<Condition, u64>,
    pub role: Role,
}

impl Mobile {
    fn base(name: String, species: String, cell: Cell, side: Side, stats: CombatStats, role: Role) -> Self {
        Self {
            id: new_mobile_id(),
            name,
            species,
            cell,
            visible: true,
            movement: MovementMode::Ground,
            side,
            movement_points: 0,
            max_movement_points: crate::config::DEFAULT_MOVEMENT_POINTS,
            stats,
            conditions: HashMap::new(),
            role,
        }
    }

    /// Creates a party member.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::{Cell, CombatStats, Mobile, Weapon};
    ///
    /// let hero = Mobile::hero("Aria", Cell::new(2, 2), CombatStats::new(10, 2, 60, Weapon::fists()));
    /// assert!(hero.is_hero());
    /// assert!(hero.is_alive());
    /// ```
    pub fn hero(name: impl Into<String>, cell: Cell, stats: CombatStats) -> Self {
        Self::base(
            name.into(),
            "human".to_string(),
            cell,
            Side::Hero,
            stats,
            Role::Hero(HeroState::new()),
        )
    }

    /// Creates a monster driven by a shared behavior. Its starting posture
    /// comes from the behavior profile.
    pub fn monster(
        name: impl Into<String>,
        species: impl Into<String>,
        cell: Cell,
        stats: CombatStats,
        behavior: Arc<Behavior>,
    ) -> Self {
        let experience_value = stats.max_hit_points.max(1);
        let state = MonsterState {
            posture: behavior.profile.initial_posture,
            alerted: false,
            behavior,
            experience_value,
        };
        Self::base(
            name.into(),
            species.into(),
            cell,
            Side::Monster,
            stats,
            Role::Monster(state),
        )
    }

    pub fn neutral(name: impl Into<String>, cell: Cell, stats: CombatStats, talkable: bool) -> Self {
        Self::base(
            name.into(),
            "townsfolk".to_string(),
            cell,
            Side::Neutral,
            stats,
            Role::Neutral(NeutralState { talkable }),
        )
    }

    pub fn with_movement(mut self, movement: MovementMode) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_movement_points(mut self, points: u32) -> Self {
        self.max_movement_points = points;
        self
    }

    pub fn with_species(mut self, species: impl Into<String>) -> Self {
        self.species = species.into();
        self
    }

    pub fn is_alive(&self) -> bool {
        self.stats.hit_points > 0
    }

    pub fn is_hero(&self) -> bool {
        matches!(self.role, Role::Hero(_))
    }

    pub fn is_monster(&self) -> bool {
        matches!(self.role, Role::Monster(_))
    }

    pub fn is_talkable(&self) -> bool {
        matches!(self.role, Role::Neutral(NeutralState { talkable: true }))
    }

    pub fn hero_state(&self) -> Option<&HeroState> {
        match &self.role {
            Role::Hero(state) => Some(state),
            _ => None,
        }
    }

    pub fn hero_state_mut(&mut self) -> Option<&mut HeroState> {
        match &mut self.role {
            Role::Hero(state) => Some(state),
            _ => None,
        }
    }

    pub fn monster_state(&self) -> Option<&MonsterState> {
        match &self.role {
            Role::Monster(state) => Some(state),
            _ => None,
        }
    }

    pub fn monster_state_mut(&mut self) -> Option<&mut MonsterState> {
        match &mut self.role {
            Role::Monster(state) => Some(state),
            _ => None,
        }
    }

    /// A monster is awake unless it is sleeping. Everything else is always awake.
    pub fn is_awake(&self) -> bool {
        self.monster_state()
            .map(|m| m.posture != Posture::Sleeping)
            .unwrap_or(true)
    }

    pub fn relation_to(&self, other: &Mobile) -> crate::Relation {
        self.side.relation(other.side)
    }

    pub fn is_enemy_of(&self, other: &Mobile) -> bool {
        self.relation_to(other) == crate::Relation::Enemy
    }

    pub fn is_friend_of(&self, other: &Mobile) -> bool {
        self.relation_to(other) == crate::Relation::Friend
    }

    /// Whether this mobile can strike a target at the given cell by distance alone.
    pub fn in_weapon_range(&self, target: Cell) -> bool {
        self.cell.diagonal_distance(target) <= self.stats.weapon.range
    }

    /// Remaining hit points as a percentage of the maximum.
    pub fn health_percent(&self) -> u32 {
        if self.stats.max_hit_points == 0 {
            return 0;
        }
        self.stats.hit_points * 100 / self.stats.max_hit_points
    }

    pub fn has_condition(&self, condition: Condition, now: u64) -> bool {
        self.conditions
            .get(&condition)
            .map(|&expiry| expiry > now)
            .unwrap_or(false)
    }

    /// Applies a condition lasting `duration` ticks from `now`, keeping the
    /// later expiry if already present.
    pub fn inflict(&mut self, condition: Condition, now: u64, duration: u64) {
        let expiry = now + duration;
        let entry = self.conditions.entry(condition).or_insert(expiry);
        *entry = (*entry).max(expiry);
    }

    /// Drops conditions that have expired by `now`.
    pub fn expire_conditions(&mut self, now: u64) {
        self.conditions.retain(|_, expiry| *expiry > now);
    }

    /// Restores the movement budget for a new turn, honoring conditions.
    pub fn refresh_movement_points(&mut self, now: u64) {
        self.movement_points = if self.has_condition(Condition::Stunned, now) {
            0
        } else if self.has_condition(Condition::Slowed, now) {
            self.max_movement_points / 2
        } else {
            self.max_movement_points
        };
    }
}
