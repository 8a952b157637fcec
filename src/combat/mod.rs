//! # Combat Module
//!
//! Dice, attacks and the one-shot engagement that turns an attack
//! declaration into an outcome and an ordered run of effects.
//!
//! ## Resolution
//!
//! ```text
//! chance = clamp(100 * max(0, skill - 0.75 * defense) / skill, 5, 95)
//! roll   = uniform 1..=100
//!
//! roll > 95                  -> miss
//! roll > chance && roll > 5  -> defended
//! roll <= 5                  -> critical (maximum damage)
//! otherwise                  -> hit (rolled damage)
//! ```

use crate::ai::on_damaged;
use crate::utils::{rasterize_line, roll_percentile};
use crate::{
    Cell, Effect, MarkerKind, Mobile, MobileId, Region, Script, WarbandError, WarbandResult,
    MARKER_FRAMES,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Rolls above this always miss.
pub const MISS_ABOVE: u32 = 95;
/// Rolls at or below this are always critical.
pub const CRITICAL_AT_OR_BELOW: u32 = 5;

/// `count`d`sides` + `modifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl Dice {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Rolls the dice. Never negative.
    pub fn roll(&self, rng: &mut impl Rng) -> u32 {
        let sum: i64 = (0..self.count)
            .map(|_| if self.sides == 0 { 0 } else { rng.gen_range(1..=self.sides) as i64 })
            .sum();
        (sum + self.modifier as i64).max(0) as u32
    }

    /// The highest possible roll.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::Dice;
    ///
    /// assert_eq!(Dice::new(2, 6, 1).max(), 13);
    /// ```
    pub fn max(&self) -> u32 {
        (self.count as i64 * self.sides as i64 + self.modifier as i64).max(0) as u32
    }
}

/// An attack declaration, built fresh for every engagement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub skill: i32,
    pub damage: Dice,
    pub verb: String,
    pub range: u32,
}

impl Attack {
    /// The attack a mobile makes with its current weapon.
    pub fn with_weapon(mobile: &Mobile) -> Self {
        Self {
            skill: mobile.stats.skill,
            damage: mobile.stats.weapon.damage,
            verb: mobile.stats.weapon.verb.clone(),
            range: mobile.stats.weapon.range,
        }
    }
}

/// How an engagement ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Miss,
    Defended,
    Hit { damage: u32 },
    Critical { damage: u32 },
}

/// Percent chance to land a blow.
///
/// # Examples
///
/// ```
/// use warband::hit_chance;
///
/// assert_eq!(hit_chance(60, 0), 95);
/// assert_eq!(hit_chance(60, 40), 50);
/// assert_eq!(hit_chance(0, 10), 5);
/// ```
pub fn hit_chance(skill: i32, defense: i32) -> u32 {
    if skill <= 0 {
        return CRITICAL_AT_OR_BELOW;
    }
    let margin = (skill as f64 - 0.75 * defense as f64).max(0.0);
    let raw = (100.0 * margin / skill as f64).floor() as i64;
    raw.clamp(CRITICAL_AT_OR_BELOW as i64, MISS_ABOVE as i64) as u32
}

/// Applies damage to a mobile, firing the damage hook and, at zero hit
/// points, the death effects. Returns true if this blow killed it.
pub fn apply_damage(region: &mut Region, id: MobileId, amount: u32, script: &mut Script) -> bool {
    let Some(victim) = region.mobile_mut(id) else {
        return false;
    };
    let was_alive = victim.is_alive();
    victim.stats.hit_points = victim.stats.hit_points.saturating_sub(amount);
    let remaining = victim.stats.hit_points;
    let name = victim.name.clone();

    script.push(Effect::Damage {
        mobile: id,
        amount,
        remaining,
    });
    on_damaged(region, id, script);

    if was_alive && remaining == 0 {
        script.push(Effect::Death { mobile: id });
        script.push(Effect::Remove { mobile: id });
        script.narrate(format!("{} dies.", name));
        return true;
    }
    false
}

/// A single attacker-versus-defender transaction.
#[derive(Debug, Clone)]
pub struct Engagement {
    pub attacker: MobileId,
    pub attack: Attack,
    pub defender: MobileId,
    pub attacker_cell: Cell,
    /// Clock tick the blow lands on, for timed conditions.
    pub now: u64,
}

impl Engagement {
    /// Declares an attack by `attacker` on `defender` with its current weapon.
    pub fn new(region: &Region, attacker: MobileId, defender: MobileId, now: u64) -> WarbandResult<Self> {
        let striker = region.expect_mobile(attacker)?;
        let target = region.expect_mobile(defender)?;
        if !striker.is_alive() {
            return Err(WarbandError::InvalidAction(format!(
                "{} is dead and cannot attack {}",
                striker.name, target.name
            )));
        }
        if !target.is_alive() {
            return Err(WarbandError::InvalidAction(format!(
                "{} attacks {}, who is already dead",
                striker.name, target.name
            )));
        }
        Ok(Self {
            attacker,
            attack: Attack::with_weapon(striker),
            defender,
            attacker_cell: striker.cell,
            now,
        })
    }

    /// Rolls to hit and resolves the engagement.
    pub fn resolve(self, region: &mut Region, rng: &mut impl Rng, script: &mut Script) -> WarbandResult<Outcome> {
        let roll = roll_percentile(rng);
        self.resolve_roll(roll, region, rng, script)
    }

    /// Resolves the engagement with a given to-hit roll.
    pub fn resolve_roll(
        self,
        roll: u32,
        region: &mut Region,
        rng: &mut impl Rng,
        script: &mut Script,
    ) -> WarbandResult<Outcome> {
        let (attacker_name, attacker_is_hero) = {
            let a = region.expect_mobile(self.attacker)?;
            (a.name.clone(), a.is_hero())
        };
        let (defender_name, defender_cell, defense, experience) = {
            let d = region.expect_mobile(self.defender)?;
            let experience = d
                .monster_state()
                .map(|m| m.experience_value)
                .unwrap_or(d.stats.max_hit_points);
            (d.name.clone(), d.cell, d.stats.defense, experience)
        };

        let chance = hit_chance(self.attack.skill, defense);
        let outcome = if roll > MISS_ABOVE {
            Outcome::Miss
        } else if roll > chance && roll > CRITICAL_AT_OR_BELOW {
            Outcome::Defended
        } else if roll <= CRITICAL_AT_OR_BELOW {
            Outcome::Critical {
                damage: self.attack.damage.max(),
            }
        } else {
            Outcome::Hit {
                damage: self.attack.damage.roll(rng),
            }
        };
        log::debug!(
            "{} -> {}: skill {} vs defense {}, chance {}, roll {} => {:?}",
            attacker_name,
            defender_name,
            self.attack.skill,
            defense,
            chance,
            roll,
            outcome
        );

        if !self.attacker_cell.is_adjacent(defender_cell) {
            let path = rasterize_line(self.attacker_cell, defender_cell);
            for &cell in path.iter().take(path.len().saturating_sub(1)) {
                script.push(Effect::Projectile { cell });
            }
        }

        let marker = match outcome {
            Outcome::Miss => MarkerKind::Miss,
            Outcome::Defended => MarkerKind::Defended,
            Outcome::Hit { .. } => MarkerKind::Hit,
            Outcome::Critical { .. } => MarkerKind::Critical,
        };
        script.push(Effect::Marker {
            cell: defender_cell,
            kind: marker,
            frames: MARKER_FRAMES,
        });

        let damage = match outcome {
            Outcome::Miss => {
                script.narrate(format!("{} misses {}.", attacker_name, defender_name));
                return Ok(outcome);
            }
            Outcome::Defended => {
                script.narrate(format!("{} fends off {}.", defender_name, attacker_name));
                return Ok(outcome);
            }
            Outcome::Hit { damage } => {
                script.narrate(format!(
                    "{} {} {} for {}.",
                    attacker_name, self.attack.verb, defender_name, damage
                ));
                damage
            }
            Outcome::Critical { damage } => {
                script.narrate(format!(
                    "{} {} {} with a critical blow for {}!",
                    attacker_name, self.attack.verb, defender_name, damage
                ));
                damage
            }
        };

        let inflicts = region
            .mobile(self.attacker)
            .and_then(|a| a.stats.weapon.inflicts);
        let killed = apply_damage(region, self.defender, damage, script);

        if !killed {
            if let (Some((condition, duration)), Some(defender)) = (inflicts, region.mobile_mut(self.defender)) {
                defender.inflict(condition, self.now, duration);
            }
        }

        if killed && attacker_is_hero {
            award_experience(region, experience, script);
        }

        Ok(outcome)
    }
}

/// Hands experience to every living party member.
fn award_experience(region: &mut Region, amount: u32, script: &mut Script) {
    for hero in region.mobiles_mut().filter(|m| m.is_alive()) {
        let id = hero.id;
        if let Some(state) = hero.hero_state_mut() {
            state.experience += amount;
            script.push(Effect::AwardExperience { mobile: id, amount });
        }
    }
}
