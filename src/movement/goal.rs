//! # Goal Resolution
//!
//! Turns a clicked cell into an intent and a route for a party member, and
//! follows that route on the member's turn.

use crate::combat::Engagement;
use crate::feature::interact;
use crate::movement::{take_step, Assessor, AvoidanceProfile};
use crate::utils::{find_route, Passability};
use crate::{Cell, GoalIntent, MobileId, Region, Script, SimulationConfig, WarbandError, WarbandResult};
use rand::Rng;
use thiserror::Error;

/// Why a goal cell was refused. The message is shown to the player.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GoalRejection {
    #[error("You can't go there.")]
    Impassable,

    #[error("There is no way through.")]
    PathBlocked,

    #[error("That is too far away ({length} steps, at most {cap}).")]
    RouteTooLong { length: usize, cap: usize },
}

/// Decides what `id` should do about `dest` and, when it has to walk, the
/// route to get there.
pub fn resolve_goal(
    region: &Region,
    id: MobileId,
    dest: Cell,
    config: &SimulationConfig,
) -> Result<(GoalIntent, Vec<Cell>), GoalRejection> {
    let Some(actor) = region.mobile(id) else {
        return Err(GoalRejection::Impassable);
    };
    let here = actor.cell;
    let interactable = region.feature_at(dest).map(|f| f.interactable).unwrap_or(false);

    if dest == here {
        let intent = if interactable {
            GoalIntent::Interact(dest)
        } else {
            GoalIntent::Wait
        };
        return Ok((intent, Vec::new()));
    }

    if !region.in_bounds(dest) {
        return Err(GoalRejection::Impassable);
    }
    let occupant = region.mobile_at(dest).filter(|m| m.id != id);
    let terrain_ok = Assessor::for_mobile(region, actor, AvoidanceProfile::TERRAIN_ONLY).is_passable(dest);
    if !terrain_ok && !interactable && occupant.is_none() {
        return Err(GoalRejection::Impassable);
    }

    if let Some(other) = occupant {
        let distance = here.diagonal_distance(dest);
        if actor.is_enemy_of(other) && actor.in_weapon_range(dest) && region.in_line_of_sight(here, dest) {
            return Ok((GoalIntent::Attack(other.id), Vec::new()));
        }
        if !actor.is_enemy_of(other) && other.is_talkable() && distance <= config.talk_range {
            return Ok((GoalIntent::Talk(other.id), Vec::new()));
        }
    }

    let assessor = Assessor::for_mobile(region, actor, AvoidanceProfile::EVERYTHING);
    let mut route = find_route(here, dest, &assessor).ok_or(GoalRejection::PathBlocked)?;
    if route.len() > config.max_route_length && !config.debug_unlimited_routes {
        return Err(GoalRejection::RouteTooLong {
            length: route.len(),
            cap: config.max_route_length,
        });
    }

    let intent = match occupant {
        Some(other) => {
            route.pop();
            if actor.is_enemy_of(other) {
                GoalIntent::Attack(other.id)
            } else if other.is_talkable() {
                GoalIntent::Talk(other.id)
            } else {
                GoalIntent::Move
            }
        }
        None if interactable => {
            route.pop();
            GoalIntent::Interact(dest)
        }
        None => GoalIntent::Move,
    };
    Ok((intent, route))
}

/// Where a goal with the given intent currently points.
fn goal_cell(region: &Region, intent: GoalIntent, fallback: Cell) -> Cell {
    match intent {
        GoalIntent::Attack(target) | GoalIntent::Talk(target) => {
            region.mobile(target).map(|m| m.cell).unwrap_or(fallback)
        }
        _ => fallback,
    }
}

fn living_cell(region: &Region, id: MobileId) -> Option<Cell> {
    region.mobile(id).filter(|m| m.is_alive()).map(|m| m.cell)
}

fn forfeit_and_clear(region: &mut Region, id: MobileId) {
    if let Some(hero) = region.mobile_mut(id) {
        hero.movement_points = 0;
        if let Some(state) = hero.hero_state_mut() {
            state.clear_goal();
        }
    }
}

fn clear_goal(region: &mut Region, id: MobileId) {
    if let Some(state) = region.mobile_mut(id).and_then(|m| m.hero_state_mut()) {
        state.clear_goal();
    }
}

/// Pursues the goal of party member `id` with its remaining movement points.
///
/// Returns true when the member's turn is over: it attacked, interacted,
/// talked, waited, or ran out of points. Returns false when it has points
/// left but nothing to do with them, which means the driver should ask for a
/// new goal.
pub fn advance_hero<R: Rng>(
    region: &mut Region,
    id: MobileId,
    now: u64,
    rng: &mut R,
    script: &mut Script,
    config: &SimulationConfig,
) -> WarbandResult<bool> {
    let mut replanned = false;

    loop {
        let hero = region.expect_mobile(id)?;
        let state = hero
            .hero_state()
            .ok_or_else(|| WarbandError::InvalidAction(format!("{} is not a party member", hero.name)))?;
        let Some(goal) = state.goal else {
            return Ok(false);
        };
        let (here, points, name) = (hero.cell, hero.movement_points, hero.name.clone());
        let intent = state.intent;
        let next = state.route.first().copied();

        let reach = hero.stats.weapon.range;

        let arrived = match intent {
            GoalIntent::Wait => {
                forfeit_and_clear(region, id);
                return Ok(true);
            }
            GoalIntent::Move => next.is_none(),
            GoalIntent::Attack(target) => match living_cell(region, target) {
                Some(cell) => here.diagonal_distance(cell) <= reach && region.in_line_of_sight(here, cell),
                None => {
                    clear_goal(region, id);
                    return Ok(false);
                }
            },
            GoalIntent::Talk(target) => match living_cell(region, target) {
                Some(cell) => here.diagonal_distance(cell) <= config.talk_range,
                None => {
                    clear_goal(region, id);
                    return Ok(false);
                }
            },
            GoalIntent::Interact(cell) => here == cell || here.is_adjacent(cell),
        };

        if arrived {
            match intent {
                GoalIntent::Attack(target) => {
                    Engagement::new(region, id, target, now)?.resolve(region, rng, script)?;
                }
                GoalIntent::Talk(target) => {
                    let other = region.expect_mobile(target)?.name.clone();
                    script.narrate(format!("{} talks with {}.", name, other));
                }
                GoalIntent::Interact(cell) => {
                    if !interact(region, id, cell, script) {
                        script.narrate("Nothing happens.");
                    }
                }
                GoalIntent::Move | GoalIntent::Wait => {
                    let done = points == 0;
                    clear_goal(region, id);
                    return Ok(done);
                }
            }
            forfeit_and_clear(region, id);
            return Ok(true);
        }

        if points == 0 {
            return Ok(true);
        }

        let blocked = match next {
            Some(cell) => {
                let hero = region.expect_mobile(id)?;
                !Assessor::for_mobile(region, hero, AvoidanceProfile::EVERYTHING).is_passable(cell)
                    || region.mobile_at(cell).is_some()
            }
            None => true,
        };

        if blocked {
            if replanned {
                script.narrate(format!("{} can't find a way forward.", name));
                clear_goal(region, id);
                return Ok(false);
            }
            replanned = true;
            let target = goal_cell(region, intent, goal);
            match resolve_goal(region, id, target, config) {
                Ok((intent, route)) => {
                    log::debug!("{} re-plans toward {}: {:?}", name, target, intent);
                    if let Some(state) = region.mobile_mut(id).and_then(|m| m.hero_state_mut()) {
                        state.goal = Some(target);
                        state.intent = intent;
                        state.route = route;
                    }
                }
                Err(rejection) => {
                    log::warn!("{} gives up on {}: {}", name, target, rejection);
                    script.narrate(rejection.to_string());
                    clear_goal(region, id);
                    return Ok(false);
                }
            }
            continue;
        }

        let Some(cell) = next else {
            continue;
        };
        if !take_step(region, id, cell, script) {
            clear_goal(region, id);
            return Ok(false);
        }
        replanned = false;
        if let Some(state) = region.mobile_mut(id).and_then(|m| m.hero_state_mut()) {
            state.route.remove(0);
        }
        if !region.mobile(id).map(|m| m.is_alive()).unwrap_or(false) {
            return Ok(true);
        }
    }
}
