//! # Simulation State Module
//!
//! The turn scheduler and the single entry point for an external driver.
//!
//! A [`Simulation`] owns the region, the party roster, the clock and the
//! random source. The driver sets goals for party members and calls
//! [`Simulation::step`] repeatedly, playing back the returned effects.

use crate::ai::BehaviorTable;
use crate::movement::{advance_hero, resolve_goal};
use crate::turns::{
    deploy_party, enemy_threatens, gather_party, may_leave_combat, tick_conditions, Mode, MoveOrder,
};
use crate::{
    config, Cell, CombatStats, Effect, GoalIntent, Mobile, MobileId, Region, Script, WarbandError,
    WarbandResult,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tunable scheduler and movement numbers.
///
/// # Examples
///
/// ```
/// use warband::SimulationConfig;
///
/// let config = SimulationConfig::from_json(r#"{ "combat_range": 4 }"#).unwrap();
/// assert_eq!(config.combat_range, 4);
/// assert_eq!(config.idle_range, SimulationConfig::default().idle_range);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// An awake enemy this close to the party starts combat.
    pub combat_range: u32,
    /// Combat can't be left with an awake enemy this close.
    pub leave_range: u32,
    /// Combat can't be left while a member is farther than this from the
    /// active member.
    pub cohesion_range: u32,
    /// Monsters farther than this from the party don't act.
    pub idle_range: u32,
    pub talk_range: u32,
    pub max_route_length: usize,
    /// Lifts the route length cap.
    pub debug_unlimited_routes: bool,
    /// Clock ticks per combat round.
    pub combat_tick: u64,
    pub exploration_tick: u64,
    pub sight_radius: u32,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            combat_range: config::COMBAT_RANGE,
            leave_range: config::LEAVE_RANGE,
            cohesion_range: config::COHESION_RANGE,
            idle_range: config::IDLE_RANGE,
            talk_range: config::TALK_RANGE,
            max_route_length: config::MAX_ROUTE_LENGTH,
            debug_unlimited_routes: false,
            combat_tick: config::COMBAT_TICK,
            exploration_tick: config::EXPLORATION_TICK,
            sight_radius: config::SIGHT_RADIUS,
            seed: 0,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> WarbandResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Running totals for the session, fed from emitted effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub steps_taken: u64,
    pub damage_dealt: u64,
    pub healing_done: u64,
    pub deaths: u32,
    pub experience_awarded: u64,
    pub alerts_raised: u32,
    pub combat_rounds: u32,
}

impl SessionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_from_effect(&mut self, effect: &Effect) {
        match effect {
            Effect::Move { .. } => self.steps_taken += 1,
            Effect::Damage { amount, .. } => self.damage_dealt += *amount as u64,
            Effect::Heal { amount, .. } => self.healing_done += *amount as u64,
            Effect::Death { .. } => self.deaths += 1,
            Effect::AwardExperience { amount, .. } => self.experience_awarded += *amount as u64,
            Effect::Alert { .. } => self.alerts_raised += 1,
            _ => {}
        }
    }
}

/// Whether the session can still be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameCompletionState {
    Playing,
    /// Every party member is dead; further steps do nothing.
    PartyDefeated,
}

/// What one drive of the scheduler produced.
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    pub script: Script,
    /// The acting party member has no goal; nothing advanced.
    pub awaiting_input: bool,
}

/// The turn scheduler over one region.
#[derive(Debug)]
pub struct Simulation {
    pub region: Region,
    party: Vec<MobileId>,
    leader: MobileId,
    mode: Mode,
    move_order: MoveOrder,
    clock: u64,
    pub config: SimulationConfig,
    pub behaviors: BehaviorTable,
    pub statistics: SessionStatistics,
    completion_state: GameCompletionState,
    rng: StdRng,
    /// Narration produced between steps, delivered with the next report.
    pending: Script,
}

impl Simulation {
    /// Starts a session in exploration mode. The first party member leads.
    ///
    /// # Examples
    ///
    /// ```
    /// use warband::{Cell, CombatStats, Mobile, Mode, Region, Simulation, SimulationConfig, Terrain, TerrainGrid, Weapon};
    ///
    /// let mut region = Region::new("yard", TerrainGrid::filled(5, 5, Terrain::floor()));
    /// let hero = region
    ///     .add_mobile(Mobile::hero("Aria", Cell::new(2, 2), CombatStats::new(10, 0, 50, Weapon::fists())))
    ///     .unwrap();
    /// let sim = Simulation::new(region, vec![hero], SimulationConfig::default()).unwrap();
    /// assert_eq!(sim.mode(), Mode::Exploration);
    /// assert_eq!(sim.whose_turn(), Some(hero));
    /// ```
    pub fn new(mut region: Region, party: Vec<MobileId>, config: SimulationConfig) -> WarbandResult<Self> {
        let Some(&leader) = party.first() else {
            return Err(WarbandError::InvalidState("a party needs at least one member".to_string()));
        };
        for &id in &party {
            if !region.expect_mobile(id)?.is_hero() {
                return Err(WarbandError::InvalidState(format!("{} is not a party member", id)));
            }
        }

        gather_party(&mut region, &party, leader);
        if let Some(cell) = region.mobile(leader).map(|m| m.cell) {
            region.reveal_from(cell, config.sight_radius);
        }

        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            region,
            party,
            leader,
            mode: Mode::Exploration,
            move_order: MoveOrder::new(),
            clock: 0,
            config,
            behaviors: BehaviorTable::default(),
            statistics: SessionStatistics::new(),
            completion_state: GameCompletionState::Playing,
            rng,
            pending: Script::new(),
        })
    }

    /// Replaces the archetype table used by [`Simulation::spawn_monster`].
    pub fn with_behaviors(mut self, behaviors: BehaviorTable) -> Self {
        self.behaviors = behaviors;
        self
    }

    /// Adds a monster of a named archetype to the region.
    pub fn spawn_monster(
        &mut self,
        archetype: &str,
        name: impl Into<String>,
        cell: Cell,
        stats: CombatStats,
    ) -> WarbandResult<MobileId> {
        let behavior = self
            .behaviors
            .get(archetype)
            .ok_or_else(|| WarbandError::InvalidAction(format!("unknown archetype '{}'", archetype)))?;
        self.region
            .add_mobile(Mobile::monster(name, archetype, cell, stats, behavior))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn party(&self) -> &[MobileId] {
        &self.party
    }

    pub fn leader(&self) -> MobileId {
        self.leader
    }

    pub fn move_order(&self) -> &MoveOrder {
        &self.move_order
    }

    pub fn completion_state(&self) -> GameCompletionState {
        self.completion_state
    }

    /// The actor the next [`Simulation::step`] will drive.
    pub fn whose_turn(&self) -> Option<MobileId> {
        match self.mode {
            Mode::Exploration => Some(self.leader),
            Mode::Combat => self.move_order.front(),
        }
    }

    pub fn is_cell_visible(&self, cell: Cell) -> bool {
        self.region.is_seen(cell)
    }

    pub fn occupant_at(&self, cell: Cell) -> Option<MobileId> {
        self.region.mobile_at(cell).map(|m| m.id)
    }

    pub fn is_party_dead(&self) -> bool {
        !self
            .party
            .iter()
            .any(|&id| self.region.mobile(id).map(|m| m.is_alive()).unwrap_or(false))
    }

    /// The party member a new goal applies to, if it is a party member's turn.
    fn acting_member(&self) -> Option<MobileId> {
        self.whose_turn().filter(|id| self.party.contains(id))
    }

    /// Gives the acting party member a goal. A rejected goal is narrated in
    /// the next report and leaves the member without a goal.
    pub fn set_goal(&mut self, cell: Cell) -> WarbandResult<GoalIntent> {
        let Some(id) = self.acting_member() else {
            return Err(WarbandError::InvalidAction("no party member is acting".to_string()));
        };

        match resolve_goal(&self.region, id, cell, &self.config) {
            Ok((intent, route)) => {
                log::debug!("goal {} for {}: {:?}, {} steps", cell, id, intent, route.len());
                if let Some(state) = self.region.mobile_mut(id).and_then(|m| m.hero_state_mut()) {
                    state.goal = Some(cell);
                    state.intent = intent;
                    state.route = route;
                }
                Ok(intent)
            }
            Err(rejection) => {
                log::warn!("goal {} rejected: {}", cell, rejection);
                self.pending.narrate(rejection.to_string());
                if let Some(state) = self.region.mobile_mut(id).and_then(|m| m.hero_state_mut()) {
                    state.clear_goal();
                }
                Err(rejection.into())
            }
        }
    }

    /// Drives the scheduler once.
    pub fn step(&mut self) -> WarbandResult<StepReport> {
        let mut script = std::mem::take(&mut self.pending);
        if self.completion_state != GameCompletionState::Playing {
            return Ok(StepReport {
                script,
                awaiting_input: false,
            });
        }

        let awaiting_input = match self.mode {
            Mode::Exploration => self.explore(&mut script)?,
            Mode::Combat => self.fight(&mut script)?,
        };

        for effect in script.effects() {
            self.statistics.update_from_effect(effect);
        }
        if self.is_party_dead() {
            self.completion_state = GameCompletionState::PartyDefeated;
            script.narrate("The party has fallen.");
            log::info!("party defeated at tick {}", self.clock);
        }

        Ok(StepReport { script, awaiting_input })
    }

    /// One exploration tick: the leader steps, nearby monsters act, and
    /// combat begins if an enemy threatens.
    fn explore(&mut self, script: &mut Script) -> WarbandResult<bool> {
        let leader = self.leader;
        let has_goal = self
            .region
            .mobile(leader)
            .and_then(|m| m.hero_state())
            .map(|s| s.goal.is_some())
            .unwrap_or(false);
        if !has_goal {
            return Ok(true);
        }

        if let Some(hero) = self.region.mobile_mut(leader) {
            hero.movement_points = 1;
        }
        advance_hero(&mut self.region, leader, self.clock, &mut self.rng, script, &self.config)?;
        self.clock += self.config.exploration_tick;
        gather_party(&mut self.region, &self.party, leader);

        let Some(origin) = self.region.mobile(leader).map(|m| m.cell) else {
            return Ok(false);
        };
        let nearby: Vec<MobileId> = self
            .region
            .mobiles()
            .filter(|m| m.is_monster() && m.is_alive())
            .filter(|m| m.cell.diagonal_distance(origin) <= self.config.idle_range)
            .map(|m| m.id)
            .collect();
        for id in nearby {
            self.run_monster(id, script)?;
        }

        for mobile in self.region.mobiles_mut() {
            mobile.expire_conditions(self.clock);
        }
        self.region.purge_dead();
        self.choose_leader();
        if let Some(cell) = self.region.mobile(self.leader).map(|m| m.cell) {
            self.region.reveal_from(cell, self.config.sight_radius);
        }

        if enemy_threatens(&self.region, &self.party, self.config.combat_range) {
            self.enter_combat(script);
        }
        Ok(false)
    }

    /// One combat drive: the front actor of the move order takes its turn,
    /// or waits for a goal.
    fn fight(&mut self, script: &mut Script) -> WarbandResult<bool> {
        let actor = loop {
            for id in self.region.purge_dead() {
                self.move_order.remove(id);
            }
            self.choose_leader();
            if self.is_party_dead() {
                return Ok(false);
            }
            if self.move_order.is_empty() {
                self.begin_round(script);
                continue;
            }
            match self.move_order.front() {
                Some(id) if self.region.mobile(id).map(|m| m.is_alive()).unwrap_or(false) => break id,
                _ => {
                    self.move_order.pop();
                }
            }
        };

        let (is_hero, is_monster, has_goal) = {
            let mobile = self.region.expect_mobile(actor)?;
            let has_goal = mobile.hero_state().map(|s| s.goal.is_some()).unwrap_or(false);
            (mobile.is_hero(), mobile.is_monster(), has_goal)
        };

        if is_hero {
            if !has_goal {
                return Ok(true);
            }
            let complete = advance_hero(&mut self.region, actor, self.clock, &mut self.rng, script, &self.config)?;
            if !complete {
                return Ok(true);
            }
        } else if is_monster {
            self.run_monster(actor, script)?;
        }
        self.move_order.pop();
        Ok(false)
    }

    fn run_monster(&mut self, id: MobileId, script: &mut Script) -> WarbandResult<()> {
        let Some(mobile) = self.region.mobile_mut(id) else {
            return Ok(());
        };
        mobile.refresh_movement_points(self.clock);
        let Some(behavior) = mobile.monster_state().map(|s| s.behavior.clone()) else {
            return Ok(());
        };
        behavior.run(&mut self.region, id, self.clock, &mut self.rng, script)
    }

    /// Closes a combat round and opens the next.
    fn begin_round(&mut self, script: &mut Script) {
        self.clock += self.config.combat_tick;
        self.statistics.combat_rounds += 1;
        tick_conditions(&mut self.region, self.clock, script);
        for id in self.region.purge_dead() {
            self.move_order.remove(id);
        }
        self.move_order
            .rebuild(&self.region, &self.party, self.config.idle_range);
        self.refresh_queue();
        log::debug!("round begins at tick {} with {} actors", self.clock, self.move_order.len());
    }

    fn refresh_queue(&mut self) {
        let now = self.clock;
        let queued: Vec<MobileId> = self.move_order.iter().copied().collect();
        for id in queued {
            if let Some(mobile) = self.region.mobile_mut(id) {
                mobile.refresh_movement_points(now);
            }
        }
    }

    fn choose_leader(&mut self) {
        let alive = |id: MobileId| self.region.mobile(id).map(|m| m.is_alive()).unwrap_or(false);
        if alive(self.leader) {
            return;
        }
        if let Some(&next) = self.party.iter().find(|&&id| alive(id)) {
            log::info!("{} takes the lead", next);
            self.leader = next;
            // Followers travel hidden on the leader's cell.
            if let Some(mobile) = self.region.mobile_mut(next) {
                mobile.visible = true;
            }
        }
    }

    fn clear_goals(&mut self) {
        for &id in &self.party {
            if let Some(state) = self.region.mobile_mut(id).and_then(|m| m.hero_state_mut()) {
                state.clear_goal();
            }
        }
    }

    fn enter_combat(&mut self, script: &mut Script) {
        log::info!("combat begins at tick {}", self.clock);
        self.mode = Mode::Combat;
        self.clear_goals();
        deploy_party(&mut self.region, &self.party, self.leader, script);
        self.move_order
            .rebuild(&self.region, &self.party, self.config.idle_range);
        self.refresh_queue();
        script.narrate("Combat begins!");
    }

    /// Asks to leave combat. Refused while enemies are close or the party is
    /// spread out; the mode is then unchanged.
    pub fn request_exploration(&mut self) -> WarbandResult<()> {
        if self.mode == Mode::Exploration {
            return Ok(());
        }
        let active = self.acting_member().unwrap_or(self.leader);
        if let Err(rejection) = may_leave_combat(
            &self.region,
            &self.party,
            active,
            self.config.leave_range,
            self.config.cohesion_range,
        ) {
            log::warn!("leaving combat refused: {}", rejection);
            self.pending.narrate(rejection.to_string());
            return Err(rejection.into());
        }

        log::info!("combat ends at tick {}", self.clock);
        self.mode = Mode::Exploration;
        self.move_order.clear();
        self.clear_goals();
        self.leader = active;
        gather_party(&mut self.region, &self.party, self.leader);
        self.pending.narrate("The party moves on.");
        Ok(())
    }

    /// Ends the turn of `id`, which must be the actor whose turn it is.
    pub fn skip_turn(&mut self, id: MobileId) -> WarbandResult<()> {
        let expected = self.whose_turn();
        if expected != Some(id) {
            return Err(WarbandError::TurnOutOfOrder { expected, actual: id });
        }
        if let Some(mobile) = self.region.mobile_mut(id) {
            mobile.movement_points = 0;
            if let Some(state) = mobile.hero_state_mut() {
                state.clear_goal();
            }
        }
        if self.mode == Mode::Combat {
            self.move_order.pop();
        }
        Ok(())
    }
}
