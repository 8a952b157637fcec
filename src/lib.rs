//! # Warband
//!
//! The simulation core of a tile-grid tactical RPG: a party of
//! player-controlled combatants and autonomous monsters share a rectangular
//! map, move under turn discipline, and settle their differences in melee and
//! ranged combat.
//!
//! ## Architecture Overview
//!
//! The crate is layered from the grid upward:
//!
//! - **Grid & Visibility**: cells, terrain, A* routing and line of sight
//! - **Avoidance Policy**: per-mobile passability assessors
//! - **Movement**: step heuristics, composite movement and goal resolution
//! - **AI**: the monster posture state machine and alert broadcast
//! - **Scheduler & Combat**: exploration/combat modes, the move order and
//!   attack resolution
//!
//! ## Effects
//!
//! Every state change is applied immediately and recorded as an [`Effect`]
//! in a [`Script`]. A driver calls [`Simulation::step`], then plays the
//! returned script back however it likes; the core never renders.

pub mod ai;
pub mod combat;
pub mod game;
pub mod movement;
pub mod utils;

// Core module re-exports
pub use combat::*;
pub use game::*;
pub use movement::*;
pub use utils::*;

pub use ai::{AlertRule, Behavior, BehaviorProfile, BehaviorTable, Posture, Strategy};

/// Core error type for the Warband engine.
#[derive(thiserror::Error, Debug)]
pub enum WarbandError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A map or region could not be built
    #[error("Invalid map: {0}")]
    InvalidMap(String),

    /// Simulation state is invalid
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// No mobile with this id is in the region
    #[error("Unknown mobile {0}")]
    UnknownMobile(MobileId),

    /// Someone other than the front actor tried to act.
    #[error("Turn out of order: {actual} acted, expected {expected:?}")]
    TurnOutOfOrder {
        expected: Option<MobileId>,
        actual: MobileId,
    },

    /// A movement goal was refused
    #[error(transparent)]
    Goal(#[from] GoalRejection),

    /// A mode change was refused
    #[error(transparent)]
    Mode(#[from] ModeRejection),
}

/// Result type used throughout the Warband codebase.
pub type WarbandResult<T> = Result<T, WarbandError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation configuration defaults.
pub mod config {
    /// Movement points a mobile gets per turn
    pub const DEFAULT_MOVEMENT_POINTS: u32 = 6;

    /// Awake enemies this close to the party start combat
    pub const COMBAT_RANGE: u32 = 6;

    /// Combat can't be left with awake enemies this close
    pub const LEAVE_RANGE: u32 = 4;

    /// Party members must stay this close together to leave combat
    pub const COHESION_RANGE: u32 = 5;

    /// Monsters farther than this from the party stay idle
    pub const IDLE_RANGE: u32 = 12;

    /// Distance at which a talkable neutral can be addressed
    pub const TALK_RANGE: u32 = 2;

    /// Longest route a goal may take without the debug override
    pub const MAX_ROUTE_LENGTH: usize = 40;

    /// Clock ticks per combat round
    pub const COMBAT_TICK: u64 = 10;

    /// Clock ticks per exploration step
    pub const EXPLORATION_TICK: u64 = 1;

    /// How far the leader reveals the map
    pub const SIGHT_RADIUS: u32 = 8;
}
