//! # AI Module
//!
//! The monster posture state machine, the closed set of behavior strategies
//! that drive it, and the alert broadcast protocol.
//!
//! Each monster archetype shares one immutable [`Behavior`]: a strategy plus
//! a [`BehaviorProfile`] of ranges and percentages. Posture and the alerted
//! flag live on the monster and change only through [`Behavior::run`] and
//! the alert/damage hooks.

pub mod alert;
pub mod archetypes;
pub mod behavior;

pub use alert::*;
pub use archetypes::*;
pub use behavior::*;

use serde::{Deserialize, Serialize};

/// A monster's current behavioral state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Posture {
    Sleeping,
    Wandering,
    Chasing,
    RunningAway,
    Sitting,
    Guarding,
}

impl Posture {
    /// Postures in which a monster spends its turn doing nothing.
    pub fn is_idle(self) -> bool {
        matches!(self, Posture::Sleeping | Posture::Sitting | Posture::Guarding)
    }
}
