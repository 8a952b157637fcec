//! # Effects
//!
//! The ordered effect script produced by every driven step.
//!
//! The core commits each state change as it happens and records it here; the
//! external animator plays the script back strictly in order. Nothing in this
//! module mutates game state.

use crate::{Cell, MobileId};
use serde::{Deserialize, Serialize};

/// Default lifetime of a transient marker, in animation frames.
pub const MARKER_FRAMES: u32 = 12;

/// Transient markers shown over a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerKind {
    Miss,
    Defended,
    Hit,
    Critical,
    Alert,
}

/// A single replayable state-change command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// A mobile moved between cells.
    Move {
        mobile: MobileId,
        from: Cell,
        to: Cell,
    },
    /// A feature changed state (door opened, chest emptied, trap sprung).
    ToggleFeature { cell: Cell, open: bool },
    /// Show a marker at a cell for a number of frames.
    Marker {
        cell: Cell,
        kind: MarkerKind,
        frames: u32,
    },
    /// One frame of a projectile in flight.
    Projectile { cell: Cell },
    Damage {
        mobile: MobileId,
        amount: u32,
        remaining: u32,
    },
    Heal {
        mobile: MobileId,
        amount: u32,
        remaining: u32,
    },
    /// A mobile was reduced to zero hit points.
    Death { mobile: MobileId },
    /// A mobile leaves the board.
    Remove { mobile: MobileId },
    /// A monster raised the alarm.
    Alert { source: MobileId },
    AwardExperience { mobile: MobileId, amount: u32 },
    /// The party should move on to another region.
    TransitionRegion { destination: String },
    /// Free text for the log widget.
    Narrate(String),
}

/// An ordered list of effects.
///
/// # Examples
///
/// ```
/// use warband::{Effect, Script};
///
/// let mut script = Script::new();
/// script.narrate("The goblin snarls.");
/// assert_eq!(script.len(), 1);
/// assert_eq!(script.narration().next(), Some("The goblin snarls."));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    effects: Vec<Effect>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Appends a narration line and mirrors it to the log.
    pub fn narrate(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::info!("{}", text);
        self.effects.push(Effect::Narrate(text));
    }

    pub fn append(&mut self, other: Script) {
        self.effects.extend(other.effects);
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterates the narration lines in emission order.
    pub fn narration(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::Narrate(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Index of the first effect matching the predicate.
    pub fn position(&self, predicate: impl Fn(&Effect) -> bool) -> Option<usize> {
        self.effects.iter().position(predicate)
    }
}

impl IntoIterator for Script {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.effects.into_iter()
    }
}
