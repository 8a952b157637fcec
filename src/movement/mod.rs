//! # Movement Module
//!
//! Avoidance policy, single-step heuristics, composite movement routines and
//! goal resolution for player-controlled actors.

pub mod assessor;
pub mod goal;
pub mod steps;

pub use assessor::*;
pub use goal::*;
pub use steps::*;
