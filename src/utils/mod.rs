//! # Utilities Module
//!
//! Grid mathematics, line rasterization and route search.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use pathfinding::*;
