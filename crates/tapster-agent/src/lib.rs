//! Room tracking and heuristic action selection.
//!
//! The agent keeps a bounded history of [`Room`]s - screen contexts
//! identified by their color signature - and selects one action per step by
//! weighted-random choice over the current candidates. Weights combine
//! per-category tables, room-level exit heuristics, and a saturating
//! anti-repetition multiplier; a stagnating screen forces a reset action.

pub use self::{config::*, engine::*, room::*, tracker::*};

mod config;
mod engine;
mod room;
mod tracker;
