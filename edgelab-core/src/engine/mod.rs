//! Simulation engine: the position lifecycle shared by the backtest driver
//! and the decision environment.

pub mod tracker;

pub use tracker::{PositionTracker, Transition, DEFAULT_POSITION_SIZE};
