//! Domain types for EdgeLab

pub mod candle;
pub mod position;
pub mod signal;
pub mod trade;

pub use candle::{candles_from_closes, filter_range, validate_series, Candle, CandleError};
pub use position::Position;
pub use signal::{Direction, Signal, SignalDecision};
pub use trade::{ClosedTrade, EquityPoint};
