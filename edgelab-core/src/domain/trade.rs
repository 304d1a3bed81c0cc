//! ClosedTrade and EquityPoint: the append-only records of a simulation.

use super::signal::Direction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A completed round trip: entry → exit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub size: f64,
    pub profit: f64,
    pub entry_time: NaiveDateTime,
    /// Exit time.
    pub timestamp: NaiveDateTime,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.profit < 0.0
    }

    /// Return on the trade as a fraction of entry notional.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.size == 0.0 {
            return 0.0;
        }
        self.profit / (self.entry_price * self.size)
    }
}

/// Account value at one simulated step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}
