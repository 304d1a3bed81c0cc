//! Position lifecycle and equity tracking.
//!
//! State machine: FLAT → OPEN(direction) → FLAT.
//!
//! - FLAT + BUY/SELL opens at the given price.
//! - OPEN + opposing signal realizes P&L, appends a `ClosedTrade`, and opens
//!   the opposite position on the same tick (no intervening FLAT step).
//! - OPEN + same direction or HOLD changes nothing; equity is re-marked.
//! - OPEN + explicit close realizes P&L and returns to FLAT.
//!
//! Equity = realized balance + unrealized P&L of the open position. Peak
//! equity is a running maximum starting at the initial capital.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{ClosedTrade, Direction, Position, Signal};

/// Default position size when the caller does not override it.
pub const DEFAULT_POSITION_SIZE: f64 = 1.0;

/// What a tracker call did to the position state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Transition {
    /// No state change.
    None,
    /// FLAT → OPEN.
    Opened(Direction),
    /// OPEN → OPEN(opposite): the old position was realized.
    Reversed {
        closed: ClosedTrade,
        opened: Direction,
    },
    /// OPEN → FLAT.
    Closed(ClosedTrade),
}

impl Transition {
    /// True when a new position was opened (plain open or reversal).
    pub fn opened_position(&self) -> bool {
        matches!(self, Transition::Opened(_) | Transition::Reversed { .. })
    }

    /// The trade realized by this transition, if any.
    pub fn closed_trade(&self) -> Option<&ClosedTrade> {
        match self {
            Transition::Reversed { closed, .. } | Transition::Closed(closed) => Some(closed),
            _ => None,
        }
    }
}

/// Owns one open-position-or-flat state plus the running equity bookkeeping.
#[derive(Debug, Clone)]
pub struct PositionTracker {
    initial_capital: f64,
    balance: f64,
    position: Option<Position>,
    trades: Vec<ClosedTrade>,
    equity: f64,
    peak_equity: f64,
    drawdown: f64,
    max_drawdown: f64,
}

impl PositionTracker {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            balance: initial_capital,
            position: None,
            trades: Vec::new(),
            equity: initial_capital,
            peak_equity: initial_capital,
            drawdown: 0.0,
            max_drawdown: 0.0,
        }
    }

    /// Feed a signal at the current price, then mark equity to that price.
    ///
    /// `size` is used for any position opened by this call.
    pub fn apply_signal(
        &mut self,
        signal: Signal,
        price: f64,
        timestamp: NaiveDateTime,
        size: f64,
    ) -> Transition {
        debug_assert!(size > 0.0, "position size must be positive");

        let transition = match (self.position, signal.direction()) {
            (_, None) => Transition::None,
            (None, Some(direction)) => {
                self.open(direction, price, timestamp, size);
                Transition::Opened(direction)
            }
            (Some(open), Some(direction)) if open.direction == direction => Transition::None,
            (Some(_), Some(direction)) => {
                let closed = self.realize(price, timestamp);
                self.open(direction, price, timestamp, size);
                match closed {
                    Some(closed) => Transition::Reversed {
                        closed,
                        opened: direction,
                    },
                    None => Transition::Opened(direction),
                }
            }
        };

        self.mark(price);
        transition
    }

    /// Explicitly close the open position. A no-op while FLAT.
    pub fn close(&mut self, price: f64, timestamp: NaiveDateTime) -> Transition {
        let transition = match self.realize(price, timestamp) {
            Some(closed) => Transition::Closed(closed),
            None => Transition::None,
        };
        self.mark(price);
        transition
    }

    /// End-of-data close at the last available price.
    pub fn force_close(&mut self, price: f64, timestamp: NaiveDateTime) -> Option<ClosedTrade> {
        self.close(price, timestamp).closed_trade().copied()
    }

    /// Recompute equity, peak and drawdown at `price`. Returns the new equity.
    pub fn mark(&mut self, price: f64) -> f64 {
        let unrealized = self
            .position
            .map(|p| p.unrealized_pnl(price))
            .unwrap_or(0.0);
        self.equity = self.balance + unrealized;

        if self.equity > self.peak_equity {
            self.peak_equity = self.equity;
        }
        self.drawdown = if self.peak_equity > 0.0 {
            ((self.peak_equity - self.equity) / self.peak_equity * 100.0).max(0.0)
        } else {
            0.0
        };
        if self.drawdown > self.max_drawdown {
            self.max_drawdown = self.drawdown;
        }
        self.equity
    }

    fn open(&mut self, direction: Direction, price: f64, timestamp: NaiveDateTime, size: f64) {
        self.position = Some(Position {
            direction,
            entry_price: price,
            size,
            entry_time: timestamp,
        });
    }

    fn realize(&mut self, price: f64, timestamp: NaiveDateTime) -> Option<ClosedTrade> {
        let position = self.position.take()?;
        let profit = position.unrealized_pnl(price);
        self.balance += profit;
        let trade = ClosedTrade {
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price: price,
            size: position.size,
            profit,
            entry_time: position.entry_time,
            timestamp,
        };
        self.trades.push(trade);
        Some(trade)
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    /// Realized balance (initial capital plus closed-trade profits).
    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn is_flat(&self) -> bool {
        self.position.is_none()
    }

    pub fn trades(&self) -> &[ClosedTrade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<ClosedTrade> {
        self.trades
    }

    /// Equity as of the last mark.
    pub fn equity(&self) -> f64 {
        self.equity
    }

    pub fn peak_equity(&self) -> f64 {
        self.peak_equity
    }

    /// Current drawdown from peak, in percent.
    pub fn drawdown(&self) -> f64 {
        self.drawdown
    }

    /// Largest drawdown seen over the tracker's lifetime, in percent.
    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }
}
