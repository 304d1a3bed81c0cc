use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::signal::Direction;

/// An open position. Exists only while a trade is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub direction: Direction,
    pub entry_price: f64,
    pub size: f64,
    pub entry_time: NaiveDateTime,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.direction == Direction::Buy
    }

    pub fn is_short(&self) -> bool {
        self.direction == Direction::Sell
    }

    /// `(price - entry) * size` for BUY, sign inverted for SELL.
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        self.direction.sign() * (current_price - self.entry_price) * self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(direction: Direction) -> Position {
        Position {
            direction,
            entry_price: 2000.0,
            size: 1.0,
            entry_time: NaiveDateTime::default(),
        }
    }

    #[test]
    fn long_pnl() {
        let pos = at(Direction::Buy);
        assert!(pos.is_long());
        assert_eq!(pos.unrealized_pnl(2050.0), 50.0);
        assert_eq!(pos.unrealized_pnl(1990.0), -10.0);
    }

    #[test]
    fn short_pnl_is_inverted() {
        let pos = at(Direction::Sell);
        assert!(pos.is_short());
        assert_eq!(pos.unrealized_pnl(2050.0), -50.0);
        assert_eq!(pos.unrealized_pnl(1990.0), 10.0);
    }

    #[test]
    fn pnl_scales_with_size() {
        let mut pos = at(Direction::Buy);
        pos.size = 0.25;
        assert!((pos.unrealized_pnl(2100.0) - 25.0).abs() < 1e-12);
    }
}
