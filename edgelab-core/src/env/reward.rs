//! Step reward shaping.

use serde::{Deserialize, Serialize};

use crate::domain::ClosedTrade;
use crate::engine::Transition;

use super::action::Action;
use super::state::rolling_trade_sharpe;

/// Reward coefficients. Defaults are empirically tuned, not derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Step P&L is divided by this.
    pub pnl_divisor: f64,
    pub sharpe_weight: f64,
    /// Closed trades needed before the Sharpe bonus applies.
    pub sharpe_window: usize,
    pub win_rate_weight: f64,
    /// Drawdown (percent) is divided by this before squaring.
    pub drawdown_divisor: f64,
    /// Charged whenever a position is opened, including on reversal.
    pub open_cost: f64,
    /// Added when CLOSE realizes a winning trade.
    pub close_win_bonus: f64,
    /// Subtracted when CLOSE realizes a losing trade.
    pub close_loss_penalty: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            pnl_divisor: 100.0,
            sharpe_weight: 0.5,
            sharpe_window: 10,
            win_rate_weight: 0.1,
            drawdown_divisor: 100.0,
            open_cost: 0.05,
            close_win_bonus: 1.0,
            close_loss_penalty: 0.5,
        }
    }
}

/// Individual reward terms for one step. `total()` is the reward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub pnl: f64,
    pub sharpe_bonus: f64,
    pub win_rate_bonus: f64,
    pub drawdown_penalty: f64,
    pub open_cost: f64,
    pub close_bonus: f64,
}

impl RewardBreakdown {
    pub fn total(&self) -> f64 {
        self.pnl + self.sharpe_bonus + self.win_rate_bonus - self.drawdown_penalty - self.open_cost
            + self.close_bonus
    }
}

/// Everything the reward needs to know about one committed step.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub action: Action,
    pub transition: &'a Transition,
    /// P&L of the position held into the step, over the price move of the step.
    pub step_pnl: f64,
    /// Current drawdown in percent, after the step.
    pub drawdown: f64,
    /// All trades closed this session, including any closed by this step.
    pub trades: &'a [ClosedTrade],
}

impl RewardWeights {
    pub fn compute(&self, ctx: &StepContext<'_>) -> RewardBreakdown {
        let pnl = if self.pnl_divisor != 0.0 {
            ctx.step_pnl / self.pnl_divisor
        } else {
            0.0
        };

        let sharpe_bonus = rolling_trade_sharpe(ctx.trades, self.sharpe_window)
            .map(|s| s * self.sharpe_weight)
            .unwrap_or(0.0);

        let win_rate_bonus = session_win_rate(ctx.trades) * self.win_rate_weight;

        let dd = if self.drawdown_divisor > 0.0 {
            ctx.drawdown / self.drawdown_divisor
        } else {
            0.0
        };

        let open_cost = if ctx.transition.opened_position() {
            self.open_cost
        } else {
            0.0
        };

        let close_bonus = match (ctx.action, ctx.transition) {
            (Action::Close, Transition::Closed(trade)) if trade.is_winner() => self.close_win_bonus,
            (Action::Close, Transition::Closed(trade)) if trade.is_loser() => {
                -self.close_loss_penalty
            }
            _ => 0.0,
        };

        RewardBreakdown {
            pnl,
            sharpe_bonus,
            win_rate_bonus,
            drawdown_penalty: dd * dd,
            open_cost,
            close_bonus,
        }
    }
}

/// Winners over decided trades (winners + losers). Breakeven trades do not count.
pub fn session_win_rate(trades: &[ClosedTrade]) -> f64 {
    let wins = trades.iter().filter(|t| t.is_winner()).count();
    let losses = trades.iter().filter(|t| t.is_loser()).count();
    if wins + losses == 0 {
        0.0
    } else {
        wins as f64 / (wins + losses) as f64
    }
}
