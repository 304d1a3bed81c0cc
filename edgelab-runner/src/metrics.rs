//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar out.
//! Degenerate inputs (no trades, constant equity, zero deviation) give 0.0,
//! never NaN and never an error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use edgelab_core::domain::{ClosedTrade, EquityPoint};
use edgelab_core::stats::{mean, population_std};

/// Periods per year used to annualize per-step returns.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate subtracted in Sharpe and Sortino.
pub const RISK_FREE_RATE: f64 = 0.02;

/// Aggregate performance metrics for a single backtest run.
///
/// Field names are part of the export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_profit: f64,
    pub avg_profit: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    /// Percent.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub final_equity: f64,
    /// Percent.
    pub return_pct: f64,
}

impl Metrics {
    /// Baseline for a run that never traded.
    pub fn empty(initial_capital: f64) -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            total_profit: 0.0,
            avg_profit: 0.0,
            avg_win: 0.0,
            avg_loss: 0.0,
            profit_factor: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            calmar_ratio: 0.0,
            final_equity: initial_capital,
            return_pct: 0.0,
        }
    }

    /// Compute all metrics from closed trades and the equity curve.
    pub fn compute(trades: &[ClosedTrade], equity: &[EquityPoint], initial_capital: f64) -> Self {
        if trades.is_empty() {
            return Self::empty(initial_capital);
        }

        let curve: Vec<f64> = equity.iter().map(|p| p.equity).collect();
        let returns = period_returns(&curve);
        let max_drawdown = max_drawdown(&curve);
        let final_equity = curve.last().copied().unwrap_or(initial_capital);

        let wins: Vec<f64> = trades.iter().filter(|t| t.is_winner()).map(|t| t.profit).collect();
        let losses: Vec<f64> = trades.iter().filter(|t| t.is_loser()).map(|t| t.profit).collect();
        let profits: Vec<f64> = trades.iter().map(|t| t.profit).collect();

        Self {
            total_trades: trades.len(),
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate: win_rate(trades),
            total_profit: profits.iter().sum(),
            avg_profit: mean(&profits),
            avg_win: mean(&wins),
            avg_loss: mean(&losses),
            profit_factor: profit_factor(trades),
            max_drawdown,
            sharpe_ratio: sharpe_ratio(&returns),
            sortino_ratio: sortino_ratio(&returns),
            calmar_ratio: calmar_ratio(&returns, max_drawdown),
            final_equity,
            return_pct: return_pct(final_equity, initial_capital),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Winning trades over all trades. 0.0 with no trades.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

/// |gross profit / gross loss|. 0.0 when there are no losing trades.
pub fn profit_factor(trades: &[ClosedTrade]) -> f64 {
    let gross_loss: f64 = trades.iter().filter(|t| t.is_loser()).map(|t| t.profit).sum();
    if gross_loss == 0.0 {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.is_winner()).map(|t| t.profit).sum();
    (gross_profit / gross_loss).abs()
}

/// Maximum peak-to-trough drawdown in percent (non-negative).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak * 100.0);
        }
    }
    max_dd
}

/// Simple per-step returns: (eq[t] - eq[t-1]) / eq[t-1]. Steps from a
/// non-positive equity are skipped.
pub fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Mean per-step return × periods per year.
pub fn annualized_return(returns: &[f64]) -> f64 {
    mean(returns) * PERIODS_PER_YEAR
}

/// Annualized Sharpe: (mean×252 − rf) / (std×√252). 0.0 if std is 0.
pub fn sharpe_ratio(returns: &[f64]) -> f64 {
    excess_over(returns, population_std(returns))
}

/// Like Sharpe, but the deviation is taken over negative returns only.
///
/// No negative returns falls back to Sharpe; a zero downside deviation is 0.0.
pub fn sortino_ratio(returns: &[f64]) -> f64 {
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if downside.is_empty() {
        return sharpe_ratio(returns);
    }
    excess_over(returns, population_std(&downside))
}

fn excess_over(returns: &[f64], std: f64) -> f64 {
    if returns.is_empty() || std <= 0.0 || !std.is_finite() {
        return 0.0;
    }
    let annual_std = std * PERIODS_PER_YEAR.sqrt();
    (annualized_return(returns) - RISK_FREE_RATE) / annual_std
}

/// Annualized return / (max drawdown / 100). 0.0 when max drawdown is 0.
pub fn calmar_ratio(returns: &[f64], max_drawdown_pct: f64) -> f64 {
    if max_drawdown_pct <= 0.0 {
        return 0.0;
    }
    annualized_return(returns) / (max_drawdown_pct / 100.0)
}

/// (final − initial) / initial × 100. 0.0 for non-positive capital.
pub fn return_pct(final_equity: f64, initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_equity - initial_capital) / initial_capital * 100.0
}

// ─── Metric selector ────────────────────────────────────────────────

/// One of the fifteen metric fields, used to pick an optimization target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricField {
    TotalTrades,
    WinningTrades,
    LosingTrades,
    WinRate,
    TotalProfit,
    AvgProfit,
    AvgWin,
    AvgLoss,
    ProfitFactor,
    MaxDrawdown,
    #[default]
    SharpeRatio,
    SortinoRatio,
    CalmarRatio,
    FinalEquity,
    ReturnPct,
}

impl MetricField {
    pub const ALL: [MetricField; 15] = [
        MetricField::TotalTrades,
        MetricField::WinningTrades,
        MetricField::LosingTrades,
        MetricField::WinRate,
        MetricField::TotalProfit,
        MetricField::AvgProfit,
        MetricField::AvgWin,
        MetricField::AvgLoss,
        MetricField::ProfitFactor,
        MetricField::MaxDrawdown,
        MetricField::SharpeRatio,
        MetricField::SortinoRatio,
        MetricField::CalmarRatio,
        MetricField::FinalEquity,
        MetricField::ReturnPct,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TotalTrades => "total_trades",
            Self::WinningTrades => "winning_trades",
            Self::LosingTrades => "losing_trades",
            Self::WinRate => "win_rate",
            Self::TotalProfit => "total_profit",
            Self::AvgProfit => "avg_profit",
            Self::AvgWin => "avg_win",
            Self::AvgLoss => "avg_loss",
            Self::ProfitFactor => "profit_factor",
            Self::MaxDrawdown => "max_drawdown",
            Self::SharpeRatio => "sharpe_ratio",
            Self::SortinoRatio => "sortino_ratio",
            Self::CalmarRatio => "calmar_ratio",
            Self::FinalEquity => "final_equity",
            Self::ReturnPct => "return_pct",
        }
    }

    /// Extract the field's value from a `Metrics` snapshot.
    pub fn extract(&self, m: &Metrics) -> f64 {
        match self {
            Self::TotalTrades => m.total_trades as f64,
            Self::WinningTrades => m.winning_trades as f64,
            Self::LosingTrades => m.losing_trades as f64,
            Self::WinRate => m.win_rate,
            Self::TotalProfit => m.total_profit,
            Self::AvgProfit => m.avg_profit,
            Self::AvgWin => m.avg_win,
            Self::AvgLoss => m.avg_loss,
            Self::ProfitFactor => m.profit_factor,
            Self::MaxDrawdown => m.max_drawdown,
            Self::SharpeRatio => m.sharpe_ratio,
            Self::SortinoRatio => m.sortino_ratio,
            Self::CalmarRatio => m.calmar_ratio,
            Self::FinalEquity => m.final_equity,
            Self::ReturnPct => m.return_pct,
        }
    }

    /// Whether higher values are better. Only max drawdown is lower-is-better.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }

    /// True if `a` is strictly better than `b`. Ties are not improvements.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.is_higher_better() {
            a > b
        } else {
            a < b
        }
    }
}

impl fmt::Display for MetricField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric field: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for MetricField {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}
