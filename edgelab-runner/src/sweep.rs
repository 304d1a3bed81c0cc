//! Grid search over strategy parameters.
//!
//! The grid is an ordered list of named value lists. Combinations are the full
//! Cartesian product with the first-listed parameter varying slowest. Each
//! combination gets one backtest; the best one by the target metric wins, and
//! ties go to the earlier combination. Runs may execute in parallel, but
//! results are merged in enumeration order so scheduling never matters.

use chrono::NaiveDateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use edgelab_core::domain::Candle;
use edgelab_core::strategy::{
    create_strategy, FactoryError, ParamSet, Strategy, StrategySpec, StrategyVariant,
};

use crate::metrics::{MetricField, Metrics};
use crate::runner::Backtester;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SweepError {
    #[error("parameter grid has no parameters")]
    EmptyGrid,
    #[error("parameter '{0}' has no values")]
    EmptyValues(String),
    #[error("parameter '{0}' listed twice")]
    DuplicateParam(String),
}

// ─── Grid ────────────────────────────────────────────────────────────

/// Ordered parameter ranges: name → candidate values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    params: Vec<(String, Vec<f64>)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Listing order sets enumeration order.
    pub fn with(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.params.push((name.into(), values));
        self
    }

    pub fn params(&self) -> &[(String, Vec<f64>)] {
        &self.params
    }

    /// Number of combinations in the grid.
    pub fn size(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        self.params.iter().map(|(_, v)| v.len()).product()
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        if self.params.is_empty() {
            return Err(SweepError::EmptyGrid);
        }
        for (i, (name, values)) in self.params.iter().enumerate() {
            if values.is_empty() {
                return Err(SweepError::EmptyValues(name.clone()));
            }
            if self.params[..i].iter().any(|(n, _)| n == name) {
                return Err(SweepError::DuplicateParam(name.clone()));
            }
        }
        Ok(())
    }

    /// All combinations, first parameter slowest.
    pub fn combinations(&self) -> Vec<ParamSet> {
        let size = self.size();
        let mut out = Vec::with_capacity(size);
        let mut digits = vec![0usize; self.params.len()];

        for _ in 0..size {
            out.push(
                self.params
                    .iter()
                    .zip(&digits)
                    .map(|((name, values), &d)| (name.clone(), values[d]))
                    .collect(),
            );

            // Odometer: the last parameter ticks fastest.
            for pos in (0..digits.len()).rev() {
                digits[pos] += 1;
                if digits[pos] < self.params[pos].1.len() {
                    break;
                }
                digits[pos] = 0;
            }
        }
        out
    }
}

// ─── Results ─────────────────────────────────────────────────────────

/// One evaluated combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Position in enumeration order.
    pub index: usize,
    pub params: ParamSet,
    pub score: f64,
    pub metrics: Metrics,
}

/// A combination whose strategy could not be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub index: usize,
    pub params: ParamSet,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepResult {
    pub target: MetricField,
    pub best: Option<Candidate>,
    /// Successful combinations in enumeration order.
    pub candidates: Vec<Candidate>,
    pub failures: Vec<Failure>,
}

impl SweepResult {
    pub fn best_params(&self) -> Option<&ParamSet> {
        self.best.as_ref().map(|c| &c.params)
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best.as_ref().map(|c| c.score)
    }

    /// The `n` best candidates, best first. Ties keep enumeration order.
    pub fn top_n(&self, n: usize) -> Vec<&Candidate> {
        let mut ranked: Vec<&Candidate> = self.candidates.iter().collect();
        let target = self.target;
        ranked.sort_by(|a, b| {
            if target.is_higher_better() {
                b.score.total_cmp(&a.score)
            } else {
                a.score.total_cmp(&b.score)
            }
        });
        ranked.truncate(n);
        ranked
    }
}

// ─── Search ──────────────────────────────────────────────────────────

/// Builds strategies of one registered kind from grid combinations.
pub fn spec_factory(
    kind: &str,
) -> impl Fn(&ParamSet) -> Result<StrategyVariant, FactoryError> + Sync + '_ {
    move |params| {
        create_strategy(&StrategySpec {
            kind: kind.to_string(),
            params: params.clone(),
        })
    }
}

/// Grid-search executor.
pub struct GridSearch {
    backtester: Backtester,
    target: MetricField,
    parallel: bool,
}

impl GridSearch {
    pub fn new(backtester: Backtester, target: MetricField) -> Self {
        Self {
            backtester,
            target,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn target(&self) -> MetricField {
        self.target
    }

    /// Evaluate every combination over candles in `[start, end]`.
    pub fn run<S, F>(
        &self,
        grid: &ParamGrid,
        candles: &[Candle],
        start: NaiveDateTime,
        end: NaiveDateTime,
        factory: F,
    ) -> Result<SweepResult, SweepError>
    where
        S: Strategy,
        F: Fn(&ParamSet) -> Result<S, FactoryError> + Sync,
    {
        grid.validate()?;
        let combos = grid.combinations();

        let evaluate = |(index, params): (usize, &ParamSet)| -> Result<Candidate, Failure> {
            let strategy = factory(params).map_err(|e| Failure {
                index,
                params: params.clone(),
                error: e.to_string(),
            })?;
            let metrics = self.backtester.run(&strategy, candles, start, end).metrics();
            Ok(Candidate {
                index,
                params: params.clone(),
                score: self.target.extract(&metrics),
                metrics,
            })
        };

        let outcomes: Vec<Result<Candidate, Failure>> = if self.parallel {
            combos.par_iter().enumerate().map(evaluate).collect()
        } else {
            combos.iter().enumerate().map(evaluate).collect()
        };

        let mut best: Option<Candidate> = None;
        let mut candidates = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome {
                Ok(candidate) => {
                    let improves = best
                        .as_ref()
                        .map_or(true, |b| self.target.is_better(candidate.score, b.score));
                    if improves {
                        debug!(
                            index = candidate.index,
                            score = candidate.score,
                            params = ?candidate.params,
                            "new best combination"
                        );
                        best = Some(candidate.clone());
                    }
                    candidates.push(candidate);
                }
                Err(failure) => {
                    warn!(
                        index = failure.index,
                        params = ?failure.params,
                        error = %failure.error,
                        "skipping combination"
                    );
                    failures.push(failure);
                }
            }
        }

        info!(
            metric = %self.target,
            combinations = combos.len(),
            failed = failures.len(),
            best = ?best.as_ref().map(|b| b.score),
            "grid search complete"
        );

        Ok(SweepResult {
            target: self.target,
            best,
            candidates,
            failures,
        })
    }

    /// Like `run`, building strategies of `kind` through the factory.
    pub fn run_kind(
        &self,
        kind: &str,
        grid: &ParamGrid,
        candles: &[Candle],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<SweepResult, SweepError> {
        self.run(grid, candles, start, end, spec_factory(kind))
    }
}
