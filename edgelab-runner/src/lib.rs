//! EdgeLab Runner: backtests, metrics, parameter search, training.
//!
//! This crate builds on `edgelab-core` to provide:
//! - CSV candle loading with series validation and a dataset hash
//! - The backtest driver and on-demand performance metrics
//! - Grid search (rayon) and walk-forward validation
//! - Training orchestration behind the `PolicyOptimizer` seam
//! - TOML configuration and JSON/CSV/Markdown export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod training;
pub mod walk_forward;

pub use config::{ConfigError, EdgeLabConfig};
pub use data_loader::{dataset_hash, load_candles_csv, read_candles, LoadError};
pub use metrics::{MetricField, Metrics, UnknownMetric};
pub use runner::{BacktestResult, BacktestSettings, Backtester, SCHEMA_VERSION};
pub use sweep::{Candidate, GridSearch, ParamGrid, SweepError, SweepResult};
pub use training::{
    create_policy, MultiSymbolReport, PolicyOptimizer, RandomPolicy, StopReason, TrainingConfig, TrainingError,
    TrainingOrchestrator, TrainingReport,
};
pub use walk_forward::{run_walk_forward, WalkForwardConfig, WalkForwardReport};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn metrics_is_send_sync() {
        assert_send::<Metrics>();
        assert_sync::<Metrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn search_types_are_send_sync() {
        assert_send::<Backtester>();
        assert_sync::<Backtester>();
        assert_send::<GridSearch>();
        assert_sync::<GridSearch>();
        assert_send::<SweepResult>();
        assert_sync::<SweepResult>();
        assert_send::<WalkForwardReport>();
        assert_sync::<WalkForwardReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<EdgeLabConfig>();
        assert_sync::<EdgeLabConfig>();
        assert_send::<TrainingReport>();
        assert_sync::<TrainingReport>();
    }

    #[test]
    fn random_policy_is_send() {
        assert_send::<RandomPolicy>();
    }
}
