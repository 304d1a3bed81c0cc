//! Adaptive decision environment: the tracker's position and equity
//! mechanics exposed as an observe / act / reward loop.

pub mod action;
pub mod environment;
pub mod reward;
pub mod state;

pub use action::Action;
pub use environment::{DecisionEnvironment, EnvConfig, StepInfo, StepOutcome};
pub use reward::{session_win_rate, RewardBreakdown, RewardWeights, StepContext};
pub use state::{
    rolling_trade_sharpe, rolling_win_rate, EnvironmentState, NormalizationBounds, RawFeatures,
    STATE_FEATURES,
};
