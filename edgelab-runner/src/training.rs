//! Training orchestration for adaptive policies.
//!
//! The orchestrator owns the episode loop: observe → act → step → learn, with
//! resets at episode boundaries. It keeps the last `sharpe_window` episode
//! returns and, every `sharpe_check_interval` steps once that buffer is full,
//! stops early when `mean / std` of the buffer reaches the target.
//!
//! Checkpoints land under `<model_root>/<version>/`:
//! - `checkpoint_ep<N>_<symbol>` every `checkpoint_interval` steps
//!   (N = episodes completed so far)
//! - `best_model_<symbol>` whenever an episode return beats the running best
//! - `final_model_<symbol>` when training ends
//!
//! A saved model can be loaded back with [`PolicyOptimizer::restore`] to resume
//! training. [`TrainingOrchestrator::train_all`] trains one policy per symbol;
//! a symbol that fails is logged and skipped.
//!
//! The learning algorithm itself sits behind [`PolicyOptimizer`].

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use edgelab_core::env::{Action, DecisionEnvironment, EnvironmentState};
use edgelab_core::stats::mean_over_std;

// ─── Policy seam ─────────────────────────────────────────────────────

/// One environment step as seen by a learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub state: EnvironmentState,
    pub action: Action,
    pub reward: f64,
    pub next_state: EnvironmentState,
    pub terminated: bool,
    pub truncated: bool,
}

impl Transition {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// A pluggable decision policy with its own update rule.
pub trait PolicyOptimizer: Send {
    fn name(&self) -> &str;

    /// Choose an action for `state`.
    fn observe(&mut self, state: &EnvironmentState) -> Action;

    /// Update from one committed step.
    fn learn(&mut self, transition: &Transition) -> anyhow::Result<()>;

    /// Persist the policy to `path`.
    fn checkpoint(&self, path: &Path) -> anyhow::Result<()>;

    /// Replace this policy's state with a checkpoint written by `checkpoint`.
    fn restore(&mut self, path: &Path) -> anyhow::Result<()> {
        bail!(
            "policy '{}' cannot restore from {}",
            self.name(),
            path.display()
        )
    }
}

/// Registered policy kinds.
pub const POLICY_KINDS: &[&str] = &["random"];

/// Build a registered policy by kind.
pub fn create_policy(kind: &str, seed: u64) -> Result<Box<dyn PolicyOptimizer>, TrainingError> {
    match kind {
        "random" => Ok(Box::new(RandomPolicy::new(seed))),
        other => Err(TrainingError::UnknownPolicy(other.to_string())),
    }
}

// ─── Reference policy ────────────────────────────────────────────────

/// Uniform random actions from a seeded RNG. Does not learn; it only counts
/// what it has seen, which is what its checkpoint records.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    seed: u64,
    rng: StdRng,
    transitions: u64,
    action_counts: [u64; Action::COUNT],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomPolicySnapshot {
    pub policy: String,
    pub seed: u64,
    pub transitions: u64,
    /// Indexed like `Action::ALL`.
    pub action_counts: [u64; Action::COUNT],
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            transitions: 0,
            action_counts: [0; Action::COUNT],
        }
    }

    /// Rebuild a policy from a snapshot. The RNG is replayed past the
    /// recorded transitions, so a resumed run draws the same actions an
    /// uninterrupted one would have.
    pub fn from_snapshot(snapshot: &RandomPolicySnapshot) -> anyhow::Result<Self> {
        if snapshot.policy != "random" {
            bail!("checkpoint is for policy '{}', not 'random'", snapshot.policy);
        }
        let mut policy = Self::new(snapshot.seed);
        for _ in 0..snapshot.transitions {
            let _ = policy.rng.gen_range(0..Action::COUNT);
        }
        policy.transitions = snapshot.transitions;
        policy.action_counts = snapshot.action_counts;
        Ok(policy)
    }

    pub fn from_checkpoint(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading policy checkpoint {}", path.display()))?;
        let snapshot: RandomPolicySnapshot = serde_json::from_str(&text)
            .with_context(|| format!("parsing policy checkpoint {}", path.display()))?;
        Self::from_snapshot(&snapshot)
    }

    pub fn snapshot(&self) -> RandomPolicySnapshot {
        RandomPolicySnapshot {
            policy: self.name().to_string(),
            seed: self.seed,
            transitions: self.transitions,
            action_counts: self.action_counts,
        }
    }
}

impl PolicyOptimizer for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn observe(&mut self, _state: &EnvironmentState) -> Action {
        Action::ALL[self.rng.gen_range(0..Action::COUNT)]
    }

    fn learn(&mut self, transition: &Transition) -> anyhow::Result<()> {
        self.transitions += 1;
        self.action_counts[transition.action.index()] += 1;
        Ok(())
    }

    fn checkpoint(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, json)
            .with_context(|| format!("writing policy checkpoint to {}", path.display()))
    }

    fn restore(&mut self, path: &Path) -> anyhow::Result<()> {
        *self = Self::from_checkpoint(path)?;
        info!(
            path = %path.display(),
            transitions = self.transitions,
            "random policy restored"
        );
        Ok(())
    }
}

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub model_root: PathBuf,
    pub version: String,
    pub symbol: String,
    pub policy: String,
    pub total_timesteps: u64,
    pub checkpoint_interval: u64,
    pub sharpe_check_interval: u64,
    /// Episode returns kept for the early-stopping Sharpe.
    pub sharpe_window: usize,
    pub sharpe_target: f64,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model_root: PathBuf::from("models"),
            version: "v1".to_string(),
            symbol: "XAUUSD".to_string(),
            policy: "random".to_string(),
            total_timesteps: 50_000,
            checkpoint_interval: 10_000,
            sharpe_check_interval: 5_000,
            sharpe_window: 30,
            sharpe_target: 1.0,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), TrainingError> {
        let invalid = |msg: &str| Err(TrainingError::InvalidConfig(msg.to_string()));
        if self.checkpoint_interval == 0 {
            return invalid("checkpoint_interval must be positive");
        }
        if self.sharpe_check_interval == 0 {
            return invalid("sharpe_check_interval must be positive");
        }
        if self.sharpe_window == 0 {
            return invalid("sharpe_window must be positive");
        }
        if self.version.is_empty() || self.symbol.is_empty() {
            return invalid("version and symbol must be non-empty");
        }
        if !self.sharpe_target.is_finite() {
            return invalid("sharpe_target must be finite");
        }
        Ok(())
    }

    pub fn model_dir(&self) -> PathBuf {
        self.model_root.join(&self.version)
    }

    pub fn checkpoint_path(&self, episodes: u64) -> PathBuf {
        self.model_dir()
            .join(format!("checkpoint_ep{episodes}_{}", self.symbol))
    }

    pub fn best_model_path(&self) -> PathBuf {
        self.model_dir().join(format!("best_model_{}", self.symbol))
    }

    pub fn final_model_path(&self) -> PathBuf {
        self.model_dir().join(format!("final_model_{}", self.symbol))
    }
}

// ─── Errors and report ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("unknown policy kind: {0}")]
    UnknownPolicy(String),

    #[error("invalid training config: {0}")]
    InvalidConfig(String),

    #[error("environment has no steps ({candles} candles, lookback {lookback})")]
    EmptyEpisode { candles: usize, lookback: usize },

    #[error("cannot create model directory {path}: {source}")]
    ModelDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Policy(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Ran all `total_timesteps`.
    Completed,
    /// Rolling Sharpe reached the target.
    SharpeTarget,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub steps: u64,
    pub episodes: u64,
    pub best_return: Option<f64>,
    /// Most recent early-stopping Sharpe, if a check ran.
    pub last_sharpe: Option<f64>,
    pub best_sharpe: Option<f64>,
    pub stop_reason: StopReason,
    pub final_model: PathBuf,
}

/// Outcome of [`TrainingOrchestrator::train_all`].
#[derive(Debug, Default)]
pub struct MultiSymbolReport {
    /// Symbols that trained, in input order.
    pub trained: Vec<(String, TrainingReport)>,
    /// Symbols that failed, with the rendered error.
    pub failed: Vec<(String, String)>,
}

// ─── Orchestrator ────────────────────────────────────────────────────

pub struct TrainingOrchestrator {
    config: TrainingConfig,
}

impl TrainingOrchestrator {
    pub fn new(config: TrainingConfig) -> Result<Self, TrainingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train `policy` on `env` until the step budget, the Sharpe target, or
    /// cancellation. `cancel` is polled once per step.
    pub fn run(
        &self,
        env: &mut DecisionEnvironment,
        policy: &mut dyn PolicyOptimizer,
        cancel: &AtomicBool,
    ) -> Result<TrainingReport, TrainingError> {
        let cfg = &self.config;
        let dir = cfg.model_dir();
        std::fs::create_dir_all(&dir).map_err(|source| TrainingError::ModelDir {
            path: dir.display().to_string(),
            source,
        })?;

        let mut state = env.reset();
        if env.is_finished() {
            return Err(TrainingError::EmptyEpisode {
                candles: env.candles().len(),
                lookback: env.config().lookback,
            });
        }

        info!(
            policy = policy.name(),
            symbol = cfg.symbol.as_str(),
            total_timesteps = cfg.total_timesteps,
            sharpe_target = cfg.sharpe_target,
            "training started"
        );

        let mut steps = 0u64;
        let mut episodes = 0u64;
        let mut episode_return = 0.0;
        let mut returns: VecDeque<f64> = VecDeque::with_capacity(cfg.sharpe_window);
        let mut best_return: Option<f64> = None;
        let mut last_sharpe: Option<f64> = None;
        let mut best_sharpe: Option<f64> = None;
        let mut stop_reason = StopReason::Completed;

        while steps < cfg.total_timesteps {
            if cancel.load(Ordering::Relaxed) {
                stop_reason = StopReason::Cancelled;
                break;
            }

            let action = policy.observe(&state);
            let outcome = env.step(action);
            let transition = Transition {
                state,
                action,
                reward: outcome.reward,
                next_state: outcome.state,
                terminated: outcome.terminated,
                truncated: outcome.truncated,
            };
            policy.learn(&transition)?;

            steps += 1;
            episode_return += outcome.reward;
            state = outcome.state;

            if transition.done() {
                episodes += 1;
                if returns.len() == cfg.sharpe_window {
                    returns.pop_front();
                }
                returns.push_back(episode_return);

                if best_return.map_or(true, |best| episode_return > best) {
                    best_return = Some(episode_return);
                    save_quietly(policy, &cfg.best_model_path(), "best model");
                    debug!(episode = episodes, episode_return, "new best episode");
                }

                episode_return = 0.0;
                state = env.reset();
            }

            if steps % cfg.checkpoint_interval == 0 {
                save_quietly(policy, &cfg.checkpoint_path(episodes), "checkpoint");
            }

            if steps % cfg.sharpe_check_interval == 0 && returns.len() >= cfg.sharpe_window {
                let sharpe = mean_over_std(returns.make_contiguous());
                last_sharpe = Some(sharpe);
                if best_sharpe.map_or(true, |best| sharpe > best) {
                    best_sharpe = Some(sharpe);
                    info!(step = steps, sharpe, "new best rolling sharpe");
                }
                if sharpe >= cfg.sharpe_target {
                    info!(
                        step = steps,
                        sharpe,
                        sharpe_target = cfg.sharpe_target,
                        "sharpe target reached"
                    );
                    stop_reason = StopReason::SharpeTarget;
                    break;
                }
            }
        }

        let final_model = cfg.final_model_path();
        policy
            .checkpoint(&final_model)
            .with_context(|| format!("saving final model to {}", final_model.display()))?;

        info!(
            steps,
            episodes,
            stop_reason = ?stop_reason,
            final_model = %final_model.display(),
            "training finished"
        );

        Ok(TrainingReport {
            steps,
            episodes,
            best_return,
            last_sharpe,
            best_sharpe,
            stop_reason,
            final_model,
        })
    }
}

impl TrainingOrchestrator {
    /// Train a fresh `config.policy` on each (symbol, environment) pair.
    ///
    /// Every symbol gets its own checkpoint names. A failing symbol is logged
    /// and recorded; the remaining symbols still train. Symbols not yet
    /// started when `cancel` is set are skipped.
    pub fn train_all(
        &self,
        runs: Vec<(String, DecisionEnvironment)>,
        cancel: &AtomicBool,
    ) -> MultiSymbolReport {
        info!(symbols = runs.len(), "multi-symbol training started");
        let mut report = MultiSymbolReport::default();

        for (symbol, mut env) in runs {
            if cancel.load(Ordering::Relaxed) {
                warn!(symbol = symbol.as_str(), "cancelled before training");
                report.failed.push((symbol, "cancelled".to_string()));
                continue;
            }

            let config = TrainingConfig {
                symbol: symbol.clone(),
                ..self.config.clone()
            };
            let outcome = TrainingOrchestrator::new(config).and_then(|orchestrator| {
                let mut policy = create_policy(&orchestrator.config.policy, orchestrator.config.seed)?;
                orchestrator.run(&mut env, policy.as_mut(), cancel)
            });

            match outcome {
                Ok(r) => report.trained.push((symbol, r)),
                Err(e) => {
                    error!(symbol = symbol.as_str(), error = %e, "training failed");
                    report.failed.push((symbol, format!("{e:#}")));
                }
            }
        }

        info!(
            trained = report.trained.len(),
            failed = report.failed.len(),
            "multi-symbol training finished"
        );
        report
    }
}

/// Periodic saves must not abort training.
fn save_quietly(policy: &dyn PolicyOptimizer, path: &Path, what: &str) {
    match policy.checkpoint(path) {
        Ok(()) => debug!(path = %path.display(), what, "saved"),
        Err(e) => warn!(path = %path.display(), what, error = %e, "checkpoint failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_follow_naming_scheme() {
        let cfg = TrainingConfig::default();
        assert_eq!(
            cfg.checkpoint_path(7),
            PathBuf::from("models/v1/checkpoint_ep7_XAUUSD")
        );
        assert_eq!(cfg.best_model_path(), PathBuf::from("models/v1/best_model_XAUUSD"));
        assert_eq!(cfg.final_model_path(), PathBuf::from("models/v1/final_model_XAUUSD"));
    }

    #[test]
    fn snapshot_rebuild_continues_the_action_stream() {
        let state = EnvironmentState::neutral(&edgelab_core::env::NormalizationBounds::default());
        let mut original = RandomPolicy::new(9);
        let first: Vec<Action> = (0..25).map(|_| original.observe(&state)).collect();
        for &action in &first {
            original.action_counts[action.index()] += 1;
        }
        original.transitions = first.len() as u64;

        let mut resumed = RandomPolicy::from_snapshot(&original.snapshot()).unwrap();
        assert_eq!(resumed.snapshot(), original.snapshot());
        let next: Vec<Action> = (0..10).map(|_| original.observe(&state)).collect();
        let replayed: Vec<Action> = (0..10).map(|_| resumed.observe(&state)).collect();
        assert_eq!(next, replayed);
    }

    #[test]
    fn snapshot_for_another_policy_is_rejected() {
        let snapshot = RandomPolicySnapshot {
            policy: "ppo".to_string(),
            ..RandomPolicy::new(1).snapshot()
        };
        assert!(RandomPolicy::from_snapshot(&snapshot).is_err());
    }

    #[test]
    fn zero_intervals_are_rejected() {
        let cfg = TrainingConfig {
            checkpoint_interval: 0,
            ..Default::default()
        };
        assert!(matches!(
            TrainingOrchestrator::new(cfg),
            Err(TrainingError::InvalidConfig(_))
        ));

        let cfg = TrainingConfig {
            sharpe_window: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn policy_factory() {
        assert_eq!(create_policy("random", 1).unwrap().name(), "random");
        assert!(matches!(
            create_policy("ppo", 1),
            Err(TrainingError::UnknownPolicy(kind)) if kind == "ppo"
        ));
    }

    #[test]
    fn random_policy_is_seeded() {
        let state = EnvironmentState([0.5; edgelab_core::env::STATE_FEATURES]);
        let mut a = RandomPolicy::new(9);
        let mut b = RandomPolicy::new(9);
        let xs: Vec<Action> = (0..50).map(|_| a.observe(&state)).collect();
        let ys: Vec<Action> = (0..50).map(|_| b.observe(&state)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn random_policy_counts_transitions() {
        let state = EnvironmentState([0.5; edgelab_core::env::STATE_FEATURES]);
        let mut policy = RandomPolicy::new(1);
        for action in [Action::Hold, Action::Close, Action::Hold] {
            policy
                .learn(&Transition {
                    state,
                    action,
                    reward: 0.0,
                    next_state: state,
                    terminated: false,
                    truncated: false,
                })
                .unwrap();
        }
        let snap = policy.snapshot();
        assert_eq!(snap.transitions, 3);
        assert_eq!(snap.action_counts[Action::Hold.index()], 2);
        assert_eq!(snap.action_counts[Action::Close.index()], 1);
    }
}
