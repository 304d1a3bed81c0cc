//! EdgeLab CLI: backtest, optimize, walk-forward, and train commands.
//!
//! Commands:
//! - `backtest`: run one strategy over a CSV candle file
//! - `optimize`: grid search over strategy parameters
//! - `walk-forward`: rolling train/test validation of one strategy
//! - `train`: run the training orchestrator with a registered policy
//!
//! Every command reads candles from `--data` and an optional `--config` TOML.
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use edgelab_core::domain::{filter_range, Candle};
use edgelab_core::env::DecisionEnvironment;
use edgelab_core::strategy::{create_strategy, ParamSet, StrategySpec, STRATEGY_KINDS};
use edgelab_runner::data_loader::{load_candles_csv, parse_timestamp};
use edgelab_runner::export::{export_sweep_csv, save_artifacts};
use edgelab_runner::training::{create_policy, TrainingOrchestrator};
use edgelab_runner::{
    run_walk_forward, BacktestResult, Backtester, EdgeLabConfig, GridSearch, MetricField,
    ParamGrid,
};

#[derive(Parser)]
#[command(
    name = "edgelab",
    about = "EdgeLab: strategy backtesting, parameter search and policy training"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command.
#[derive(clap::Args)]
struct DataArgs {
    /// Candle CSV (timestamp,open,high,low,close,volume).
    #[arg(long)]
    data: PathBuf,

    /// TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start timestamp (YYYY-MM-DD or YYYY-MM-DD HH:MM:SS). Defaults to the first candle.
    #[arg(long)]
    start: Option<String>,

    /// End timestamp. Defaults to the last candle.
    #[arg(long)]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one strategy over the candle file.
    Backtest {
        #[command(flatten)]
        data: DataArgs,

        /// Strategy kind: rsi, ma_crossover.
        #[arg(long, default_value = "rsi")]
        strategy: String,

        /// Strategy parameter as name=value. Repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,

        /// Write manifest.json, trades.csv, equity.csv and report.md here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print metrics as JSON instead of the text summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Grid search over strategy parameters.
    Optimize {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "ma_crossover")]
        strategy: String,

        /// Parameter range as name=v1,v2,... Repeatable; first listed varies slowest.
        #[arg(long = "grid", required = true, value_parser = parse_range)]
        ranges: Vec<(String, Vec<f64>)>,

        /// Metric to optimize (e.g., sharpe_ratio, max_drawdown).
        #[arg(long, default_value = "sharpe_ratio")]
        target: MetricField,

        /// Disable rayon parallelism.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Number of top candidates to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Write every candidate as CSV.
        #[arg(long)]
        csv_out: Option<PathBuf>,
    },
    /// Rolling train/test validation.
    WalkForward {
        #[command(flatten)]
        data: DataArgs,

        #[arg(long, default_value = "rsi")]
        strategy: String,

        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,

        /// Override walk_forward.train_days.
        #[arg(long)]
        train_days: Option<u32>,

        /// Override walk_forward.test_days.
        #[arg(long)]
        test_days: Option<u32>,
    },
    /// Train a policy in the decision environment.
    Train {
        #[command(flatten)]
        data: DataArgs,

        /// Override training.policy.
        #[arg(long)]
        policy: Option<String>,

        /// Override training.total_timesteps.
        #[arg(long)]
        timesteps: Option<u64>,

        /// Override training.symbol.
        #[arg(long)]
        symbol: Option<String>,

        /// Resume from a saved model (e.g., models/v1/final_model_XAUUSD).
        #[arg(long)]
        resume: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backtest {
            data,
            strategy,
            params,
            output_dir,
            json,
        } => run_backtest_cmd(&data, &strategy, params, output_dir.as_deref(), json),
        Commands::Optimize {
            data,
            strategy,
            ranges,
            target,
            sequential,
            top,
            csv_out,
        } => run_optimize_cmd(
            &data,
            &strategy,
            ranges,
            target,
            sequential,
            top,
            csv_out.as_deref(),
        ),
        Commands::WalkForward {
            data,
            strategy,
            params,
            train_days,
            test_days,
        } => run_walk_forward_cmd(&data, &strategy, params, train_days, test_days),
        Commands::Train {
            data,
            policy,
            timesteps,
            symbol,
            resume,
        } => run_train_cmd(&data, policy, timesteps, symbol, resume.as_deref()),
    }
}

// ─── Argument parsing ────────────────────────────────────────────────

fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("bad value for '{name}': {e}"))?;
    Ok((name.trim().to_string(), value))
}

fn parse_range(s: &str) -> Result<(String, Vec<f64>), String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=v1,v2,..., got '{s}'"))?;
    let values = values
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("bad value '{v}' for '{name}': {e}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.trim().to_string(), values))
}

// ─── Shared setup ────────────────────────────────────────────────────

struct Session {
    config: EdgeLabConfig,
    candles: Vec<Candle>,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

fn load_session(args: &DataArgs) -> Result<Session> {
    let config = match &args.config {
        Some(path) => EdgeLabConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EdgeLabConfig::default(),
    };

    let candles = load_candles_csv(&args.data)
        .with_context(|| format!("loading candles from {}", args.data.display()))?;
    let (Some(first), Some(last)) = (candles.first(), candles.last()) else {
        bail!("no candles in {}", args.data.display());
    };

    let start = match &args.start {
        Some(s) => parse_timestamp(s).with_context(|| format!("invalid --start '{s}'"))?,
        None => first.timestamp,
    };
    let end = match &args.end {
        Some(s) => parse_timestamp(s).with_context(|| format!("invalid --end '{s}'"))?,
        None => last.timestamp,
    };
    if start > end {
        bail!("--start {start} is after --end {end}");
    }
    tracing::info!(
        path = %args.data.display(),
        candles = candles.len(),
        %start,
        %end,
        "loaded candles"
    );

    Ok(Session {
        config,
        candles,
        start,
        end,
    })
}

/// Command-line overrides bypass the file loader, so they are re-validated here.
fn apply_walk_forward_overrides(
    config: &mut EdgeLabConfig,
    train_days: Option<u32>,
    test_days: Option<u32>,
) -> Result<()> {
    if let Some(d) = train_days {
        config.walk_forward.train_days = d;
    }
    if let Some(d) = test_days {
        config.walk_forward.test_days = d;
    }
    config.validate().context("invalid walk-forward settings")
}

fn apply_training_overrides(
    config: &mut EdgeLabConfig,
    policy: Option<String>,
    timesteps: Option<u64>,
    symbol: Option<String>,
) -> Result<()> {
    if let Some(p) = policy {
        config.training.policy = p;
    }
    if let Some(t) = timesteps {
        config.training.total_timesteps = t;
    }
    if let Some(s) = symbol {
        config.training.symbol = s;
    }
    config.validate().context("invalid training settings")
}

fn strategy_spec(kind: &str, params: Vec<(String, f64)>) -> StrategySpec {
    StrategySpec {
        kind: kind.to_string(),
        params: params.into_iter().collect::<ParamSet>(),
    }
}

fn known_kinds() -> String {
    STRATEGY_KINDS
        .iter()
        .map(|(k, _)| *k)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Commands ────────────────────────────────────────────────────────

fn run_backtest_cmd(
    args: &DataArgs,
    kind: &str,
    params: Vec<(String, f64)>,
    output_dir: Option<&Path>,
    json: bool,
) -> Result<()> {
    let session = load_session(args)?;
    let strategy = create_strategy(&strategy_spec(kind, params))
        .with_context(|| format!("known strategies: {}", known_kinds()))?;

    let result = Backtester::new(session.config.backtest.clone()).run(
        &strategy,
        &session.candles,
        session.start,
        session.end,
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&result.metrics())?);
    } else {
        print_summary(&result);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn run_optimize_cmd(
    args: &DataArgs,
    kind: &str,
    ranges: Vec<(String, Vec<f64>)>,
    target: MetricField,
    sequential: bool,
    top: usize,
    csv_out: Option<&Path>,
) -> Result<()> {
    let session = load_session(args)?;
    let grid = ranges
        .into_iter()
        .fold(ParamGrid::new(), |g, (name, values)| g.with(name, values));

    let search = GridSearch::new(Backtester::new(session.config.backtest.clone()), target)
        .with_parallelism(!sequential);
    let result = search.run_kind(kind, &grid, &session.candles, session.start, session.end)?;

    println!();
    println!("=== Grid Search ({kind}, target {target}) ===");
    println!(
        "Combinations:   {} ({} failed)",
        grid.size(),
        result.failures.len()
    );
    match &result.best {
        Some(best) => {
            println!("Best params:    {}", format_params(&best.params));
            println!("Best {target}: {:.4}", best.score);
        }
        None => println!("No combination produced a result."),
    }
    println!();
    for (rank, c) in result.top_n(top).iter().enumerate() {
        println!(
            "#{:<3} {:<30} {target}={:.4} trades={}",
            rank + 1,
            format_params(&c.params),
            c.score,
            c.metrics.total_trades
        );
    }
    for f in &result.failures {
        println!("skipped {}: {}", format_params(&f.params), f.error);
    }

    if let Some(path) = csv_out {
        std::fs::write(path, export_sweep_csv(&result)?)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Candidates saved to: {}", path.display());
    }
    Ok(())
}

fn run_walk_forward_cmd(
    args: &DataArgs,
    kind: &str,
    params: Vec<(String, f64)>,
    train_days: Option<u32>,
    test_days: Option<u32>,
) -> Result<()> {
    let mut session = load_session(args)?;
    apply_walk_forward_overrides(&mut session.config, train_days, test_days)?;
    let wf = &session.config.walk_forward;
    let strategy = create_strategy(&strategy_spec(kind, params))
        .with_context(|| format!("known strategies: {}", known_kinds()))?;

    let report = run_walk_forward(
        &Backtester::new(session.config.backtest.clone()),
        wf,
        &strategy,
        &session.candles,
        session.start,
        session.end,
    );

    println!();
    println!(
        "=== Walk-Forward ({}, {}d train / {}d test) ===",
        report.strategy, wf.train_days, wf.test_days
    );
    for w in &report.windows {
        println!(
            "#{:<3} train {} → {}  sharpe {:>7.3} | test {} → {}  sharpe {:>7.3} | consistency {:.3}",
            w.window.index + 1,
            w.window.train_start.date(),
            w.window.train_end.date(),
            w.train.sharpe_ratio,
            w.window.test_start.date(),
            w.window.test_end.date(),
            w.test.sharpe_ratio,
            w.consistency
        );
    }
    println!("Windows:              {}", report.windows.len());
    println!("Average consistency:  {:.3}", report.average_consistency);
    Ok(())
}

fn run_train_cmd(
    args: &DataArgs,
    policy: Option<String>,
    timesteps: Option<u64>,
    symbol: Option<String>,
    resume: Option<&Path>,
) -> Result<()> {
    let mut session = load_session(args)?;
    apply_training_overrides(&mut session.config, policy, timesteps, symbol)?;
    let training = session.config.training.clone();

    let candles = filter_range(&session.candles, session.start, session.end).to_vec();
    let mut env = DecisionEnvironment::new(candles, session.config.environment.clone());
    let mut policy = create_policy(&training.policy, training.seed)?;
    if let Some(path) = resume {
        policy.restore(path)?;
    }
    let orchestrator = TrainingOrchestrator::new(training)?;

    let report = orchestrator.run(&mut env, policy.as_mut(), &AtomicBool::new(false))?;

    println!();
    println!("=== Training ({}) ===", policy.name());
    println!("Steps:          {}", report.steps);
    println!("Episodes:       {}", report.episodes);
    println!("Stop reason:    {:?}", report.stop_reason);
    if let Some(best) = report.best_return {
        println!("Best return:    {best:.4}");
    }
    if let Some(sharpe) = report.last_sharpe {
        println!("Rolling Sharpe: {sharpe:.3}");
    }
    println!("Final model:    {}", report.final_model.display());
    Ok(())
}

// ─── Output ──────────────────────────────────────────────────────────

fn format_params(params: &ParamSet) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_summary(result: &BacktestResult) {
    let m = result.metrics();
    println!();
    println!("=== Backtest Result ===");
    println!("Strategy:       {} ({})", result.strategy, format_params(&result.params));
    match (result.start, result.end) {
        (Some(start), Some(end)) => println!("Period:         {start} to {end}"),
        _ => println!("Period:         (no candles in range)"),
    }
    println!("Candles:        {}", result.candle_count);
    println!("Trades:         {}", m.total_trades);
    println!();
    println!("--- Performance ---");
    println!("Final Equity:   {:.2}", m.final_equity);
    println!("Return:         {:.2}%", m.return_pct);
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Sortino:        {:.3}", m.sortino_ratio);
    println!("Calmar:         {:.3}", m.calmar_ratio);
    println!("Max Drawdown:   {:.2}%", m.max_drawdown);
    println!("Win Rate:       {:.1}%", m.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!("Avg Win/Loss:   {:.2} / {:.2}", m.avg_win, m.avg_loss);
}
