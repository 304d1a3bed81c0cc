//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade tape, equity curve, grid-search candidates
//! - **Markdown**: human-readable single-run report
//!
//! Persisted results carry a `schema_version`. Newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use edgelab_core::domain::{ClosedTrade, EquityPoint};

use crate::data_loader::WRITE_FORMAT;
use crate::metrics::MetricField;
use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepResult;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult`, rejecting schema versions newer than ours.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: direction, entry_time, entry_price, exit_time, exit_price, size, profit
pub fn export_trades_csv(trades: &[ClosedTrade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "direction",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "size",
        "profit",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.direction.as_str().to_string(),
            &t.entry_time.format(WRITE_FORMAT).to_string(),
            &format!("{:.6}", t.entry_price),
            &t.timestamp.format(WRITE_FORMAT).to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.4}", t.size),
            &format!("{:.2}", t.profit),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity"])?;
    for p in equity_curve {
        wtr.write_record([
            &p.timestamp.format(WRITE_FORMAT).to_string(),
            &format!("{:.2}", p.equity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per successful combination, in enumeration order. Parameter
/// columns come first, then the score and the headline metrics.
pub fn export_sweep_csv(result: &SweepResult) -> Result<String> {
    let param_names: Vec<String> = result
        .candidates
        .first()
        .map(|c| c.params.keys().cloned().collect())
        .unwrap_or_default();

    let mut header: Vec<String> = vec!["index".to_string()];
    header.extend(param_names.iter().cloned());
    header.push(format!("score_{}", result.target));
    for field in [
        MetricField::TotalTrades,
        MetricField::WinRate,
        MetricField::TotalProfit,
        MetricField::MaxDrawdown,
        MetricField::SharpeRatio,
    ] {
        header.push(field.name().to_string());
    }

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&header)?;
    for c in &result.candidates {
        let mut row = vec![c.index.to_string()];
        for name in &param_names {
            row.push(c.params.get(name).map(|v| v.to_string()).unwrap_or_default());
        }
        row.push(format!("{:.6}", c.score));
        row.push(c.metrics.total_trades.to_string());
        row.push(format!("{:.4}", c.metrics.win_rate));
        row.push(format!("{:.2}", c.metrics.total_profit));
        row.push(format!("{:.4}", c.metrics.max_drawdown));
        row.push(format!("{:.4}", c.metrics.sharpe_ratio));
        wtr.write_record(&row)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{strategy}_{timestamp}/` under `output_dir` containing
/// `manifest.json`, `trades.csv`, `equity.csv` and `report.md`.
/// Returns the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        result.strategy,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("manifest.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&result.trades)?)?;
    std::fs::write(
        run_dir.join("equity.csv"),
        export_equity_csv(&result.equity_curve)?,
    )?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

// ─── Markdown reports ───────────────────────────────────────────────

pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);
    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Strategy | {} |\n", result.strategy));
    let params: Vec<String> = result
        .params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    md.push_str(&format!("| Parameters | {} |\n", params.join(", ")));
    match (result.start, result.end) {
        (Some(start), Some(end)) => md.push_str(&format!("| Period | {start} to {end} |\n")),
        _ => md.push_str("| Period | (no candles) |\n"),
    }
    md.push_str(&format!(
        "| Initial Capital | ${:.0} |\n",
        result.initial_capital
    ));
    md.push_str(&format!("| Candles | {} |\n", result.candle_count));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push('\n');

    let m = result.metrics();
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Final Equity | ${:.2} |\n", m.final_equity));
    md.push_str(&format!("| Return | {:.2}% |\n", m.return_pct));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe_ratio));
    md.push_str(&format!("| Sortino | {:.3} |\n", m.sortino_ratio));
    md.push_str(&format!("| Calmar | {:.3} |\n", m.calmar_ratio));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate * 100.0));
    md.push_str(&format!("| Profit Factor | {:.2} |\n", m.profit_factor));
    md.push_str(&format!(
        "| Trades | {} ({} won, {} lost) |\n",
        m.total_trades, m.winning_trades, m.losing_trades
    ));
    md.push_str(&format!("| Avg Win | {:.2} |\n", m.avg_win));
    md.push_str(&format!("| Avg Loss | {:.2} |\n", m.avg_loss));
    md.push('\n');

    if !result.trades.is_empty() {
        md.push_str("## Trades\n\n");
        md.push_str("| # | Side | Entry | Exit | Profit |\n");
        md.push_str("| --- | --- | --- | --- | --- |\n");
        for (i, t) in result.trades.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {:.2} @ {} | {:.2} @ {} | {:.2} |\n",
                i + 1,
                t.direction.as_str(),
                t.entry_price,
                t.entry_time,
                t.exit_price,
                t.timestamp,
                t.profit
            ));
        }
        md.push('\n');
    }

    md
}
