//! EdgeLab Core: domain types, position tracker, indicators, strategies, decision environment.
//!
//! This crate contains the simulation mechanics shared by offline backtests
//! and online adaptive training:
//! - Domain types (candles, signals, positions, closed trades, equity points)
//! - Position lifecycle and equity tracker (FLAT → OPEN → FLAT, same-tick reversal)
//! - Causal indicators (SMA, EMA, RSI, MACD, ATR)
//! - Strategy interface with its closed set of variants and factory
//! - Step-wise decision environment with shaped rewards

pub mod domain;
pub mod engine;
pub mod env;
pub mod indicators;
pub mod stats;
pub mod strategy;
