//! Factory: `StrategySpec` → `StrategyVariant`.
//!
//! Unknown kinds, unknown parameter names and out-of-range values are
//! construction errors. Missing parameters take the variant's default.

use serde::{Deserialize, Serialize};

use super::{MaCrossoverStrategy, ParamSet, RsiStrategy, StrategyVariant};

/// Errors that can occur during strategy construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown strategy kind: {0}")]
    UnknownStrategy(String),
    #[error("unknown parameter '{name}' for strategy '{kind}'")]
    UnknownParam { kind: String, name: String },
    #[error("invalid parameters for strategy '{kind}': {reason}")]
    InvalidParams { kind: String, reason: String },
}

/// Serializable description of a strategy: kind name plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub kind: String,
    #[serde(default)]
    pub params: ParamSet,
}

impl StrategySpec {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: ParamSet::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params.insert(name.into(), value);
        self
    }
}

/// Known strategy kinds and their accepted parameter names.
pub const STRATEGY_KINDS: &[(&str, &[&str])] = &[
    ("rsi", &["period", "oversold", "overbought"]),
    ("ma_crossover", &["fast", "slow"]),
];

fn invalid(kind: &str, reason: impl Into<String>) -> FactoryError {
    FactoryError::InvalidParams {
        kind: kind.to_string(),
        reason: reason.into(),
    }
}

fn param(spec: &StrategySpec, name: &str, default: f64) -> Result<f64, FactoryError> {
    let value = spec.params.get(name).copied().unwrap_or(default);
    if !value.is_finite() {
        return Err(invalid(&spec.kind, format!("{name} must be finite, got {value}")));
    }
    Ok(value)
}

/// Periods arrive as f64 from grids and TOML; they must be whole and >= `min`.
fn param_period(
    spec: &StrategySpec,
    name: &str,
    default: usize,
    min: usize,
) -> Result<usize, FactoryError> {
    let value = param(spec, name, default as f64)?;
    if value.fract() != 0.0 || value < min as f64 {
        return Err(invalid(
            &spec.kind,
            format!("{name} must be a whole number >= {min}, got {value}"),
        ));
    }
    Ok(value as usize)
}

/// Build a strategy from its spec.
pub fn create_strategy(spec: &StrategySpec) -> Result<StrategyVariant, FactoryError> {
    let (_, accepted) = STRATEGY_KINDS
        .iter()
        .find(|(kind, _)| *kind == spec.kind)
        .ok_or_else(|| FactoryError::UnknownStrategy(spec.kind.clone()))?;

    if let Some(name) = spec.params.keys().find(|k| !accepted.contains(&k.as_str())) {
        return Err(FactoryError::UnknownParam {
            kind: spec.kind.clone(),
            name: name.clone(),
        });
    }

    match spec.kind.as_str() {
        "rsi" => {
            let period = param_period(spec, "period", 14, 2)?;
            let oversold = param(spec, "oversold", 30.0)?;
            let overbought = param(spec, "overbought", 70.0)?;
            if !(0.0 <= oversold && oversold < overbought && overbought <= 100.0) {
                return Err(invalid(
                    &spec.kind,
                    format!(
                        "need 0 <= oversold < overbought <= 100, got {oversold} / {overbought}"
                    ),
                ));
            }
            Ok(RsiStrategy::new(period, oversold, overbought).into())
        }
        "ma_crossover" => {
            let fast = param_period(spec, "fast", 10, 1)?;
            let slow = param_period(spec, "slow", 20, 2)?;
            if slow <= fast {
                return Err(invalid(
                    &spec.kind,
                    format!("slow ({slow}) must be greater than fast ({fast})"),
                ));
            }
            Ok(MaCrossoverStrategy::new(fast, slow).into())
        }
        other => Err(FactoryError::UnknownStrategy(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;

    #[test]
    fn builds_rsi_with_defaults() {
        let s = create_strategy(&StrategySpec::new("rsi")).unwrap();
        assert_eq!(s, StrategyVariant::Rsi(RsiStrategy::default()));
    }

    #[test]
    fn builds_ma_crossover_from_params() {
        let spec = StrategySpec::new("ma_crossover")
            .with_param("fast", 5.0)
            .with_param("slow", 15.0);
        let s = create_strategy(&spec).unwrap();
        assert_eq!(s.name(), "ma_crossover");
        assert_eq!(s.min_window(), 15);
    }

    #[test]
    fn unknown_kind_is_error() {
        let err = create_strategy(&StrategySpec::new("bollinger")).unwrap_err();
        assert_eq!(err, FactoryError::UnknownStrategy("bollinger".into()));
    }

    #[test]
    fn unknown_param_is_error() {
        let spec = StrategySpec::new("rsi").with_param("lookback", 3.0);
        assert!(matches!(
            create_strategy(&spec),
            Err(FactoryError::UnknownParam { .. })
        ));
    }

    #[test]
    fn invalid_params_are_errors() {
        let bad = [
            StrategySpec::new("rsi").with_param("period", 1.0),
            StrategySpec::new("rsi").with_param("period", 14.5),
            StrategySpec::new("rsi")
                .with_param("oversold", 70.0)
                .with_param("overbought", 30.0),
            StrategySpec::new("rsi").with_param("overbought", f64::NAN),
            StrategySpec::new("ma_crossover")
                .with_param("fast", 20.0)
                .with_param("slow", 10.0),
            StrategySpec::new("ma_crossover").with_param("fast", 0.0),
        ];
        for spec in &bad {
            assert!(
                matches!(create_strategy(spec), Err(FactoryError::InvalidParams { .. })),
                "expected InvalidParams for {spec:?}"
            );
        }
    }

    #[test]
    fn spec_round_trips_through_json() {
        let spec = StrategySpec::new("rsi").with_param("period", 10.0);
        let json = serde_json::to_string(&spec).unwrap();
        let back: StrategySpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
