use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RISK_FREE_RATE, DEFAULT_VAR_CONFIDENCE};
use crate::utils::decimal_serde::decimal_serde;

/// Tunables for the risk metrics engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskOptions {
    /// Annual risk-free rate, e.g. 0.02 for 2%.
    #[serde(with = "decimal_serde")]
    pub risk_free_rate: Decimal,
    /// Confidence level for VaR/CVaR, e.g. 0.95.
    #[serde(with = "decimal_serde")]
    pub var_confidence: Decimal,
}

impl Default for RiskOptions {
    fn default() -> Self {
        RiskOptions {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            var_confidence: DEFAULT_VAR_CONFIDENCE,
        }
    }
}

/// Flat record of the risk statistics derived from one snapshot history.
///
/// Every ratio holds exactly 0 where its denominator was non-positive; beta
/// holds 1 when the benchmark was absent or degenerate. Pure output, never
/// persisted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetricsResult {
    /// Annualized volatility over the full history.
    #[serde(with = "decimal_serde")]
    pub volatility: Decimal,
    #[serde(with = "decimal_serde")]
    pub volatility_30d: Decimal,
    #[serde(with = "decimal_serde")]
    pub volatility_90d: Decimal,
    #[serde(with = "decimal_serde")]
    pub sharpe_ratio: Decimal,
    #[serde(with = "decimal_serde")]
    pub sortino_ratio: Decimal,
    #[serde(with = "decimal_serde")]
    pub calmar_ratio: Decimal,
    #[serde(with = "decimal_serde")]
    pub treynor_ratio: Decimal,
    #[serde(with = "decimal_serde")]
    pub information_ratio: Decimal,
    /// Depth of the worst peak-to-trough decline, as a positive fraction.
    #[serde(with = "decimal_serde")]
    pub max_drawdown: Decimal,
    /// Periods between the peak and the trough of the worst decline.
    pub max_drawdown_periods: usize,
    /// Historical VaR at `var_confidence`, reported positive.
    #[serde(with = "decimal_serde")]
    pub value_at_risk: Decimal,
    /// Mean loss at or beyond the VaR threshold, reported positive.
    #[serde(with = "decimal_serde")]
    pub conditional_value_at_risk: Decimal,
    #[serde(with = "decimal_serde")]
    pub var_confidence: Decimal,
    #[serde(with = "decimal_serde")]
    pub beta: Decimal,
    #[serde(with = "decimal_serde")]
    pub alpha: Decimal,
    #[serde(with = "decimal_serde")]
    pub annualized_return: Decimal,
    /// Number of return observations behind these figures.
    pub period_count: usize,
}

impl RiskMetricsResult {
    /// Neutral report used when the risk section of an analysis degrades.
    pub fn empty() -> Self {
        RiskMetricsResult {
            volatility: Decimal::ZERO,
            volatility_30d: Decimal::ZERO,
            volatility_90d: Decimal::ZERO,
            sharpe_ratio: Decimal::ZERO,
            sortino_ratio: Decimal::ZERO,
            calmar_ratio: Decimal::ZERO,
            treynor_ratio: Decimal::ZERO,
            information_ratio: Decimal::ZERO,
            max_drawdown: Decimal::ZERO,
            max_drawdown_periods: 0,
            value_at_risk: Decimal::ZERO,
            conditional_value_at_risk: Decimal::ZERO,
            var_confidence: DEFAULT_VAR_CONFIDENCE,
            beta: Decimal::ONE,
            alpha: Decimal::ZERO,
            annualized_return: Decimal::ZERO,
            period_count: 0,
        }
    }
}
