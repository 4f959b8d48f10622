use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{Result, ValidationError};
use crate::utils::decimal_serde::decimal_serde;

/// Target-weight construction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationStrategy {
    #[default]
    EqualWeight,
    MinimumVariance,
    MaximumSharpe,
    RiskParity,
}

/// Per-asset weight bounds and trading-cost assumptions. All values are
/// fractions of portfolio value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationConstraints {
    #[serde(with = "decimal_serde")]
    pub max_weight: Decimal,
    #[serde(with = "decimal_serde")]
    pub min_weight: Decimal,
    #[serde(with = "decimal_serde")]
    pub max_turnover: Decimal,
    #[serde(with = "decimal_serde")]
    pub transaction_cost_rate: Decimal,
}

impl Default for OptimizationConstraints {
    fn default() -> Self {
        OptimizationConstraints {
            max_weight: dec!(0.40),
            min_weight: dec!(0.01),
            max_turnover: dec!(0.50),
            transaction_cost_rate: dec!(0.001),
        }
    }
}

impl OptimizationConstraints {
    pub fn validate(&self) -> Result<()> {
        if self.min_weight.is_sign_negative() || self.max_weight > Decimal::ONE {
            return Err(ValidationError::InvalidInput(
                "Weight bounds must lie within [0, 1]".to_string(),
            )
            .into());
        }
        if self.min_weight > self.max_weight {
            return Err(ValidationError::InvalidInput(format!(
                "min weight {} exceeds max weight {}",
                self.min_weight, self.max_weight
            ))
            .into());
        }
        if self.transaction_cost_rate.is_sign_negative() {
            return Err(ValidationError::InvalidInput(
                "Transaction cost rate cannot be negative".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Buy,
    Sell,
    Hold,
}

/// One trade needed to move a holding from its current to its target weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingAction {
    pub symbol: String,
    pub action: ActionKind,
    /// Units to buy (positive) or sell (negative).
    #[serde(with = "decimal_serde")]
    pub quantity_delta: Decimal,
    /// Value to deploy (positive) or free up (negative).
    #[serde(with = "decimal_serde")]
    pub value_delta: Decimal,
    #[serde(with = "decimal_serde")]
    pub current_weight: Decimal,
    #[serde(with = "decimal_serde")]
    pub target_weight: Decimal,
    /// 1 = largest required change.
    pub priority: usize,
}

/// Proposed target mix plus the trades and costs to reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationResult {
    pub strategy: OptimizationStrategy,
    pub current_weights: HashMap<String, Decimal>,
    pub target_weights: HashMap<String, Decimal>,
    pub actions: Vec<RebalancingAction>,
    #[serde(with = "decimal_serde")]
    pub expected_return: Decimal,
    #[serde(with = "decimal_serde")]
    pub expected_volatility: Decimal,
    #[serde(with = "decimal_serde")]
    pub expected_sharpe: Decimal,
    /// Half the summed absolute weight changes, [0, 1].
    #[serde(with = "decimal_serde")]
    pub turnover: Decimal,
    /// turnover x transaction cost rate, a fraction of portfolio value.
    #[serde(with = "decimal_serde")]
    pub estimated_cost: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceFrequency {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
}

impl RebalanceFrequency {
    pub fn period_days(&self) -> i64 {
        match self {
            RebalanceFrequency::Weekly => 7,
            RebalanceFrequency::Monthly => 30,
            RebalanceFrequency::Quarterly => 90,
        }
    }
}

/// When to rebalance outside the regular schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingPolicy {
    pub frequency: RebalanceFrequency,
    /// Trigger when any weight deviates this far from equal weight.
    #[serde(with = "decimal_serde")]
    pub deviation_threshold: Decimal,
    /// Trigger when portfolio volatility exceeds this level.
    #[serde(with = "decimal_serde")]
    pub volatility_threshold: Decimal,
}

impl Default for RebalancingPolicy {
    fn default() -> Self {
        RebalancingPolicy {
            frequency: RebalanceFrequency::Monthly,
            deviation_threshold: dec!(0.05),
            volatility_threshold: dec!(0.4),
        }
    }
}

/// Outcome of a rebalancing trigger check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalancingCheck {
    pub triggered: bool,
    pub reasons: Vec<String>,
    /// Immediate equal-weight actions when triggered, otherwise empty.
    pub actions: Vec<RebalancingAction>,
    /// Next scheduled run when not triggered.
    pub next_scheduled: Option<DateTime<Utc>>,
}
