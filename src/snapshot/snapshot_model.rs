use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::holdings::Portfolio;
use crate::utils::decimal_serde::decimal_serde;

/// Metrics captured with a snapshot at the moment it was taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetrics {
    #[serde(with = "decimal_serde")]
    pub volatility: Decimal,
    #[serde(with = "decimal_serde")]
    pub sharpe_ratio: Decimal,
    #[serde(with = "decimal_serde")]
    pub diversification_score: Decimal,
}

/// A point-in-time portfolio value record.
///
/// Immutable once created. An ascending-by-timestamp, append-only sequence of
/// these is the sole input to the risk, return, and drawdown calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: String,
    pub portfolio_id: String,
    pub taken_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub total_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub invested: Decimal,
    #[serde(with = "decimal_serde")]
    pub cash: Decimal,
    #[serde(with = "decimal_serde")]
    pub gain: Decimal,
    /// Per-symbol market value breakdown at capture time.
    #[serde(default)]
    pub holding_values: HashMap<String, Decimal>,
    #[serde(default)]
    pub metrics: SnapshotMetrics,
}

impl PortfolioSnapshot {
    /// Derives a snapshot from the portfolio's current state.
    pub fn capture(portfolio: &Portfolio, taken_at: DateTime<Utc>) -> Self {
        let holding_values: HashMap<String, Decimal> = portfolio
            .holdings
            .iter()
            .map(|h| (h.symbol.clone(), h.quantity * h.current_price))
            .collect();
        let invested: Decimal = portfolio.holdings.iter().map(|h| h.invested()).sum();
        let securities_value: Decimal = holding_values.values().copied().sum();
        let total_value = securities_value + portfolio.cash;

        PortfolioSnapshot {
            id: Uuid::new_v4().to_string(),
            portfolio_id: portfolio.id.clone(),
            taken_at,
            total_value,
            invested,
            cash: portfolio.cash,
            gain: securities_value - invested,
            holding_values,
            metrics: SnapshotMetrics::default(),
        }
    }
}

/// Simple-return series r_t = (V_t - V_t-1) / V_t-1 over an ascending
/// snapshot sequence. Steps with a zero prior value are skipped rather than
/// producing an undefined ratio.
pub fn simple_returns(snapshots: &[PortfolioSnapshot]) -> Vec<Decimal> {
    let mut returns = Vec::with_capacity(snapshots.len().saturating_sub(1));
    for window in snapshots.windows(2) {
        let prev = window[0].total_value;
        let curr = window[1].total_value;
        if prev.is_zero() {
            continue;
        }
        returns.push((curr - prev) / prev);
    }
    returns
}
