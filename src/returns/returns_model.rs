use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::CostBasisMethod;
use crate::utils::decimal_serde::decimal_serde;

/// Portfolio-level return figures over one snapshot history.
/// All returns are fractions: 0.10 means +10%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiMetrics {
    /// Total PnL over total invested, from the latest snapshot.
    #[serde(with = "decimal_serde")]
    pub simple_return: Decimal,
    /// (1 + simple return)^(1/years) - 1.
    #[serde(with = "decimal_serde")]
    pub annualized_return: Decimal,
    /// (end value / start value)^(1/years) - 1.
    #[serde(with = "decimal_serde")]
    pub cagr: Decimal,
    /// (end value - start value) / start value.
    #[serde(with = "decimal_serde")]
    pub holding_period_return: Decimal,
    /// Geometrically chained period returns, immune to cash-flow timing.
    #[serde(with = "decimal_serde")]
    pub time_weighted_return: Decimal,
    /// Modified-Dietz approximation, chained over periods.
    #[serde(with = "decimal_serde")]
    pub money_weighted_return: Decimal,
    /// Elapsed span in 365.25-day years.
    #[serde(with = "decimal_serde")]
    pub years: Decimal,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

impl RoiMetrics {
    pub fn empty() -> Self {
        RoiMetrics {
            simple_return: Decimal::ZERO,
            annualized_return: Decimal::ZERO,
            cagr: Decimal::ZERO,
            holding_period_return: Decimal::ZERO,
            time_weighted_return: Decimal::ZERO,
            money_weighted_return: Decimal::ZERO,
            years: Decimal::ZERO,
            period_start: None,
            period_end: None,
        }
    }
}

/// Return decomposition for one holding: realized gains from sells
/// (cost-basis-aware), unrealized gains on the remaining position, and
/// dividends received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingRoi {
    pub symbol: String,
    pub method: CostBasisMethod,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub dividends: Decimal,
    /// Total capital deployed: sum of buy costs including fees.
    #[serde(with = "decimal_serde")]
    pub total_invested: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_gain: Decimal,
    /// total gain / total invested, as a fraction.
    #[serde(with = "decimal_serde")]
    pub total_return: Decimal,
}
