use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::holdings::AssetCategory;
use crate::utils::decimal_serde::decimal_serde;

/// Change of total portfolio value against a historical snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodChange {
    #[serde(with = "decimal_serde")]
    pub amount: Decimal,
    /// Percent change, e.g. 11.11 for +11.11%.
    #[serde(with = "decimal_serde")]
    pub percent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingPnl {
    pub symbol: String,
    pub category: AssetCategory,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub current_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub market_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub invested: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
    /// Percent of invested capital, e.g. 11.11 for +11.11%.
    #[serde(with = "decimal_serde")]
    pub unrealized_gain_pct: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    /// Fraction of total portfolio value, [0, 1].
    #[serde(with = "decimal_serde")]
    pub weight: Decimal,
}

/// Portfolio-level profit and loss report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlResult {
    pub portfolio_id: String,
    pub currency: String,
    pub calculated_at: DateTime<Utc>,
    #[serde(with = "decimal_serde")]
    pub total_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub securities_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub cash: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_invested: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_gain: Decimal,
    /// Percent of invested capital, e.g. 11.11 for +11.11%.
    #[serde(with = "decimal_serde")]
    pub total_gain_pct: Decimal,
    pub holdings: Vec<HoldingPnl>,
    pub day_change: PeriodChange,
    pub week_change: PeriodChange,
    pub month_change: PeriodChange,
    pub year_change: PeriodChange,
}

impl PnlResult {
    pub fn empty(portfolio_id: &str, currency: &str, calculated_at: DateTime<Utc>) -> Self {
        PnlResult {
            portfolio_id: portfolio_id.to_string(),
            currency: currency.to_string(),
            calculated_at,
            total_value: Decimal::ZERO,
            securities_value: Decimal::ZERO,
            cash: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            unrealized_gain: Decimal::ZERO,
            realized_gain: Decimal::ZERO,
            total_gain: Decimal::ZERO,
            total_gain_pct: Decimal::ZERO,
            holdings: Vec::new(),
            day_change: PeriodChange::default(),
            week_change: PeriodChange::default(),
            month_change: PeriodChange::default(),
            year_change: PeriodChange::default(),
        }
    }
}
