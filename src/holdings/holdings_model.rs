use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::constants::QUANTITY_THRESHOLD;
use crate::ledger::LedgerState;
use crate::utils::decimal_serde::decimal_serde;

pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold = Decimal::from_str(QUANTITY_THRESHOLD).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// Coarse asset classification. Drives the sector concentration score and
/// the heuristic covariance defaults in the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetCategory {
    Stock,
    Etf,
    Crypto,
    Bond,
    Commodity,
    Cash,
    #[default]
    Other,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Stock => "STOCK",
            AssetCategory::Etf => "ETF",
            AssetCategory::Crypto => "CRYPTO",
            AssetCategory::Bond => "BOND",
            AssetCategory::Commodity => "COMMODITY",
            AssetCategory::Cash => "CASH",
            AssetCategory::Other => "OTHER",
        }
    }
}

/// One position in a portfolio.
///
/// `market_value`, the gain fields and `weight` are caches: always
/// re-derivable from quantity/price/average cost. The PnL service recomputes
/// them and never trusts incoming values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: String,
    pub symbol: String,
    pub category: AssetCategory,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub average_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub current_price: Decimal,
    #[serde(with = "decimal_serde")]
    pub market_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub unrealized_gain_pct: Decimal,
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    /// Fraction of total portfolio value, [0, 1].
    #[serde(with = "decimal_serde")]
    pub weight: Decimal,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub transaction_count: usize,
}

impl Holding {
    pub fn new(symbol: &str, category: AssetCategory) -> Self {
        Holding {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            category,
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            current_price: Decimal::ZERO,
            market_value: Decimal::ZERO,
            unrealized_gain: Decimal::ZERO,
            unrealized_gain_pct: Decimal::ZERO,
            realized_gain: Decimal::ZERO,
            weight: Decimal::ZERO,
            first_activity: None,
            last_activity: None,
            transaction_count: 0,
        }
    }

    /// Builds a holding from replayed ledger state plus a live price.
    pub fn from_ledger(state: &LedgerState, category: AssetCategory, price: Decimal) -> Self {
        let mut holding = Holding::new(&state.symbol, category);
        holding.quantity = state.quantity;
        holding.average_cost = state.average_cost;
        holding.current_price = price;
        holding.realized_gain = state.realized_gain;
        holding.first_activity = state.first_activity;
        holding.last_activity = state.last_activity;
        holding.transaction_count = state.transaction_count;
        holding
    }

    /// Invested capital still in the position.
    pub fn invested(&self) -> Decimal {
        self.quantity * self.average_cost
    }
}

/// Owning entity for a set of holdings plus cash.
///
/// The engine treats this as a value object: calculations consume a
/// portfolio and return a new or updated copy, never schedule mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub id: String,
    pub user_id: String,
    pub currency: String,
    #[serde(with = "decimal_serde")]
    pub cash: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_value: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_invested: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_gain_pct: Decimal,
    pub holdings: Vec<Holding>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(user_id: &str, currency: &str) -> Self {
        let now = Utc::now();
        Portfolio {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            currency: currency.to_string(),
            cash: Decimal::ZERO,
            total_value: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            total_gain: Decimal::ZERO,
            total_gain_pct: Decimal::ZERO,
            holdings: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.symbol == symbol)
    }

    /// Positions with a significant quantity.
    pub fn active_holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.iter().filter(|h| is_quantity_significant(&h.quantity))
    }
}
