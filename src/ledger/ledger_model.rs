use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::utils::decimal_serde::decimal_serde;

/// Lot relief convention for computing cost basis on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostBasisMethod {
    #[default]
    Fifo,
    Lifo,
    AverageCost,
}

/// One unconsumed buy. Created by a buy, shrunk or removed by later sells,
/// never created by a sell. Only FIFO/LIFO track lots; the weighted-average
/// convention keeps a single running aggregate instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub unit_cost: Decimal,
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    pub acquired_at: DateTime<Utc>,
}

impl Lot {
    pub fn new(quantity: Decimal, unit_cost: Decimal, cost_basis: Decimal, acquired_at: DateTime<Utc>) -> Self {
        Lot {
            quantity,
            unit_cost,
            cost_basis,
            acquired_at,
        }
    }
}

/// Final state of a replayed transaction log for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerState {
    pub symbol: String,
    pub method: CostBasisMethod,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub average_cost: Decimal,
    /// Total invested in the remaining position: quantity x average cost.
    #[serde(with = "decimal_serde")]
    pub cost_basis: Decimal,
    /// Net gain from completed sells: proceeds - consumed basis - fees.
    #[serde(with = "decimal_serde")]
    pub realized_gain: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_bought: Decimal,
    #[serde(with = "decimal_serde")]
    pub total_sold: Decimal,
    pub open_lots: VecDeque<Lot>,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub transaction_count: usize,
}

impl LedgerState {
    pub fn empty(symbol: &str, method: CostBasisMethod) -> Self {
        LedgerState {
            symbol: symbol.to_string(),
            method,
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            cost_basis: Decimal::ZERO,
            realized_gain: Decimal::ZERO,
            total_bought: Decimal::ZERO,
            total_sold: Decimal::ZERO,
            open_lots: VecDeque::new(),
            first_activity: None,
            last_activity: None,
            transaction_count: 0,
        }
    }
}
