use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, ValidationError};
use crate::utils::decimal_serde::decimal_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Buy,
    Sell,
    Dividend,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "BUY",
            TransactionKind::Sell => "SELL",
            TransactionKind::Dividend => "DIVIDEND",
        }
    }
}

/// A recorded trade or income event. Immutable once recorded; calculators
/// only ever read transactions in timestamp order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub symbol: String,
    pub kind: TransactionKind,
    #[serde(with = "decimal_serde")]
    pub quantity: Decimal,
    #[serde(with = "decimal_serde")]
    pub price: Decimal,
    #[serde(with = "decimal_serde")]
    pub fee: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        symbol: &str,
        kind: TransactionKind,
        quantity: Decimal,
        price: Decimal,
        fee: Decimal,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Transaction {
            id: Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            kind,
            quantity,
            price,
            fee,
            executed_at,
        }
    }

    /// Gross cash value of the event, before fees.
    pub fn gross_amount(&self) -> Decimal {
        self.quantity * self.price
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(ValidationError::MissingField("symbol".to_string()).into());
        }
        if !self.quantity.is_sign_positive() || self.quantity.is_zero() {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {} has non-positive quantity {}",
                self.id, self.quantity
            ))
            .into());
        }
        if !self.price.is_sign_positive() || self.price.is_zero() {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {} has non-positive price {}",
                self.id, self.price
            ))
            .into());
        }
        if self.fee.is_sign_negative() {
            return Err(ValidationError::InvalidInput(format!(
                "Transaction {} has negative fee {}",
                self.id, self.fee
            ))
            .into());
        }
        Ok(())
    }
}
