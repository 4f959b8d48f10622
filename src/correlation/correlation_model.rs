use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::utils::decimal_serde::decimal_serde;

/// One period's worth of per-symbol price observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePeriod {
    pub observed_at: DateTime<Utc>,
    pub prices: HashMap<String, Decimal>,
}

/// Strength band of a pairwise correlation, classified by |rho|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationStrength {
    VeryStrong,
    Strong,
    Moderate,
    Weak,
    VeryWeak,
}

impl CorrelationStrength {
    pub fn classify(correlation: Decimal) -> Self {
        let magnitude = correlation.abs();
        if magnitude >= dec!(0.9) {
            CorrelationStrength::VeryStrong
        } else if magnitude >= dec!(0.7) {
            CorrelationStrength::Strong
        } else if magnitude >= dec!(0.5) {
            CorrelationStrength::Moderate
        } else if magnitude >= dec!(0.3) {
            CorrelationStrength::Weak
        } else {
            CorrelationStrength::VeryWeak
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CorrelationStrength::VeryStrong => "Very Strong",
            CorrelationStrength::Strong => "Strong",
            CorrelationStrength::Moderate => "Moderate",
            CorrelationStrength::Weak => "Weak",
            CorrelationStrength::VeryWeak => "Very Weak",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelatedPair {
    pub symbol_a: String,
    pub symbol_b: String,
    #[serde(with = "decimal_serde")]
    pub correlation: Decimal,
    pub strength: CorrelationStrength,
}

/// Symmetric pairwise correlation matrix over holding symbols.
/// The diagonal is 1 by definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<Decimal>>,
    #[serde(with = "decimal_serde")]
    pub average_correlation: Decimal,
    #[serde(with = "decimal_serde")]
    pub min_correlation: Decimal,
    #[serde(with = "decimal_serde")]
    pub max_correlation: Decimal,
    /// Pairs with |rho| >= 0.7.
    pub strong_pairs: Vec<CorrelatedPair>,
    /// Pairs with |rho| < 0.3.
    pub weak_pairs: Vec<CorrelatedPair>,
}

impl CorrelationMatrix {
    pub fn empty() -> Self {
        CorrelationMatrix {
            symbols: Vec::new(),
            values: Vec::new(),
            average_correlation: Decimal::ZERO,
            min_correlation: Decimal::ZERO,
            max_correlation: Decimal::ZERO,
            strong_pairs: Vec::new(),
            weak_pairs: Vec::new(),
        }
    }

    pub fn value(&self, a: usize, b: usize) -> Decimal {
        self.values
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Textual risk label attached to a diversification score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiversificationRiskLevel {
    Low,
    Moderate,
    High,
    Severe,
}

impl DiversificationRiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            DiversificationRiskLevel::Low => "Low",
            DiversificationRiskLevel::Moderate => "Moderate",
            DiversificationRiskLevel::High => "High",
            DiversificationRiskLevel::Severe => "Severe",
        }
    }
}

/// Weighted 0-100 diversification score with its three sub-scores. Higher is
/// better: each underlying risk measure is inverted before weighting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiversificationScore {
    #[serde(with = "decimal_serde")]
    pub score: Decimal,
    #[serde(with = "decimal_serde")]
    pub concentration_score: Decimal,
    #[serde(with = "decimal_serde")]
    pub correlation_score: Decimal,
    #[serde(with = "decimal_serde")]
    pub sector_score: Decimal,
    /// Herfindahl index of per-holding value weights.
    #[serde(with = "decimal_serde")]
    pub herfindahl_index: Decimal,
    /// Herfindahl index of per-category value weights.
    #[serde(with = "decimal_serde")]
    pub sector_herfindahl_index: Decimal,
    pub risk_level: DiversificationRiskLevel,
    pub recommendations: Vec<String>,
}

impl DiversificationScore {
    pub fn empty() -> Self {
        DiversificationScore {
            score: Decimal::ZERO,
            concentration_score: Decimal::ZERO,
            correlation_score: Decimal::ZERO,
            sector_score: Decimal::ZERO,
            herfindahl_index: Decimal::ZERO,
            sector_herfindahl_index: Decimal::ZERO,
            risk_level: DiversificationRiskLevel::Severe,
            recommendations: Vec::new(),
        }
    }
}

/// Volatility regime of one rolling window relative to the mean rolling
/// volatility of the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VolatilityRegime {
    Low,
    Normal,
    High,
}

/// A run of consecutive same-regime rolling windows, expressed as an
/// inclusive range of return-series indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityPeriod {
    pub regime: VolatilityRegime,
    pub start_index: usize,
    pub end_index: usize,
    #[serde(with = "decimal_serde")]
    pub average_volatility: Decimal,
}
