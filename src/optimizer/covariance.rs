//! Pluggable covariance estimation for the optimizer.
//!
//! The default estimator is deliberately heuristic: category-level variance
//! assumptions instead of data-derived covariance. The trait boundary lets a
//! historical estimator replace it without touching the strategy logic.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::holdings::{AssetCategory, Holding};

/// Annualized covariance matrix over holding symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CovarianceMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<Decimal>>,
}

impl CovarianceMatrix {
    pub fn variance(&self, index: usize) -> Decimal {
        self.value(index, index)
    }

    pub fn value(&self, a: usize, b: usize) -> Decimal {
        self.values
            .get(a)
            .and_then(|row| row.get(b))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

pub trait CovarianceEstimator: Send + Sync {
    fn estimate(&self, holdings: &[&Holding]) -> CovarianceMatrix;
}

/// Category-based covariance defaults: a fixed variance per asset category
/// on the diagonal, and an assumed correlation (higher within the same
/// category) scaled by the component volatilities off the diagonal.
#[derive(Debug, Clone)]
pub struct HeuristicCovarianceEstimator {
    pub intra_category_correlation: Decimal,
    pub cross_category_correlation: Decimal,
}

impl Default for HeuristicCovarianceEstimator {
    fn default() -> Self {
        HeuristicCovarianceEstimator {
            intra_category_correlation: dec!(0.7),
            cross_category_correlation: dec!(0.3),
        }
    }
}

impl HeuristicCovarianceEstimator {
    /// Assumed annualized return variance per category.
    pub fn category_variance(category: AssetCategory) -> Decimal {
        match category {
            AssetCategory::Crypto => dec!(0.64),
            AssetCategory::Stock => dec!(0.0625),
            AssetCategory::Etf => dec!(0.04),
            AssetCategory::Commodity => dec!(0.09),
            AssetCategory::Bond => dec!(0.0025),
            AssetCategory::Cash => dec!(0.0001),
            AssetCategory::Other => dec!(0.09),
        }
    }
}

impl CovarianceEstimator for HeuristicCovarianceEstimator {
    fn estimate(&self, holdings: &[&Holding]) -> CovarianceMatrix {
        let n = holdings.len();
        let variances: Vec<Decimal> = holdings
            .iter()
            .map(|h| Self::category_variance(h.category))
            .collect();

        let mut values = vec![vec![Decimal::ZERO; n]; n];
        for i in 0..n {
            values[i][i] = variances[i];
            for j in (i + 1)..n {
                let correlation = if holdings[i].category == holdings[j].category {
                    self.intra_category_correlation
                } else {
                    self.cross_category_correlation
                };
                let covariance = correlation
                    * (variances[i] * variances[j]).sqrt().unwrap_or(Decimal::ZERO);
                values[i][j] = covariance;
                values[j][i] = covariance;
            }
        }

        CovarianceMatrix {
            symbols: holdings.iter().map(|h| h.symbol.clone()).collect(),
            values,
        }
    }
}
