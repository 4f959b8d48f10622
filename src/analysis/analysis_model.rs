use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::correlation::{CorrelationMatrix, DiversificationScore, VolatilityPeriod};
use crate::ledger::CostBasisMethod;
use crate::optimizer::{OptimizationConstraints, OptimizationResult, OptimizationStrategy};
use crate::pnl::PnlResult;
use crate::returns::{HoldingRoi, RoiMetrics};
use crate::risk::{RiskMetricsResult, RiskOptions};
use crate::utils::decimal_serde::decimal_serde;

/// Tunables for a full portfolio analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub risk: RiskOptions,
    pub strategy: OptimizationStrategy,
    pub constraints: OptimizationConstraints,
    pub cost_basis_method: CostBasisMethod,
    /// How many snapshots of history to request from the source.
    pub snapshot_count: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            risk: RiskOptions::default(),
            strategy: OptimizationStrategy::default(),
            constraints: OptimizationConstraints::default(),
            cost_basis_method: CostBasisMethod::default(),
            snapshot_count: 365,
        }
    }
}

/// The full analysis report. Sections that could not be computed are left at
/// their zero-value report and recorded in `warnings`; a failed section never
/// aborts the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAnalysis {
    pub portfolio_id: String,
    pub generated_at: DateTime<Utc>,
    pub pnl: PnlResult,
    pub risk: RiskMetricsResult,
    pub returns: RoiMetrics,
    pub holding_returns: Vec<HoldingRoi>,
    pub correlation: CorrelationMatrix,
    pub diversification: DiversificationScore,
    pub volatility_periods: Vec<VolatilityPeriod>,
    pub optimization: Option<OptimizationResult>,
    pub recommendations: Vec<String>,
    /// Weighted composite of risk, return, and diversification, 0-100.
    #[serde(with = "decimal_serde")]
    pub overall_score: Decimal,
    pub warnings: Vec<String>,
}
