//! Orchestrates the full analysis pipeline over one portfolio.

use chrono::{DateTime, Utc};
use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::MIN_FULL_RISK_SNAPSHOTS;
use crate::correlation::{CorrelationService, PricePeriod};
use crate::errors::Result;
use crate::holdings::{HoldingsSource, Portfolio};
use crate::optimizer::PortfolioOptimizer;
use crate::pnl::PnlService;
use crate::returns::ReturnsService;
use crate::risk::{RiskMetricsResult, RiskMetricsService};
use crate::snapshot::{BenchmarkSource, PortfolioSnapshot, SnapshotHistorySource};
use crate::transactions::{Transaction, TransactionSource};

use super::{AnalysisOptions, PortfolioAnalysis};

/// Weights of the overall score: risk, returns, diversification.
const RISK_SCORE_WEIGHT: Decimal = dec!(0.4);
const RETURN_SCORE_WEIGHT: Decimal = dec!(0.3);
const DIVERSIFICATION_SCORE_WEIGHT: Decimal = dec!(0.3);

pub struct AnalysisService {
    holdings_source: Arc<dyn HoldingsSource>,
    snapshot_source: Arc<dyn SnapshotHistorySource>,
    transaction_source: Arc<dyn TransactionSource>,
    benchmark_source: Option<Arc<dyn BenchmarkSource>>,
    optimizer: PortfolioOptimizer,
}

impl AnalysisService {
    pub fn new(
        holdings_source: Arc<dyn HoldingsSource>,
        snapshot_source: Arc<dyn SnapshotHistorySource>,
        transaction_source: Arc<dyn TransactionSource>,
    ) -> Self {
        AnalysisService {
            holdings_source,
            snapshot_source,
            transaction_source,
            benchmark_source: None,
            optimizer: PortfolioOptimizer::new(),
        }
    }

    pub fn with_benchmark(mut self, source: Arc<dyn BenchmarkSource>) -> Self {
        self.benchmark_source = Some(source);
        self
    }

    pub fn with_optimizer(mut self, optimizer: PortfolioOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Fetches the inputs from the collaborator sources and composes the
    /// report. Only a missing portfolio aborts the analysis; every other
    /// failing input degrades its own section.
    pub fn analyze(
        &self,
        portfolio_id: &str,
        options: &AnalysisOptions,
        as_of: DateTime<Utc>,
    ) -> Result<PortfolioAnalysis> {
        let portfolio = self.holdings_source.portfolio(portfolio_id)?;

        let snapshots = match self.snapshot_source.latest(portfolio_id, options.snapshot_count) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!("Snapshot history unavailable for {}: {}", portfolio_id, e);
                Vec::new()
            }
        };

        let benchmark = self.benchmark_source.as_ref().and_then(|source| {
            let periods = snapshots.len().saturating_sub(1);
            match source.returns(periods) {
                Ok(returns) => Some(returns),
                Err(e) => {
                    warn!("Benchmark series unavailable: {}", e);
                    None
                }
            }
        });

        let mut transactions_by_symbol = HashMap::new();
        for holding in portfolio.active_holdings() {
            match self
                .transaction_source
                .transactions_for_symbol(portfolio_id, &holding.symbol)
            {
                Ok(transactions) => {
                    transactions_by_symbol.insert(holding.symbol.clone(), transactions);
                }
                Err(e) => {
                    warn!("Transaction log unavailable for {}: {}", holding.symbol, e);
                }
            }
        }

        Ok(self.compose(
            &portfolio,
            &snapshots,
            benchmark.as_deref(),
            &transactions_by_symbol,
            options,
            as_of,
        ))
    }

    /// Pure composition over already-fetched inputs. Each section that fails
    /// is left at its zero-value report and recorded in `warnings`.
    pub fn compose(
        &self,
        portfolio: &Portfolio,
        snapshots: &[PortfolioSnapshot],
        benchmark: Option<&[Decimal]>,
        transactions_by_symbol: &HashMap<String, Vec<Transaction>>,
        options: &AnalysisOptions,
        as_of: DateTime<Utc>,
    ) -> PortfolioAnalysis {
        let mut warnings = Vec::new();

        let pnl = PnlService::calculate(portfolio, snapshots, as_of);

        let risk = if snapshots.len() < MIN_FULL_RISK_SNAPSHOTS {
            warnings.push(format!(
                "Risk metrics skipped: {} snapshots of {} required",
                snapshots.len(),
                MIN_FULL_RISK_SNAPSHOTS
            ));
            RiskMetricsResult::empty()
        } else {
            match RiskMetricsService::calculate(snapshots, benchmark, &options.risk) {
                Ok(risk) => risk,
                Err(e) => {
                    warnings.push(format!("Risk metrics failed: {}", e));
                    RiskMetricsResult::empty()
                }
            }
        };

        let returns = match ReturnsService::portfolio_returns(snapshots) {
            Ok(returns) => returns,
            Err(e) => {
                warnings.push(format!("Return metrics failed: {}", e));
                crate::returns::RoiMetrics::empty()
            }
        };

        let mut holding_returns = Vec::new();
        for holding in portfolio.active_holdings() {
            let Some(transactions) = transactions_by_symbol.get(&holding.symbol) else {
                continue;
            };
            match ReturnsService::holding_returns(
                &holding.symbol,
                transactions,
                holding.current_price,
                options.cost_basis_method,
            ) {
                Ok(roi) => holding_returns.push(roi),
                Err(e) => {
                    warnings.push(format!("Holding returns failed for {}: {}", holding.symbol, e));
                }
            }
        }

        // The per-period value breakdown in the snapshots stands in for a
        // price history: identical returns as long as quantities are stable.
        let symbols: Vec<String> = portfolio
            .active_holdings()
            .map(|h| h.symbol.clone())
            .collect();
        let periods: Vec<PricePeriod> = snapshots
            .iter()
            .map(|s| PricePeriod {
                observed_at: s.taken_at,
                prices: s.holding_values.clone(),
            })
            .collect();
        let correlation = CorrelationService::correlation_matrix(&symbols, &periods);
        let diversification = CorrelationService::diversification(portfolio, &correlation);

        let volatility_periods = match CorrelationService::volatility_clusters(snapshots) {
            Ok(periods) => periods,
            Err(e) => {
                warnings.push(format!("Volatility clustering failed: {}", e));
                Vec::new()
            }
        };

        let optimization = match self.optimizer.optimize(
            portfolio,
            options.strategy,
            &options.constraints,
            as_of,
        ) {
            Ok(result) => Some(result),
            Err(e) => {
                warnings.push(format!("Optimization failed: {}", e));
                None
            }
        };

        let mut recommendations = diversification.recommendations.clone();
        if risk.max_drawdown > dec!(0.2) {
            recommendations.push(format!(
                "Maximum drawdown reached {}%; consider de-risking into lower-volatility assets",
                (risk.max_drawdown * dec!(100)).round_dp(1)
            ));
        }
        if risk.period_count > 0 && risk.sharpe_ratio < Decimal::ZERO {
            recommendations.push(
                "Returns are below the risk-free rate on a risk-adjusted basis".to_string(),
            );
        }
        if risk.volatility > dec!(0.4) {
            recommendations.push(format!(
                "Annualized volatility is {}%; the portfolio is in high-risk territory",
                (risk.volatility * dec!(100)).round_dp(1)
            ));
        }

        let overall_score = Self::overall_score(&risk, &returns, diversification.score);

        PortfolioAnalysis {
            portfolio_id: portfolio.id.clone(),
            generated_at: as_of,
            pnl,
            risk,
            returns,
            holding_returns,
            correlation,
            diversification,
            volatility_periods,
            optimization,
            recommendations,
            overall_score,
            warnings,
        }
    }

    /// Composite health score: risk-adjusted performance, absolute return,
    /// and diversification, each scaled to 0-100 and weighted 40/30/30.
    fn overall_score(
        risk: &RiskMetricsResult,
        returns: &crate::returns::RoiMetrics,
        diversification_score: Decimal,
    ) -> Decimal {
        let fifty = dec!(50);
        let risk_score = (fifty + risk.sharpe_ratio * dec!(25)
            - risk.max_drawdown * dec!(100))
        .clamp(Decimal::ZERO, dec!(100));
        let return_score = (fifty + returns.annualized_return * dec!(250))
            .clamp(Decimal::ZERO, dec!(100));

        (risk_score * RISK_SCORE_WEIGHT
            + return_score * RETURN_SCORE_WEIGHT
            + diversification_score * DIVERSIFICATION_SCORE_WEIGHT)
            .round_dp(2)
    }
}
