//! Target-weight construction and rebalancing trade generation.

use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

use crate::constants::{DECIMAL_PRECISION, DEFAULT_RISK_FREE_RATE, DEFAULT_RISK_PREMIUM};
use crate::errors::{Error, Result};
use crate::holdings::{Holding, Portfolio};
use crate::utils::arithmetic::{annualize_return, years_between, Ratio};

use super::{
    ActionKind, CovarianceEstimator, CovarianceMatrix, HeuristicCovarianceEstimator,
    OptimizationConstraints, OptimizationResult, OptimizationStrategy, RebalancingAction,
    RebalancingCheck, RebalancingPolicy,
};

/// Weight changes smaller than this produce a HOLD action.
const REBALANCE_EPSILON: Decimal = dec!(0.005);

/// Expected-return estimates from short histories are clamped into this
/// range to keep annualization artifacts out of the weights.
const EXPECTED_RETURN_FLOOR: Decimal = dec!(-0.5);
const EXPECTED_RETURN_CAP: Decimal = dec!(1.5);

pub struct PortfolioOptimizer {
    estimator: Arc<dyn CovarianceEstimator>,
    risk_free_rate: Decimal,
}

impl Default for PortfolioOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PortfolioOptimizer {
    pub fn new() -> Self {
        PortfolioOptimizer {
            estimator: Arc::new(HeuristicCovarianceEstimator::default()),
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }

    pub fn with_estimator(estimator: Arc<dyn CovarianceEstimator>) -> Self {
        PortfolioOptimizer {
            estimator,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
        }
    }

    pub fn risk_free_rate(mut self, rate: Decimal) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Proposes target weights under the selected strategy and the trades to
    /// reach them.
    pub fn optimize(
        &self,
        portfolio: &Portfolio,
        strategy: OptimizationStrategy,
        constraints: &OptimizationConstraints,
        as_of: DateTime<Utc>,
    ) -> Result<OptimizationResult> {
        constraints.validate()?;

        let holdings: Vec<&Holding> = portfolio
            .active_holdings()
            .filter(|h| h.current_price > Decimal::ZERO)
            .collect();
        if holdings.is_empty() {
            return Err(Error::insufficient_data(1, 0));
        }

        let expected_returns = self.expected_asset_returns(&holdings, as_of);
        let covariance = self.estimator.estimate(&holdings);

        let raw = Self::strategy_weights(strategy, &expected_returns, &covariance, self.risk_free_rate);
        let target = Self::clamp_and_normalize(&raw, constraints);

        let securities_value: Decimal =
            holdings.iter().map(|h| h.quantity * h.current_price).sum();
        let current: Vec<Decimal> = holdings
            .iter()
            .map(|h| Ratio::over_positive(h.quantity * h.current_price, securities_value).or_zero())
            .collect();

        let actions = Self::actions(&holdings, &current, &target, securities_value);

        let expected_return: Decimal = target
            .iter()
            .zip(expected_returns.iter())
            .map(|(w, mu)| w * mu)
            .sum();
        let expected_volatility = Self::portfolio_volatility(&target, &covariance);
        let expected_sharpe = Ratio::over_positive(
            expected_return - self.risk_free_rate,
            expected_volatility,
        )
        .or_zero();

        let turnover: Decimal = current
            .iter()
            .zip(target.iter())
            .map(|(c, t)| (t - c).abs())
            .sum::<Decimal>()
            / dec!(2);
        if turnover > constraints.max_turnover {
            warn!(
                "Proposed turnover {} exceeds the configured limit {}",
                turnover.round_dp(4),
                constraints.max_turnover
            );
        }
        let estimated_cost = turnover * constraints.transaction_cost_rate;

        let symbol_map = |weights: &[Decimal]| -> HashMap<String, Decimal> {
            holdings
                .iter()
                .zip(weights.iter())
                .map(|(h, w)| (h.symbol.clone(), w.round_dp(DECIMAL_PRECISION)))
                .collect()
        };

        Ok(OptimizationResult {
            strategy,
            current_weights: symbol_map(&current),
            target_weights: symbol_map(&target),
            actions,
            expected_return: expected_return.round_dp(DECIMAL_PRECISION),
            expected_volatility: expected_volatility.round_dp(DECIMAL_PRECISION),
            expected_sharpe: expected_sharpe.round_dp(DECIMAL_PRECISION),
            turnover: turnover.round_dp(DECIMAL_PRECISION),
            estimated_cost: estimated_cost.round_dp(DECIMAL_PRECISION),
        })
    }

    /// Rebalancing trigger check: weight deviation from equal weight beyond
    /// the policy threshold, or volatility beyond its limit, produces an
    /// immediate equal-weight action list. Otherwise the next scheduled date
    /// for the configured frequency is reported.
    pub fn check_rebalancing(
        &self,
        portfolio: &Portfolio,
        volatility: Decimal,
        policy: &RebalancingPolicy,
        constraints: &OptimizationConstraints,
        as_of: DateTime<Utc>,
    ) -> Result<RebalancingCheck> {
        let holdings: Vec<&Holding> = portfolio
            .active_holdings()
            .filter(|h| h.current_price > Decimal::ZERO)
            .collect();
        if holdings.is_empty() {
            return Ok(RebalancingCheck {
                triggered: false,
                reasons: Vec::new(),
                actions: Vec::new(),
                next_scheduled: Some(as_of + Duration::days(policy.frequency.period_days())),
            });
        }

        let securities_value: Decimal =
            holdings.iter().map(|h| h.quantity * h.current_price).sum();
        let equal_weight = Decimal::ONE / Decimal::from(holdings.len() as u64);

        let mut reasons = Vec::new();
        for holding in &holdings {
            let weight = Ratio::over_positive(
                holding.quantity * holding.current_price,
                securities_value,
            )
            .or_zero();
            let deviation = (weight - equal_weight).abs();
            if deviation > policy.deviation_threshold {
                reasons.push(format!(
                    "{} deviates {}% from the equal-weight target",
                    holding.symbol,
                    (deviation * dec!(100)).round_dp(1)
                ));
            }
        }
        if volatility > policy.volatility_threshold {
            reasons.push(format!(
                "Portfolio volatility {} exceeds the {} threshold",
                volatility.round_dp(2),
                policy.volatility_threshold
            ));
        }

        if reasons.is_empty() {
            return Ok(RebalancingCheck {
                triggered: false,
                reasons,
                actions: Vec::new(),
                next_scheduled: Some(as_of + Duration::days(policy.frequency.period_days())),
            });
        }

        let result =
            self.optimize(portfolio, OptimizationStrategy::EqualWeight, constraints, as_of)?;
        Ok(RebalancingCheck {
            triggered: true,
            reasons,
            actions: result.actions,
            next_scheduled: None,
        })
    }

    /// Annualized historical PnL% per holding, falling back to risk-free
    /// plus a fixed premium when no usable history exists.
    fn expected_asset_returns(&self, holdings: &[&Holding], as_of: DateTime<Utc>) -> Vec<Decimal> {
        let fallback = self.risk_free_rate + DEFAULT_RISK_PREMIUM;
        holdings
            .iter()
            .map(|holding| {
                let invested = holding.invested();
                let Some(first_activity) = holding.first_activity else {
                    return fallback;
                };
                if invested <= Decimal::ZERO {
                    return fallback;
                }
                let gain_pct =
                    (holding.quantity * holding.current_price - invested) / invested;
                let years = years_between(first_activity, as_of);
                match annualize_return(gain_pct, years) {
                    Ratio::Defined(annualized) => {
                        annualized.clamp(EXPECTED_RETURN_FLOOR, EXPECTED_RETURN_CAP)
                    }
                    Ratio::Degenerate => {
                        debug!(
                            "No annualizable history for {} - using risk-free plus premium",
                            holding.symbol
                        );
                        fallback
                    }
                }
            })
            .collect()
    }

    fn strategy_weights(
        strategy: OptimizationStrategy,
        expected_returns: &[Decimal],
        covariance: &CovarianceMatrix,
        risk_free_rate: Decimal,
    ) -> Vec<Decimal> {
        let n = expected_returns.len();
        match strategy {
            OptimizationStrategy::EqualWeight => {
                vec![Decimal::ONE / Decimal::from(n as u64); n]
            }
            OptimizationStrategy::MinimumVariance => (0..n)
                .map(|i| Ratio::over_positive(Decimal::ONE, covariance.variance(i)).or_zero())
                .collect(),
            OptimizationStrategy::MaximumSharpe => {
                let scores: Vec<Decimal> = (0..n)
                    .map(|i| {
                        let excess = expected_returns[i] - risk_free_rate;
                        if excess > Decimal::ZERO {
                            Ratio::over_positive(excess, covariance.variance(i)).or_zero()
                        } else {
                            Decimal::ZERO
                        }
                    })
                    .collect();
                if scores.iter().all(|s| s.is_zero()) {
                    warn!("No holding has positive excess return - falling back to equal weights");
                    vec![Decimal::ONE / Decimal::from(n as u64); n]
                } else {
                    scores
                }
            }
            OptimizationStrategy::RiskParity => (0..n)
                .map(|i| {
                    let sigma = covariance.variance(i).sqrt().unwrap_or(Decimal::ZERO);
                    Ratio::over_positive(Decimal::ONE, sigma).or_zero()
                })
                .collect(),
        }
    }

    /// Clamps positive raw weights into the constraint band and renormalizes
    /// to a unit sum. Zero raw weights (strategy exclusions) stay zero.
    fn clamp_and_normalize(raw: &[Decimal], constraints: &OptimizationConstraints) -> Vec<Decimal> {
        let total: Decimal = raw.iter().sum();
        let proportional: Vec<Decimal> = if total > Decimal::ZERO {
            raw.iter().map(|w| w / total).collect()
        } else {
            let n = raw.len().max(1);
            vec![Decimal::ONE / Decimal::from(n as u64); raw.len()]
        };

        let clamped: Vec<Decimal> = proportional
            .iter()
            .map(|w| {
                if w.is_zero() {
                    Decimal::ZERO
                } else {
                    (*w).clamp(constraints.min_weight, constraints.max_weight)
                }
            })
            .collect();

        let clamped_total: Decimal = clamped.iter().sum();
        if clamped_total.is_zero() {
            return clamped;
        }
        clamped.iter().map(|w| w / clamped_total).collect()
    }

    fn actions(
        holdings: &[&Holding],
        current: &[Decimal],
        target: &[Decimal],
        securities_value: Decimal,
    ) -> Vec<RebalancingAction> {
        let mut actions: Vec<RebalancingAction> = holdings
            .iter()
            .zip(current.iter().zip(target.iter()))
            .map(|(holding, (&current_weight, &target_weight))| {
                let delta = target_weight - current_weight;
                let value_delta = (delta * securities_value).round_dp(DECIMAL_PRECISION);
                let action = if delta.abs() < REBALANCE_EPSILON {
                    ActionKind::Hold
                } else if delta.is_sign_positive() {
                    ActionKind::Buy
                } else {
                    ActionKind::Sell
                };
                let quantity_delta = Ratio::over_positive(value_delta, holding.current_price)
                    .or_zero()
                    .round_dp(DECIMAL_PRECISION);
                RebalancingAction {
                    symbol: holding.symbol.clone(),
                    action,
                    quantity_delta,
                    value_delta,
                    current_weight: current_weight.round_dp(DECIMAL_PRECISION),
                    target_weight: target_weight.round_dp(DECIMAL_PRECISION),
                    priority: 0,
                }
            })
            .collect();

        // Largest required change first.
        actions.sort_by(|a, b| {
            (b.target_weight - b.current_weight)
                .abs()
                .cmp(&(a.target_weight - a.current_weight).abs())
        });
        for (index, action) in actions.iter_mut().enumerate() {
            action.priority = index + 1;
        }
        actions
    }

    fn portfolio_volatility(weights: &[Decimal], covariance: &CovarianceMatrix) -> Decimal {
        let n = weights.len();
        let mut variance = Decimal::ZERO;
        for i in 0..n {
            for j in 0..n {
                variance += weights[i] * weights[j] * covariance.value(i, j);
            }
        }
        variance.max(Decimal::ZERO).sqrt().unwrap_or(Decimal::ZERO)
    }
}
