//! Risk statistics over a portfolio value history.

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::constants::{DECIMAL_PRECISION, MIN_RETURN_SNAPSHOTS, TRADING_DAYS_PER_YEAR};
use crate::errors::{Error, Result};
use crate::snapshot::{simple_returns, PortfolioSnapshot};
use crate::utils::arithmetic::{
    annualization_factor, annualize_return, covariance, mean, sample_std_dev, sample_variance,
    percentile_index, years_between, Ratio,
};

use super::{RiskMetricsResult, RiskOptions};

const VOLATILITY_SHORT_WINDOW: usize = 30;
const VOLATILITY_LONG_WINDOW: usize = 90;

pub struct RiskMetricsService;

impl RiskMetricsService {
    /// Derives the full risk report from an ascending snapshot sequence and
    /// an optional benchmark return series aligned to the same periods.
    pub fn calculate(
        snapshots: &[PortfolioSnapshot],
        benchmark: Option<&[Decimal]>,
        options: &RiskOptions,
    ) -> Result<RiskMetricsResult> {
        if snapshots.len() < MIN_RETURN_SNAPSHOTS {
            return Err(Error::insufficient_data(MIN_RETURN_SNAPSHOTS, snapshots.len()));
        }
        let returns = simple_returns(snapshots);
        if returns.is_empty() {
            return Err(Error::insufficient_data(MIN_RETURN_SNAPSHOTS, 1));
        }

        let factor = annualization_factor();
        let trading_days = Decimal::from(TRADING_DAYS_PER_YEAR);
        let daily_risk_free = options.risk_free_rate / trading_days;

        let volatility = sample_std_dev(&returns) * factor;
        let volatility_30d = Self::windowed_volatility(&returns, VOLATILITY_SHORT_WINDOW);
        let volatility_90d = Self::windowed_volatility(&returns, VOLATILITY_LONG_WINDOW);

        // Sharpe: annualized mean excess return over annualized excess volatility.
        let excess: Vec<Decimal> = returns.iter().map(|r| r - daily_risk_free).collect();
        let sharpe_ratio =
            Ratio::over_positive(mean(&excess) * trading_days, sample_std_dev(&excess) * factor)
                .or_zero();

        // Sortino: same numerator, deviation of below-risk-free returns only.
        let downside: Vec<Decimal> = returns
            .iter()
            .copied()
            .filter(|r| *r < daily_risk_free)
            .collect();
        let sortino_ratio = if downside.is_empty() {
            debug!("No downside observations - Sortino left at zero");
            Decimal::ZERO
        } else {
            Ratio::over_positive(
                mean(&excess) * trading_days,
                sample_std_dev(&downside) * factor,
            )
            .or_zero()
        };

        let (max_drawdown, max_drawdown_periods) = Self::max_drawdown(snapshots);

        let (value_at_risk, conditional_value_at_risk) =
            Self::historical_var(&returns, options.var_confidence);

        let (beta, alpha, information_ratio) =
            Self::benchmark_relative(&returns, benchmark, options.risk_free_rate);

        let annualized = Self::annualized_return(snapshots);
        let calmar_ratio = Ratio::over_positive(annualized, max_drawdown).or_zero();
        let treynor_ratio =
            Ratio::over_positive(annualized - options.risk_free_rate, beta).or_zero();

        Ok(RiskMetricsResult {
            volatility: volatility.round_dp(DECIMAL_PRECISION),
            volatility_30d: volatility_30d.round_dp(DECIMAL_PRECISION),
            volatility_90d: volatility_90d.round_dp(DECIMAL_PRECISION),
            sharpe_ratio: sharpe_ratio.round_dp(DECIMAL_PRECISION),
            sortino_ratio: sortino_ratio.round_dp(DECIMAL_PRECISION),
            calmar_ratio: calmar_ratio.round_dp(DECIMAL_PRECISION),
            treynor_ratio: treynor_ratio.round_dp(DECIMAL_PRECISION),
            information_ratio: information_ratio.round_dp(DECIMAL_PRECISION),
            max_drawdown: max_drawdown.round_dp(DECIMAL_PRECISION),
            max_drawdown_periods,
            value_at_risk: value_at_risk.round_dp(DECIMAL_PRECISION),
            conditional_value_at_risk: conditional_value_at_risk.round_dp(DECIMAL_PRECISION),
            var_confidence: options.var_confidence,
            beta: beta.round_dp(DECIMAL_PRECISION),
            alpha: alpha.round_dp(DECIMAL_PRECISION),
            annualized_return: annualized.round_dp(DECIMAL_PRECISION),
            period_count: returns.len(),
        })
    }

    /// Annualized volatility over the trailing `window` returns, falling
    /// back to whatever history exists when shorter.
    fn windowed_volatility(returns: &[Decimal], window: usize) -> Decimal {
        let start = returns.len().saturating_sub(window);
        sample_std_dev(&returns[start..]) * annualization_factor()
    }

    /// Worst peak-to-trough decline over raw snapshot values, with the
    /// period count between peak and trough.
    fn max_drawdown(snapshots: &[PortfolioSnapshot]) -> (Decimal, usize) {
        let mut peak = Decimal::MIN;
        let mut peak_index = 0usize;
        let mut max_drawdown = Decimal::ZERO;
        let mut max_periods = 0usize;

        for (index, snapshot) in snapshots.iter().enumerate() {
            let value = snapshot.total_value;
            if value > peak {
                peak = value;
                peak_index = index;
                continue;
            }
            let drawdown = Ratio::over_positive(peak - value, peak).or_zero();
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
                max_periods = index - peak_index;
            }
        }

        (max_drawdown, max_periods)
    }

    /// Historical VaR/CVaR from the empirical return distribution, both
    /// reported as positive loss figures.
    fn historical_var(returns: &[Decimal], confidence: Decimal) -> (Decimal, Decimal) {
        let mut sorted = returns.to_vec();
        sorted.sort();

        let index = percentile_index(sorted.len(), confidence);
        let value_at_risk = (-sorted[index]).max(Decimal::ZERO);
        let tail = &sorted[..=index];
        let conditional = (-mean(tail)).max(Decimal::ZERO);
        (value_at_risk, conditional)
    }

    /// Beta, alpha, and information ratio against a benchmark series.
    /// Absent or degenerate benchmark data yields the neutral values
    /// (beta 1, alpha 0, information ratio 0).
    fn benchmark_relative(
        returns: &[Decimal],
        benchmark: Option<&[Decimal]>,
        risk_free_rate: Decimal,
    ) -> (Decimal, Decimal, Decimal) {
        let trading_days = Decimal::from(TRADING_DAYS_PER_YEAR);

        let Some(benchmark) = benchmark.filter(|b| b.len() >= 2) else {
            debug!("No usable benchmark series - beta defaults to 1");
            return (Decimal::ONE, Decimal::ZERO, Decimal::ZERO);
        };

        // Align to the most recent common periods when lengths differ.
        let common = returns.len().min(benchmark.len());
        if common < 2 {
            return (Decimal::ONE, Decimal::ZERO, Decimal::ZERO);
        }
        let portfolio_slice = &returns[returns.len() - common..];
        let benchmark_slice = &benchmark[benchmark.len() - common..];
        if portfolio_slice.len() != benchmark_slice.len() {
            warn!("Benchmark alignment failed - beta defaults to 1");
            return (Decimal::ONE, Decimal::ZERO, Decimal::ZERO);
        }

        let benchmark_variance = sample_variance(benchmark_slice);
        let beta = Ratio::over_positive(
            covariance(portfolio_slice, benchmark_slice),
            benchmark_variance,
        )
        .or(Decimal::ONE);

        let portfolio_annual = mean(portfolio_slice) * trading_days;
        let benchmark_annual = mean(benchmark_slice) * trading_days;
        let alpha =
            portfolio_annual - (risk_free_rate + beta * (benchmark_annual - risk_free_rate));

        let active: Vec<Decimal> = portfolio_slice
            .iter()
            .zip(benchmark_slice.iter())
            .map(|(p, b)| p - b)
            .collect();
        let information_ratio = Ratio::over_positive(
            mean(&active) * trading_days,
            sample_std_dev(&active) * annualization_factor(),
        )
        .or_zero();

        (beta, alpha, information_ratio)
    }

    /// Annualized return of the whole snapshot span; zero when the span or
    /// the value ratio is degenerate.
    fn annualized_return(snapshots: &[PortfolioSnapshot]) -> Decimal {
        let first = match snapshots.first() {
            Some(s) => s,
            None => return Decimal::ZERO,
        };
        let last = match snapshots.last() {
            Some(s) => s,
            None => return Decimal::ZERO,
        };
        let total_return = match Ratio::over_positive(last.total_value, first.total_value) {
            Ratio::Defined(ratio) => ratio - Decimal::ONE,
            Ratio::Degenerate => return Decimal::ZERO,
        };
        let years = years_between(first.taken_at, last.taken_at);
        annualize_return(total_return, years).or_zero()
    }
}
