//! Profit-and-loss over live prices and historical snapshots.

use chrono::{DateTime, Duration, Utc};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::DECIMAL_PRECISION;
use crate::holdings::Portfolio;
use crate::snapshot::PortfolioSnapshot;
use crate::utils::arithmetic::Ratio;

use super::{HoldingPnl, PeriodChange, PnlResult};

const HUNDRED: Decimal = dec!(100);

/// Stateless PnL calculator. Every derived figure is recomputed from
/// quantity, price, and average cost; cached fields on the inputs are
/// ignored.
pub struct PnlService;

impl PnlService {
    /// Full PnL report for one portfolio. `snapshots` is the ascending
    /// value history used for the periodic change figures; an empty slice
    /// leaves those at zero.
    pub fn calculate(
        portfolio: &Portfolio,
        snapshots: &[PortfolioSnapshot],
        as_of: DateTime<Utc>,
    ) -> PnlResult {
        let mut result = PnlResult::empty(&portfolio.id, &portfolio.currency, as_of);
        result.cash = portfolio.cash;

        let securities_value: Decimal = portfolio
            .holdings
            .iter()
            .map(|h| h.quantity * h.current_price)
            .sum();
        let total_value = securities_value + portfolio.cash;

        for holding in &portfolio.holdings {
            let market_value = holding.quantity * holding.current_price;
            let invested = holding.invested();
            let unrealized_gain = market_value - invested;

            result.holdings.push(HoldingPnl {
                symbol: holding.symbol.clone(),
                category: holding.category,
                quantity: holding.quantity,
                current_price: holding.current_price,
                market_value,
                invested,
                unrealized_gain,
                unrealized_gain_pct: (Ratio::over_positive(unrealized_gain, invested).or_zero()
                    * HUNDRED)
                    .round_dp(DECIMAL_PRECISION),
                realized_gain: holding.realized_gain,
                weight: Ratio::over_positive(market_value, total_value)
                    .or_zero()
                    .round_dp(DECIMAL_PRECISION),
            });

            result.total_invested += invested;
            result.unrealized_gain += unrealized_gain;
            result.realized_gain += holding.realized_gain;
        }

        result.securities_value = securities_value;
        result.total_value = total_value;
        result.total_gain = result.unrealized_gain + result.realized_gain;
        result.total_gain_pct = (Ratio::over_positive(result.total_gain, result.total_invested)
            .or_zero()
            * HUNDRED)
            .round_dp(DECIMAL_PRECISION);

        result.day_change =
            Self::period_change(total_value, snapshots, as_of, Duration::hours(24), Duration::hours(48));
        result.week_change =
            Self::period_change(total_value, snapshots, as_of, Duration::days(7), Duration::days(14));
        result.month_change =
            Self::period_change(total_value, snapshots, as_of, Duration::days(30), Duration::days(60));
        result.year_change =
            Self::period_change(total_value, snapshots, as_of, Duration::days(365), Duration::days(730));

        result
    }

    /// Returns a copy of the portfolio with every cached aggregate
    /// (market value, gains, weights, totals) re-derived.
    pub fn refresh(portfolio: &Portfolio, as_of: DateTime<Utc>) -> Portfolio {
        let mut refreshed = portfolio.clone();

        let securities_value: Decimal = refreshed
            .holdings
            .iter()
            .map(|h| h.quantity * h.current_price)
            .sum();
        let total_value = securities_value + refreshed.cash;

        let mut total_invested = Decimal::ZERO;
        let mut unrealized = Decimal::ZERO;
        let mut realized = Decimal::ZERO;
        for holding in refreshed.holdings.iter_mut() {
            holding.market_value = holding.quantity * holding.current_price;
            let invested = holding.invested();
            holding.unrealized_gain = holding.market_value - invested;
            holding.unrealized_gain_pct = (Ratio::over_positive(holding.unrealized_gain, invested)
                .or_zero()
                * HUNDRED)
                .round_dp(DECIMAL_PRECISION);
            holding.weight = Ratio::over_positive(holding.market_value, total_value)
                .or_zero()
                .round_dp(DECIMAL_PRECISION);

            total_invested += invested;
            unrealized += holding.unrealized_gain;
            realized += holding.realized_gain;
        }

        refreshed.total_value = total_value;
        refreshed.total_invested = total_invested;
        refreshed.total_gain = unrealized + realized;
        refreshed.total_gain_pct = (Ratio::over_positive(refreshed.total_gain, total_invested)
            .or_zero()
            * HUNDRED)
            .round_dp(DECIMAL_PRECISION);
        refreshed.updated_at = as_of;
        refreshed
    }

    /// Differences the current total against the most recent snapshot whose
    /// age falls inside [min_age, max_age). No snapshot in the window leaves
    /// the change at zero rather than failing.
    fn period_change(
        current_total: Decimal,
        snapshots: &[PortfolioSnapshot],
        as_of: DateTime<Utc>,
        min_age: Duration,
        max_age: Duration,
    ) -> PeriodChange {
        let reference = snapshots.iter().rev().find(|s| {
            let age = as_of - s.taken_at;
            age >= min_age && age < max_age
        });

        match reference {
            Some(snapshot) => {
                let amount = current_total - snapshot.total_value;
                PeriodChange {
                    amount,
                    percent: (Ratio::over_positive(amount, snapshot.total_value).or_zero()
                        * HUNDRED)
                        .round_dp(DECIMAL_PRECISION),
                }
            }
            None => {
                debug!(
                    "No snapshot aged between {}h and {}h - period change left at zero",
                    min_age.num_hours(),
                    max_age.num_hours()
                );
                PeriodChange::default()
            }
        }
    }
}
