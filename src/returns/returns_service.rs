//! Return calculations over snapshot histories and transaction logs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::{DECIMAL_PRECISION, MIN_RETURN_SNAPSHOTS};
use crate::errors::{Error, Result};
use crate::ledger::{CostBasisLedger, CostBasisMethod};
use crate::snapshot::{simple_returns, PortfolioSnapshot};
use crate::transactions::{Transaction, TransactionKind};
use crate::utils::arithmetic::{annualize_ratio, annualize_return, years_between, Ratio};

use super::{HoldingRoi, RoiMetrics};

pub struct ReturnsService;

impl ReturnsService {
    /// Portfolio returns from an ascending snapshot sequence.
    pub fn portfolio_returns(snapshots: &[PortfolioSnapshot]) -> Result<RoiMetrics> {
        if snapshots.len() < MIN_RETURN_SNAPSHOTS {
            return Err(Error::insufficient_data(MIN_RETURN_SNAPSHOTS, snapshots.len()));
        }
        let first = snapshots.first().expect("length checked");
        let last = snapshots.last().expect("length checked");
        let years = years_between(first.taken_at, last.taken_at);

        let simple_return = Ratio::over_positive(last.gain, last.invested).or_zero();
        let holding_period_return = Ratio::over_positive(last.total_value, first.total_value)
            .or(Decimal::ONE)
            - Decimal::ONE;

        let cagr = match Ratio::over_positive(last.total_value, first.total_value) {
            Ratio::Defined(ratio) => annualize_ratio(ratio, years).or_zero(),
            Ratio::Degenerate => Decimal::ZERO,
        };
        let annualized_return = annualize_return(simple_return, years).or_zero();

        let time_weighted_return = Self::time_weighted(snapshots);
        let money_weighted_return = Self::money_weighted(snapshots);

        Ok(RoiMetrics {
            simple_return: simple_return.round_dp(DECIMAL_PRECISION),
            annualized_return: annualized_return.round_dp(DECIMAL_PRECISION),
            cagr: cagr.round_dp(DECIMAL_PRECISION),
            holding_period_return: holding_period_return.round_dp(DECIMAL_PRECISION),
            time_weighted_return: time_weighted_return.round_dp(DECIMAL_PRECISION),
            money_weighted_return: money_weighted_return.round_dp(DECIMAL_PRECISION),
            years: years.round_dp(DECIMAL_PRECISION),
            period_start: Some(first.taken_at),
            period_end: Some(last.taken_at),
        })
    }

    /// Product of (V_t / V_t-1) minus one; steps with a zero prior value are
    /// skipped by the return series derivation.
    fn time_weighted(snapshots: &[PortfolioSnapshot]) -> Decimal {
        let mut cumulative = Decimal::ONE;
        for period_return in simple_returns(snapshots) {
            cumulative *= Decimal::ONE + period_return;
        }
        cumulative - Decimal::ONE
    }

    /// Modified-Dietz per period, geometrically chained. Cash flow per
    /// period is the change in invested capital; the denominator weights the
    /// flow at half the period.
    fn money_weighted(snapshots: &[PortfolioSnapshot]) -> Decimal {
        let two = dec!(2);
        let mut cumulative = Decimal::ONE;
        for window in snapshots.windows(2) {
            let prev = &window[0];
            let curr = &window[1];
            let cash_flow = curr.invested - prev.invested;
            let gain = curr.total_value - prev.total_value - cash_flow;
            let period_return =
                Ratio::divide(gain, prev.total_value + cash_flow / two).or_zero();
            cumulative *= Decimal::ONE + period_return;
        }
        cumulative - Decimal::ONE
    }

    /// Return decomposition for one holding from its transaction log and a
    /// live price. Dividends are separated out before the ledger replay.
    pub fn holding_returns(
        symbol: &str,
        transactions: &[Transaction],
        current_price: Decimal,
        method: CostBasisMethod,
    ) -> Result<HoldingRoi> {
        let mut dividends = Decimal::ZERO;
        let mut trades = Vec::with_capacity(transactions.len());
        for tx in transactions {
            match tx.kind {
                TransactionKind::Dividend => {
                    tx.validate()?;
                    dividends += tx.gross_amount() - tx.fee;
                }
                _ => trades.push(tx.clone()),
            }
        }

        let state = CostBasisLedger::replay(symbol, &trades, method)?;

        let total_invested: Decimal = trades
            .iter()
            .filter(|tx| tx.kind == TransactionKind::Buy)
            .map(|tx| tx.gross_amount() + tx.fee)
            .sum();

        let unrealized_gain = state.quantity * current_price - state.cost_basis;
        let total_gain = state.realized_gain + unrealized_gain + dividends;
        let total_return = Ratio::over_positive(total_gain, total_invested).or_zero();

        Ok(HoldingRoi {
            symbol: symbol.to_string(),
            method,
            realized_gain: state.realized_gain.round_dp(DECIMAL_PRECISION),
            unrealized_gain: unrealized_gain.round_dp(DECIMAL_PRECISION),
            dividends: dividends.round_dp(DECIMAL_PRECISION),
            total_invested: total_invested.round_dp(DECIMAL_PRECISION),
            total_gain: total_gain.round_dp(DECIMAL_PRECISION),
            total_return: total_return.round_dp(DECIMAL_PRECISION),
        })
    }
}
