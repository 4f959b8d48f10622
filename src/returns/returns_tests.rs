#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::errors::{CalculatorError, Error};
    use crate::holdings::Portfolio;
    use crate::ledger::CostBasisMethod;
    use crate::returns::ReturnsService;
    use crate::snapshot::PortfolioSnapshot;
    use crate::transactions::{Transaction, TransactionKind};

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset)
    }

    fn snapshot(value: Decimal, invested: Decimal, offset: i64) -> PortfolioSnapshot {
        let portfolio = Portfolio::new("user-1", "USD");
        let mut s = PortfolioSnapshot::capture(&portfolio, day(offset));
        s.total_value = value;
        s.invested = invested;
        s.gain = value - invested;
        s
    }

    fn tx(kind: TransactionKind, qty: Decimal, price: Decimal, offset: i64) -> Transaction {
        Transaction::new("AAPL", kind, qty, price, Decimal::ZERO, day(offset))
    }

    // ==================== Portfolio returns ====================

    #[test]
    fn test_requires_two_snapshots() {
        let result = ReturnsService::portfolio_returns(&[snapshot(dec!(100), dec!(100), 0)]);
        assert!(matches!(
            result,
            Err(Error::Calculation(CalculatorError::InsufficientData { required: 2, actual: 1 }))
        ));
    }

    #[test]
    fn test_time_weighted_return_chains_periods() {
        // [100, 110, 99, 105] telescopes to 105/100 - 1 = 5%
        let snapshots = vec![
            snapshot(dec!(100), dec!(100), 0),
            snapshot(dec!(110), dec!(100), 1),
            snapshot(dec!(99), dec!(100), 2),
            snapshot(dec!(105), dec!(100), 3),
        ];
        let metrics = ReturnsService::portfolio_returns(&snapshots).unwrap();

        assert_eq!(metrics.time_weighted_return.round_dp(4), dec!(0.05));
        assert_eq!(metrics.holding_period_return, dec!(0.05));
        // No cash flows: money-weighted matches time-weighted.
        assert_eq!(metrics.money_weighted_return.round_dp(4), dec!(0.05));
    }

    #[test]
    fn test_cagr_over_one_year() {
        let snapshots = vec![
            snapshot(dec!(100), dec!(100), 0),
            snapshot(dec!(110), dec!(100), 365),
        ];
        let metrics = ReturnsService::portfolio_returns(&snapshots).unwrap();

        assert_eq!(metrics.cagr.round_dp(2), dec!(0.10));
        assert_eq!(metrics.years.round_dp(2), dec!(1.00));
    }

    #[test]
    fn test_zero_span_annualization_falls_back_to_zero() {
        // Two snapshots at the same instant: years = 0, fractional powers undefined.
        let snapshots = vec![snapshot(dec!(100), dec!(100), 0), snapshot(dec!(110), dec!(100), 0)];
        let metrics = ReturnsService::portfolio_returns(&snapshots).unwrap();

        assert_eq!(metrics.cagr, Decimal::ZERO);
        assert_eq!(metrics.annualized_return, Decimal::ZERO);
        assert_eq!(metrics.holding_period_return, dec!(0.1));
    }

    #[test]
    fn test_total_loss_has_no_defined_cagr() {
        let snapshots = vec![snapshot(dec!(100), dec!(100), 0), snapshot(dec!(0), dec!(100), 365)];
        let metrics = ReturnsService::portfolio_returns(&snapshots).unwrap();

        // end/start is zero: non-positive base, CAGR falls back to 0.
        assert_eq!(metrics.cagr, Decimal::ZERO);
        assert_eq!(metrics.holding_period_return, dec!(-1));
    }

    #[test]
    fn test_simple_return_from_latest_snapshot() {
        let snapshots = vec![
            snapshot(dec!(100), dec!(90), 0),
            snapshot(dec!(120), dec!(90), 30),
        ];
        let metrics = ReturnsService::portfolio_returns(&snapshots).unwrap();

        // gain 30 over invested 90
        assert_eq!(metrics.simple_return.round_dp(4), dec!(0.3333));
    }

    #[test]
    fn test_money_weighted_with_mid_period_contribution() {
        // 100 -> 210 with 100 contributed: gain 10 on an average base of 150.
        let snapshots = vec![
            snapshot(dec!(100), dec!(100), 0),
            snapshot(dec!(210), dec!(200), 30),
        ];
        let metrics = ReturnsService::portfolio_returns(&snapshots).unwrap();

        assert_eq!(metrics.money_weighted_return.round_dp(4), dec!(0.0667));
        // Time-weighted treats the flow as performance-neutral growth of 110%.
        assert_eq!(metrics.time_weighted_return.round_dp(4), dec!(1.1));
    }

    // ==================== Holding returns ====================

    #[test]
    fn test_holding_decomposition() {
        let txs = vec![
            tx(TransactionKind::Buy, dec!(2), dec!(100), 0),
            tx(TransactionKind::Sell, dec!(1), dec!(150), 10),
            tx(TransactionKind::Dividend, dec!(1), dec!(5), 20),
        ];
        let roi =
            ReturnsService::holding_returns("AAPL", &txs, dec!(120), CostBasisMethod::Fifo)
                .unwrap();

        assert_eq!(roi.realized_gain, dec!(50));
        assert_eq!(roi.unrealized_gain, dec!(20));
        assert_eq!(roi.dividends, dec!(5));
        assert_eq!(roi.total_invested, dec!(200));
        assert_eq!(roi.total_gain, dec!(75));
        assert_eq!(roi.total_return, dec!(0.375));
    }

    #[test]
    fn test_dividend_only_log_has_zero_return() {
        let txs = vec![tx(TransactionKind::Dividend, dec!(10), dec!(0.5), 0)];
        let roi =
            ReturnsService::holding_returns("AAPL", &txs, dec!(100), CostBasisMethod::Fifo)
                .unwrap();

        assert_eq!(roi.dividends, dec!(5));
        assert_eq!(roi.total_invested, Decimal::ZERO);
        // No invested capital: the ratio collapses to zero instead of faulting.
        assert_eq!(roi.total_return, Decimal::ZERO);
    }

    #[test]
    fn test_holding_returns_respects_cost_basis_method() {
        let txs = vec![
            tx(TransactionKind::Buy, dec!(1), dec!(100), 0),
            tx(TransactionKind::Buy, dec!(1), dec!(200), 1),
            tx(TransactionKind::Sell, dec!(1), dec!(250), 2),
        ];

        let fifo =
            ReturnsService::holding_returns("AAPL", &txs, dec!(250), CostBasisMethod::Fifo)
                .unwrap();
        let lifo =
            ReturnsService::holding_returns("AAPL", &txs, dec!(250), CostBasisMethod::Lifo)
                .unwrap();

        // FIFO sells the 100-cost lot, LIFO the 200-cost lot.
        assert_eq!(fifo.realized_gain, dec!(150));
        assert_eq!(lifo.realized_gain, dec!(50));
        // Total gain is method-independent when everything is marked to market.
        assert_eq!(fifo.total_gain, lifo.total_gain);
    }
}
