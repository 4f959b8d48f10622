#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::holdings::{AssetCategory, Holding, Portfolio};
    use crate::pnl::PnlService;
    use crate::snapshot::PortfolioSnapshot;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn portfolio_with_btc() -> Portfolio {
        let mut portfolio = Portfolio::new("user-1", "USD");
        portfolio.cash = dec!(10000);
        let mut btc = Holding::new("BTC", AssetCategory::Crypto);
        btc.quantity = dec!(1);
        btc.average_cost = dec!(45000);
        btc.current_price = dec!(50000);
        portfolio.holdings = vec![btc];
        portfolio
    }

    fn snapshot_aged(value: Decimal, age: Duration) -> PortfolioSnapshot {
        let portfolio = Portfolio::new("user-1", "USD");
        let mut snapshot = PortfolioSnapshot::capture(&portfolio, now() - age);
        snapshot.total_value = value;
        snapshot
    }

    // ==================== Per-holding and totals ====================

    #[test]
    fn test_unrealized_gain_example() {
        // 1 BTC, average cost 45k, price 50k: gain 5k, 11.11%
        let result = PnlService::calculate(&portfolio_with_btc(), &[], now());

        assert_eq!(result.holdings.len(), 1);
        let btc = &result.holdings[0];
        assert_eq!(btc.market_value, dec!(50000));
        assert_eq!(btc.invested, dec!(45000));
        assert_eq!(btc.unrealized_gain, dec!(5000));
        assert_eq!(btc.unrealized_gain_pct.round_dp(2), dec!(11.11));
        assert_eq!(result.total_value, dec!(60000));
        assert_eq!(result.securities_value, dec!(50000));
        assert_eq!(result.total_gain, dec!(5000));
    }

    #[test]
    fn test_weight_is_fraction_of_total_value() {
        let result = PnlService::calculate(&portfolio_with_btc(), &[], now());
        // 50000 of 60000
        assert_eq!(result.holdings[0].weight.round_dp(4), dec!(0.8333));
    }

    #[test]
    fn test_zero_invested_yields_zero_percent() {
        let mut portfolio = Portfolio::new("user-1", "USD");
        let mut free = Holding::new("AIR", AssetCategory::Other);
        free.quantity = dec!(10);
        free.average_cost = Decimal::ZERO;
        free.current_price = dec!(5);
        portfolio.holdings = vec![free];

        let result = PnlService::calculate(&portfolio, &[], now());
        assert_eq!(result.holdings[0].unrealized_gain, dec!(50));
        assert_eq!(result.holdings[0].unrealized_gain_pct, Decimal::ZERO);
        assert_eq!(result.total_gain_pct, Decimal::ZERO);
    }

    #[test]
    fn test_empty_portfolio_has_zero_weights_and_totals() {
        let portfolio = Portfolio::new("user-1", "USD");
        let result = PnlService::calculate(&portfolio, &[], now());
        assert_eq!(result.total_value, Decimal::ZERO);
        assert!(result.holdings.is_empty());
    }

    // ==================== Periodic change windows ====================

    #[test]
    fn test_day_change_uses_snapshot_in_24_to_48h_window() {
        let snapshots = vec![
            snapshot_aged(dec!(55000), Duration::days(10)),
            snapshot_aged(dec!(58000), Duration::hours(30)),
            snapshot_aged(dec!(59500), Duration::hours(2)), // too recent
        ];

        let result = PnlService::calculate(&portfolio_with_btc(), &snapshots, now());
        assert_eq!(result.day_change.amount, dec!(2000));
        // 2000 / 58000
        assert_eq!(result.day_change.percent.round_dp(2), dec!(3.45));
    }

    #[test]
    fn test_missing_window_leaves_change_at_zero() {
        let snapshots = vec![snapshot_aged(dec!(58000), Duration::hours(2))];
        let result = PnlService::calculate(&portfolio_with_btc(), &snapshots, now());

        assert_eq!(result.day_change.amount, Decimal::ZERO);
        assert_eq!(result.week_change.amount, Decimal::ZERO);
        assert_eq!(result.year_change.amount, Decimal::ZERO);
    }

    #[test]
    fn test_week_change_prefers_most_recent_in_window() {
        let snapshots = vec![
            snapshot_aged(dec!(50000), Duration::days(13)),
            snapshot_aged(dec!(57000), Duration::days(8)),
        ];
        let result = PnlService::calculate(&portfolio_with_btc(), &snapshots, now());
        assert_eq!(result.week_change.amount, dec!(3000));
    }

    // ==================== Refresh ====================

    #[test]
    fn test_refresh_recomputes_cached_fields() {
        let mut portfolio = portfolio_with_btc();
        // Poison the caches; refresh must not trust them.
        portfolio.holdings[0].market_value = dec!(1);
        portfolio.holdings[0].unrealized_gain = dec!(-999);
        portfolio.total_value = dec!(42);

        let refreshed = PnlService::refresh(&portfolio, now());
        assert_eq!(refreshed.holdings[0].market_value, dec!(50000));
        assert_eq!(refreshed.holdings[0].unrealized_gain, dec!(5000));
        assert_eq!(refreshed.total_value, dec!(60000));
        assert_eq!(refreshed.total_invested, dec!(45000));
        // The input portfolio is untouched.
        assert_eq!(portfolio.total_value, dec!(42));
    }

    #[test]
    fn test_idempotent_on_identical_inputs() {
        let portfolio = portfolio_with_btc();
        let first = PnlService::calculate(&portfolio, &[], now());
        let second = PnlService::calculate(&portfolio, &[], now());
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
