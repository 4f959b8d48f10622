#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::errors::Error;
    use crate::holdings::{AssetCategory, Holding, Portfolio};
    use crate::optimizer::{
        ActionKind, OptimizationConstraints, OptimizationStrategy, PortfolioOptimizer,
        RebalancingPolicy,
    };

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn holding(
        symbol: &str,
        category: AssetCategory,
        quantity: Decimal,
        average_cost: Decimal,
        price: Decimal,
    ) -> Holding {
        let mut h = Holding::new(symbol, category);
        h.quantity = quantity;
        h.average_cost = average_cost;
        h.current_price = price;
        h.first_activity = Some(now() - Duration::days(365));
        h
    }

    fn portfolio(holdings: Vec<Holding>) -> Portfolio {
        let mut p = Portfolio::new("user-1", "USD");
        p.holdings = holdings;
        p
    }

    fn weight_sum(result: &crate::optimizer::OptimizationResult) -> Decimal {
        result.target_weights.values().copied().sum()
    }

    // ==================== Strategies ====================

    #[test]
    fn test_equal_weight_splits_evenly() {
        let p = portfolio(vec![
            holding("AAPL", AssetCategory::Stock, dec!(10), dec!(100), dec!(150)),
            holding("BTC", AssetCategory::Crypto, dec!(1), dec!(40000), dec!(50000)),
            holding("TLT", AssetCategory::Bond, dec!(100), dec!(90), dec!(95)),
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::EqualWeight, &OptimizationConstraints::default(), now())
            .unwrap();

        for weight in result.target_weights.values() {
            assert_eq!(weight.round_dp(4), dec!(0.3333));
        }
        assert!((weight_sum(&result) - Decimal::ONE).abs() < dec!(0.001));
    }

    #[test]
    fn test_minimum_variance_prefers_low_variance_assets() {
        let p = portfolio(vec![
            holding("TLT", AssetCategory::Bond, dec!(100), dec!(90), dec!(95)),
            holding("BTC", AssetCategory::Crypto, dec!(1), dec!(40000), dec!(50000)),
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::MinimumVariance, &OptimizationConstraints::default(), now())
            .unwrap();

        let bond = result.target_weights["TLT"];
        let crypto = result.target_weights["BTC"];
        assert!(bond > crypto);
        assert!((weight_sum(&result) - Decimal::ONE).abs() < dec!(0.001));
    }

    #[test]
    fn test_maximum_sharpe_excludes_negative_excess_returns() {
        // LOSER has lost half its value over a year: strongly negative
        // expected return, excluded from the Sharpe-weighted mix.
        let p = portfolio(vec![
            holding("WINNER", AssetCategory::Stock, dec!(10), dec!(100), dec!(140)),
            holding("LOSER", AssetCategory::Stock, dec!(10), dec!(100), dec!(50)),
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::MaximumSharpe, &OptimizationConstraints::default(), now())
            .unwrap();

        assert_eq!(result.target_weights["LOSER"], Decimal::ZERO);
        assert_eq!(result.target_weights["WINNER"], Decimal::ONE);
    }

    #[test]
    fn test_maximum_sharpe_all_excluded_falls_back_to_equal() {
        let p = portfolio(vec![
            holding("A", AssetCategory::Stock, dec!(10), dec!(100), dec!(50)),
            holding("B", AssetCategory::Stock, dec!(10), dec!(100), dec!(40)),
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::MaximumSharpe, &OptimizationConstraints::default(), now())
            .unwrap();

        assert_eq!(result.target_weights["A"].round_dp(4), dec!(0.5));
        assert_eq!(result.target_weights["B"].round_dp(4), dec!(0.5));
    }

    #[test]
    fn test_risk_parity_weights_by_inverse_volatility() {
        let p = portfolio(vec![
            holding("TLT", AssetCategory::Bond, dec!(100), dec!(90), dec!(95)),
            holding("BTC", AssetCategory::Crypto, dec!(1), dec!(40000), dec!(50000)),
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::RiskParity, &OptimizationConstraints::default(), now())
            .unwrap();

        // Bond volatility 5%, crypto 80%: the bond dominates.
        assert!(result.target_weights["TLT"] > result.target_weights["BTC"]);
        assert!((weight_sum(&result) - Decimal::ONE).abs() < dec!(0.001));
    }

    // ==================== Actions, turnover, costs ====================

    #[test]
    fn test_actions_rebalance_concentrated_position() {
        let p = portfolio(vec![
            holding("AAPL", AssetCategory::Stock, dec!(100), dec!(100), dec!(100)), // 10000
            holding("MSFT", AssetCategory::Stock, dec!(0.001), dec!(100), dec!(100)), // dust value
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::EqualWeight, &OptimizationConstraints::default(), now())
            .unwrap();

        let aapl = result.actions.iter().find(|a| a.symbol == "AAPL").unwrap();
        let msft = result.actions.iter().find(|a| a.symbol == "MSFT").unwrap();
        assert_eq!(aapl.action, ActionKind::Sell);
        assert!(aapl.value_delta < Decimal::ZERO);
        assert!(aapl.quantity_delta < Decimal::ZERO);
        assert_eq!(msft.action, ActionKind::Buy);
        // Both legs move the same value, so both get a top-two priority.
        assert!(aapl.priority <= 2 && msft.priority <= 2);
    }

    #[test]
    fn test_turnover_and_cost_of_fifty_fifty_split() {
        let constraints = OptimizationConstraints {
            max_weight: dec!(0.9),
            min_weight: Decimal::ZERO,
            ..OptimizationConstraints::default()
        };
        let p = portfolio(vec![
            holding("A", AssetCategory::Stock, dec!(100), dec!(100), dec!(100)),
            holding("B", AssetCategory::Etf, dec!(0.0001), dec!(100), dec!(100)),
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::EqualWeight, &constraints, now())
            .unwrap();

        // Moving from ~100/0 to 50/50 turns over half the portfolio.
        assert_eq!(result.turnover.round_dp(3), dec!(0.5));
        assert_eq!(result.estimated_cost.round_dp(6), dec!(0.0005));
    }

    #[test]
    fn test_hold_action_for_tiny_deviation() {
        let p = portfolio(vec![
            holding("A", AssetCategory::Stock, dec!(100), dec!(100), dec!(100)),
            holding("B", AssetCategory::Etf, dec!(100), dec!(100), dec!(100)),
        ]);
        let result = PortfolioOptimizer::new()
            .optimize(&p, OptimizationStrategy::EqualWeight, &OptimizationConstraints::default(), now())
            .unwrap();

        assert!(result.actions.iter().all(|a| a.action == ActionKind::Hold));
        assert_eq!(result.turnover, Decimal::ZERO);
    }

    #[test]
    fn test_empty_portfolio_is_insufficient() {
        let p = portfolio(vec![]);
        let result = PortfolioOptimizer::new().optimize(
            &p,
            OptimizationStrategy::EqualWeight,
            &OptimizationConstraints::default(),
            now(),
        );
        assert!(matches!(result, Err(Error::Calculation(_))));
    }

    #[test]
    fn test_invalid_constraints_are_rejected() {
        let constraints = OptimizationConstraints {
            min_weight: dec!(0.5),
            max_weight: dec!(0.4),
            ..OptimizationConstraints::default()
        };
        let p = portfolio(vec![holding(
            "A",
            AssetCategory::Stock,
            dec!(1),
            dec!(100),
            dec!(100),
        )]);
        let result = PortfolioOptimizer::new().optimize(
            &p,
            OptimizationStrategy::EqualWeight,
            &constraints,
            now(),
        );
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    // ==================== Rebalancing checks ====================

    #[test]
    fn test_no_trigger_reports_next_scheduled_date() {
        let p = portfolio(vec![
            holding("A", AssetCategory::Stock, dec!(100), dec!(100), dec!(100)),
            holding("B", AssetCategory::Etf, dec!(100), dec!(100), dec!(100)),
        ]);
        let check = PortfolioOptimizer::new()
            .check_rebalancing(
                &p,
                dec!(0.2),
                &RebalancingPolicy::default(),
                &OptimizationConstraints::default(),
                now(),
            )
            .unwrap();

        assert!(!check.triggered);
        assert!(check.actions.is_empty());
        assert_eq!(check.next_scheduled, Some(now() + chrono::Duration::days(30)));
    }

    #[test]
    fn test_weight_deviation_triggers_equal_weight_actions() {
        let p = portfolio(vec![
            holding("A", AssetCategory::Stock, dec!(100), dec!(100), dec!(100)),
            holding("B", AssetCategory::Etf, dec!(10), dec!(100), dec!(100)),
        ]);
        let check = PortfolioOptimizer::new()
            .check_rebalancing(
                &p,
                dec!(0.1),
                &RebalancingPolicy::default(),
                &OptimizationConstraints::default(),
                now(),
            )
            .unwrap();

        assert!(check.triggered);
        assert!(!check.reasons.is_empty());
        assert!(!check.actions.is_empty());
        assert_eq!(check.next_scheduled, None);
    }

    #[test]
    fn test_high_volatility_triggers() {
        let p = portfolio(vec![
            holding("A", AssetCategory::Stock, dec!(100), dec!(100), dec!(100)),
            holding("B", AssetCategory::Etf, dec!(100), dec!(100), dec!(100)),
        ]);
        let check = PortfolioOptimizer::new()
            .check_rebalancing(
                &p,
                dec!(0.5),
                &RebalancingPolicy::default(),
                &OptimizationConstraints::default(),
                now(),
            )
            .unwrap();

        assert!(check.triggered);
        assert!(check.reasons.iter().any(|r| r.contains("volatility")));
    }

    // ==================== Weight-sum property ====================

    fn category_for(index: usize) -> AssetCategory {
        match index % 4 {
            0 => AssetCategory::Stock,
            1 => AssetCategory::Crypto,
            2 => AssetCategory::Bond,
            _ => AssetCategory::Etf,
        }
    }

    proptest! {
        #[test]
        fn prop_target_weights_sum_to_one(
            values in prop::collection::vec((1u32..100_000, 50u32..200_000), 1..8),
            strategy_index in 0usize..4,
        ) {
            let strategy = [
                OptimizationStrategy::EqualWeight,
                OptimizationStrategy::MinimumVariance,
                OptimizationStrategy::MaximumSharpe,
                OptimizationStrategy::RiskParity,
            ][strategy_index];

            let holdings: Vec<Holding> = values
                .iter()
                .enumerate()
                .map(|(i, &(qty, price_cents))| {
                    holding(
                        &format!("SYM{}", i),
                        category_for(i),
                        Decimal::from(qty),
                        Decimal::from(price_cents) / dec!(100),
                        Decimal::from(price_cents) / dec!(100),
                    )
                })
                .collect();
            let p = portfolio(holdings);

            let result = PortfolioOptimizer::new()
                .optimize(&p, strategy, &OptimizationConstraints::default(), now())
                .unwrap();
            let sum: Decimal = result.target_weights.values().copied().sum();
            prop_assert!((sum - Decimal::ONE).abs() < dec!(0.0001));
        }
    }
}
