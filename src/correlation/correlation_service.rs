//! Pairwise correlation, diversification scoring, and volatility clustering.

use log::debug;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::constants::{DECIMAL_PRECISION, MIN_CLUSTERING_SNAPSHOTS};
use crate::errors::{Error, Result};
use crate::holdings::Portfolio;
use crate::snapshot::{simple_returns, PortfolioSnapshot};
use crate::utils::arithmetic::{covariance, mean, sample_std_dev, sample_variance, Ratio};

use super::{
    CorrelatedPair, CorrelationMatrix, CorrelationStrength, DiversificationRiskLevel,
    DiversificationScore, PricePeriod, VolatilityPeriod, VolatilityRegime,
};

const STRONG_PAIR_THRESHOLD: Decimal = dec!(0.7);
const WEAK_PAIR_THRESHOLD: Decimal = dec!(0.3);
const ROLLING_VOLATILITY_WINDOW: usize = 7;
const HUNDRED: Decimal = dec!(100);

/// Sub-score weights of the diversification total: concentration,
/// correlation, sector.
const CONCENTRATION_WEIGHT: Decimal = dec!(0.4);
const CORRELATION_WEIGHT: Decimal = dec!(0.3);
const SECTOR_WEIGHT: Decimal = dec!(0.3);

pub struct CorrelationService;

impl CorrelationService {
    /// Builds the n x n correlation matrix for `symbols` from per-period
    /// price observations. For each pair, only periods where both symbols
    /// have a usable price contribute; fewer than two shared points, or a
    /// degenerate variance, yields a correlation of 0.
    pub fn correlation_matrix(symbols: &[String], periods: &[PricePeriod]) -> CorrelationMatrix {
        let n = symbols.len();
        if n == 0 {
            return CorrelationMatrix::empty();
        }

        // One price-per-period vector per symbol; None when the period has
        // no usable observation for it.
        let series: Vec<Vec<Option<Decimal>>> = symbols
            .iter()
            .map(|symbol| {
                periods
                    .iter()
                    .map(|p| p.prices.get(symbol).copied().filter(|v| *v > Decimal::ZERO))
                    .collect()
            })
            .collect();

        let mut values = vec![vec![Decimal::ZERO; n]; n];
        let mut strong_pairs = Vec::new();
        let mut weak_pairs = Vec::new();
        let mut off_diagonal = Vec::new();

        for i in 0..n {
            values[i][i] = Decimal::ONE;
            for j in (i + 1)..n {
                let correlation =
                    Self::pairwise_correlation(&series[i], &series[j]).round_dp(DECIMAL_PRECISION);
                values[i][j] = correlation;
                values[j][i] = correlation;
                off_diagonal.push(correlation);

                let pair = CorrelatedPair {
                    symbol_a: symbols[i].clone(),
                    symbol_b: symbols[j].clone(),
                    correlation,
                    strength: CorrelationStrength::classify(correlation),
                };
                if correlation.abs() >= STRONG_PAIR_THRESHOLD {
                    strong_pairs.push(pair);
                } else if correlation.abs() < WEAK_PAIR_THRESHOLD {
                    weak_pairs.push(pair);
                }
            }
        }

        CorrelationMatrix {
            symbols: symbols.to_vec(),
            values,
            average_correlation: mean(&off_diagonal).round_dp(DECIMAL_PRECISION),
            min_correlation: off_diagonal.iter().copied().min().unwrap_or(Decimal::ZERO),
            max_correlation: off_diagonal.iter().copied().max().unwrap_or(Decimal::ZERO),
            strong_pairs,
            weak_pairs,
        }
    }

    /// Pearson correlation of two observation series, over the periods where
    /// both have a price. Prices are converted to returns first.
    fn pairwise_correlation(xs: &[Option<Decimal>], ys: &[Option<Decimal>]) -> Decimal {
        let aligned: Vec<(Decimal, Decimal)> = xs
            .iter()
            .zip(ys.iter())
            .filter_map(|(x, y)| x.zip(*y))
            .collect();
        if aligned.len() < 2 {
            return Decimal::ZERO;
        }

        let mut returns_x = Vec::with_capacity(aligned.len() - 1);
        let mut returns_y = Vec::with_capacity(aligned.len() - 1);
        for window in aligned.windows(2) {
            let (prev_x, prev_y) = window[0];
            let (curr_x, curr_y) = window[1];
            if prev_x.is_zero() || prev_y.is_zero() {
                continue;
            }
            returns_x.push((curr_x - prev_x) / prev_x);
            returns_y.push((curr_y - prev_y) / prev_y);
        }
        Self::pearson(&returns_x, &returns_y)
    }

    /// Cov(x, y) / (sigma_x * sigma_y), zero when either series is too short
    /// or the variance product is non-positive.
    fn pearson(xs: &[Decimal], ys: &[Decimal]) -> Decimal {
        if xs.len() < 2 || ys.len() < 2 {
            return Decimal::ZERO;
        }
        let variance_product = sample_variance(xs) * sample_variance(ys);
        if variance_product <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let denominator = variance_product.sqrt().unwrap_or(Decimal::ZERO);
        Ratio::over_positive(covariance(xs, ys), denominator)
            .or_zero()
            .clamp(dec!(-1), Decimal::ONE)
    }

    /// Diversification score from value concentration, correlation risk, and
    /// sector concentration, weighted 40/30/30. Sub-scores are inverted so
    /// lower risk yields a higher score.
    pub fn diversification(portfolio: &Portfolio, matrix: &CorrelationMatrix) -> DiversificationScore {
        let holdings: Vec<_> = portfolio.active_holdings().collect();
        if holdings.is_empty() {
            debug!("No active holdings - diversification score left empty");
            return DiversificationScore::empty();
        }

        let securities_value: Decimal =
            holdings.iter().map(|h| h.quantity * h.current_price).sum();
        let weights: Vec<Decimal> = holdings
            .iter()
            .map(|h| {
                Ratio::over_positive(h.quantity * h.current_price, securities_value).or_zero()
            })
            .collect();

        let herfindahl_index: Decimal = weights.iter().map(|w| w * w).sum();
        let concentration_score =
            ((Decimal::ONE - herfindahl_index) * HUNDRED).clamp(Decimal::ZERO, HUNDRED);

        // Correlation risk counts only the highly correlated pairs.
        let correlation_score = if matrix.strong_pairs.is_empty() {
            HUNDRED
        } else {
            let magnitudes: Vec<Decimal> =
                matrix.strong_pairs.iter().map(|p| p.correlation.abs()).collect();
            ((Decimal::ONE - mean(&magnitudes)) * HUNDRED).clamp(Decimal::ZERO, HUNDRED)
        };

        let mut category_weights: std::collections::HashMap<&str, Decimal> =
            std::collections::HashMap::new();
        for (holding, weight) in holdings.iter().zip(weights.iter()) {
            *category_weights
                .entry(holding.category.as_str())
                .or_insert(Decimal::ZERO) += *weight;
        }
        let sector_herfindahl_index: Decimal =
            category_weights.values().map(|w| w * w).sum();
        let sector_score =
            ((Decimal::ONE - sector_herfindahl_index) * HUNDRED).clamp(Decimal::ZERO, HUNDRED);

        let score = (concentration_score * CONCENTRATION_WEIGHT
            + correlation_score * CORRELATION_WEIGHT
            + sector_score * SECTOR_WEIGHT)
            .round_dp(2);

        let risk_level = if score >= dec!(75) {
            DiversificationRiskLevel::Low
        } else if score >= dec!(50) {
            DiversificationRiskLevel::Moderate
        } else if score >= dec!(25) {
            DiversificationRiskLevel::High
        } else {
            DiversificationRiskLevel::Severe
        };

        let recommendations =
            Self::recommendations(&holdings, &weights, matrix, sector_herfindahl_index);

        DiversificationScore {
            score,
            concentration_score: concentration_score.round_dp(2),
            correlation_score: correlation_score.round_dp(2),
            sector_score: sector_score.round_dp(2),
            herfindahl_index: herfindahl_index.round_dp(DECIMAL_PRECISION),
            sector_herfindahl_index: sector_herfindahl_index.round_dp(DECIMAL_PRECISION),
            risk_level,
            recommendations,
        }
    }

    fn recommendations(
        holdings: &[&crate::holdings::Holding],
        weights: &[Decimal],
        matrix: &CorrelationMatrix,
        sector_herfindahl: Decimal,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if let Some((index, &weight)) = weights
            .iter()
            .enumerate()
            .max_by_key(|(_, w)| **w)
        {
            if weight > dec!(0.4) {
                recommendations.push(format!(
                    "Reduce concentration: {} is {}% of the portfolio",
                    holdings[index].symbol,
                    (weight * HUNDRED).round_dp(1)
                ));
            }
        }

        if !matrix.strong_pairs.is_empty() {
            let pair = &matrix.strong_pairs[0];
            recommendations.push(format!(
                "{} and {} move together (correlation {}); consider replacing one with a less correlated asset",
                pair.symbol_a,
                pair.symbol_b,
                pair.correlation.round_dp(2)
            ));
        }

        if sector_herfindahl > dec!(0.5) {
            recommendations
                .push("Holdings cluster in a single category; spread across more sectors".to_string());
        }

        if holdings.len() < 5 {
            recommendations.push(format!(
                "Only {} active holding(s); adding positions improves diversification",
                holdings.len()
            ));
        }

        recommendations
    }

    /// Detects volatility clusters: rolling-window standard deviation of
    /// returns, each window classified against 0.5x/1.5x the mean rolling
    /// volatility, consecutive same-regime windows merged.
    pub fn volatility_clusters(snapshots: &[PortfolioSnapshot]) -> Result<Vec<VolatilityPeriod>> {
        if snapshots.len() < MIN_CLUSTERING_SNAPSHOTS {
            return Err(Error::insufficient_data(
                MIN_CLUSTERING_SNAPSHOTS,
                snapshots.len(),
            ));
        }

        let returns = simple_returns(snapshots);
        if returns.len() < ROLLING_VOLATILITY_WINDOW {
            return Err(Error::insufficient_data(
                ROLLING_VOLATILITY_WINDOW + 1,
                returns.len() + 1,
            ));
        }

        let rolling: Vec<Decimal> = returns
            .windows(ROLLING_VOLATILITY_WINDOW)
            .map(sample_std_dev)
            .collect();
        let mean_volatility = mean(&rolling);
        let low_threshold = mean_volatility * dec!(0.5);
        let high_threshold = mean_volatility * dec!(1.5);

        let classify = |volatility: Decimal| {
            if volatility < low_threshold {
                VolatilityRegime::Low
            } else if volatility > high_threshold {
                VolatilityRegime::High
            } else {
                VolatilityRegime::Normal
            }
        };

        let mut periods: Vec<VolatilityPeriod> = Vec::new();
        let mut run: Vec<Decimal> = Vec::new();
        for (index, &volatility) in rolling.iter().enumerate() {
            let regime = classify(volatility);
            match periods.last_mut() {
                Some(last) if last.regime == regime => {
                    run.push(volatility);
                    last.end_index = index + ROLLING_VOLATILITY_WINDOW - 1;
                    last.average_volatility = mean(&run).round_dp(DECIMAL_PRECISION);
                }
                _ => {
                    run = vec![volatility];
                    periods.push(VolatilityPeriod {
                        regime,
                        start_index: index,
                        end_index: index + ROLLING_VOLATILITY_WINDOW - 1,
                        average_volatility: volatility.round_dp(DECIMAL_PRECISION),
                    });
                }
            }
        }

        Ok(periods)
    }
}
