//! Guarded decimal arithmetic and shared statistics helpers.
//!
//! Every ratio in the engine yields a neutral value instead of a fault when
//! its denominator is degenerate. `Ratio` keeps that fallback explicit and
//! testable instead of scattering ad-hoc zero checks.

use chrono::{DateTime, Utc};
use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};

use crate::constants::{DAYS_PER_YEAR_DECIMAL, SQRT_TRADING_DAYS_APPROX, TRADING_DAYS_PER_YEAR};

/// Outcome of a guarded ratio computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ratio {
    Defined(Decimal),
    Degenerate,
}

impl Ratio {
    /// Division guarded against a zero denominator.
    pub fn divide(numerator: Decimal, denominator: Decimal) -> Self {
        if denominator.is_zero() {
            Ratio::Degenerate
        } else {
            Ratio::Defined(numerator / denominator)
        }
    }

    /// Division defined only for a strictly positive denominator.
    /// Risk-adjusted ratios use this form: a zero or negative denominator
    /// yields the neutral value, never a fault.
    pub fn over_positive(numerator: Decimal, denominator: Decimal) -> Self {
        if denominator > Decimal::ZERO {
            Ratio::Defined(numerator / denominator)
        } else {
            Ratio::Degenerate
        }
    }

    pub fn or_zero(self) -> Decimal {
        self.or(Decimal::ZERO)
    }

    pub fn or(self, fallback: Decimal) -> Decimal {
        match self {
            Ratio::Defined(value) => value,
            Ratio::Degenerate => fallback,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Ratio::Degenerate)
    }
}

pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let count = Decimal::from_usize(values.len()).unwrap_or(Decimal::ONE);
    values.iter().sum::<Decimal>() / count
}

/// Sample variance (n - 1 denominator). Zero for fewer than two observations.
pub fn sample_variance(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let count = Decimal::from_usize(values.len()).unwrap_or(Decimal::ONE);
    let avg = mean(values);
    let sum_squared_diff: Decimal = values
        .iter()
        .map(|&v| {
            let diff = v - avg;
            diff * diff
        })
        .sum();
    let variance = sum_squared_diff / (count - Decimal::ONE);
    variance.max(Decimal::ZERO)
}

pub fn sample_std_dev(values: &[Decimal]) -> Decimal {
    sample_variance(values).sqrt().unwrap_or(Decimal::ZERO)
}

/// Sample covariance of two equally long series. Zero when the series are
/// shorter than two points or their lengths differ.
pub fn covariance(xs: &[Decimal], ys: &[Decimal]) -> Decimal {
    if xs.len() != ys.len() || xs.len() < 2 {
        return Decimal::ZERO;
    }
    let count = Decimal::from_usize(xs.len()).unwrap_or(Decimal::ONE);
    let mean_x = mean(xs);
    let mean_y = mean(ys);
    let sum: Decimal = xs
        .iter()
        .zip(ys.iter())
        .map(|(&x, &y)| (x - mean_x) * (y - mean_y))
        .sum();
    sum / (count - Decimal::ONE)
}

pub fn annualization_factor() -> Decimal {
    Decimal::from(TRADING_DAYS_PER_YEAR)
        .sqrt()
        .unwrap_or(SQRT_TRADING_DAYS_APPROX)
}

/// Elapsed span between two timestamps in 365.25-day years.
pub fn years_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        return Decimal::ZERO;
    }
    let days = Decimal::from(seconds) / Decimal::from(86_400u32);
    days / DAYS_PER_YEAR_DECIMAL
}

/// Solves ratio^(1/years) - 1. Degenerate when years or the base is
/// non-positive (fractional powers of non-positive numbers are undefined).
pub fn annualize_ratio(ratio: Decimal, years: Decimal) -> Ratio {
    if years <= Decimal::ZERO || ratio <= Decimal::ZERO {
        return Ratio::Degenerate;
    }
    let exponent = Decimal::ONE / years;
    Ratio::Defined(ratio.powd(exponent) - Decimal::ONE)
}

/// Annualizes a cumulative return over the given span, with the same
/// degenerate-base guard as `annualize_ratio`.
pub fn annualize_return(total_return: Decimal, years: Decimal) -> Ratio {
    annualize_ratio(Decimal::ONE + total_return, years)
}

/// Index of the p-th percentile loss in an ascending return distribution:
/// floor(n * (1 - confidence)), clamped to the last index.
pub fn percentile_index(count: usize, confidence: Decimal) -> usize {
    if count == 0 {
        return 0;
    }
    let fraction = (Decimal::ONE - confidence).max(Decimal::ZERO);
    let raw = Decimal::from_usize(count).unwrap_or(Decimal::ONE) * fraction;
    let index = raw.floor().to_usize().unwrap_or(0);
    index.min(count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_divide_by_zero_is_degenerate() {
        assert!(Ratio::divide(dec!(5), Decimal::ZERO).is_degenerate());
        assert_eq!(Ratio::divide(dec!(5), Decimal::ZERO).or_zero(), Decimal::ZERO);
        assert_eq!(Ratio::divide(dec!(6), dec!(3)).or_zero(), dec!(2));
    }

    #[test]
    fn test_over_positive_rejects_negative_denominator() {
        assert!(Ratio::over_positive(dec!(1), dec!(-2)).is_degenerate());
        assert_eq!(Ratio::over_positive(dec!(1), dec!(-2)).or(Decimal::ONE), Decimal::ONE);
        assert_eq!(Ratio::over_positive(dec!(1), dec!(4)).or_zero(), dec!(0.25));
    }

    #[test]
    fn test_sample_std_dev() {
        let values = vec![dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)];
        let std = sample_std_dev(&values);
        // Sample std dev of this classic series is ~2.138
        assert!(std > dec!(2.13) && std < dec!(2.14));
    }

    #[test]
    fn test_std_dev_short_series_is_zero() {
        assert_eq!(sample_std_dev(&[dec!(1)]), Decimal::ZERO);
        assert_eq!(sample_std_dev(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_covariance_of_comoving_series() {
        let xs = vec![dec!(0.01), dec!(0.02), dec!(0.03)];
        let cov = covariance(&xs, &xs);
        assert_eq!(cov, sample_variance(&xs));
    }

    #[test]
    fn test_annualize_degenerate_base() {
        assert!(annualize_return(dec!(-1), dec!(2)).is_degenerate());
        assert!(annualize_return(dec!(0.10), Decimal::ZERO).is_degenerate());
    }

    #[test]
    fn test_annualize_doubles_in_two_years() {
        // (2.0)^(1/2) - 1 = ~41.42%
        let annualized = annualize_return(dec!(1.0), dec!(2)).or_zero();
        assert!(annualized > dec!(0.414) && annualized < dec!(0.415));
    }

    #[test]
    fn test_percentile_index_clamped() {
        assert_eq!(percentile_index(100, dec!(0.95)), 5);
        assert_eq!(percentile_index(3, dec!(0.95)), 0);
        assert_eq!(percentile_index(10, Decimal::ZERO), 9);
        assert_eq!(percentile_index(0, dec!(0.95)), 0);
    }
}
