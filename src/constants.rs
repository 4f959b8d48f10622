use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision for reported metrics
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for internal ledger aggregates
pub const ROUNDING_SCALE: u32 = 8;

/// Quantity threshold for significant positions
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Trading days used for annualizing daily statistics
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Wall-clock year length for annualized return calculations
pub const DAYS_PER_YEAR_DECIMAL: Decimal = dec!(365.25);

/// sqrt(252), fallback when Decimal::sqrt is unavailable
pub const SQRT_TRADING_DAYS_APPROX: Decimal = dec!(15.874507866);

/// Default annual risk-free rate used by risk-adjusted ratios
pub const DEFAULT_RISK_FREE_RATE: Decimal = dec!(0.02);

/// Default confidence level for historical VaR / CVaR
pub const DEFAULT_VAR_CONFIDENCE: Decimal = dec!(0.95);

/// Premium over the risk-free rate assumed for holdings without usable history
pub const DEFAULT_RISK_PREMIUM: Decimal = dec!(0.04);

/// Minimum snapshots for any return-series calculation
pub const MIN_RETURN_SNAPSHOTS: usize = 2;

/// Minimum snapshots for volatility clustering
pub const MIN_CLUSTERING_SNAPSHOTS: usize = 10;

/// Minimum snapshots for the full risk metrics section of an analysis report
pub const MIN_FULL_RISK_SNAPSHOTS: usize = 30;
