use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::Result;

use super::PortfolioSnapshot;

/// Collaborator interface: ordered portfolio value history.
///
/// Implementations must return snapshots ascending by timestamp.
pub trait SnapshotHistorySource: Send + Sync {
    /// Most recent `count` snapshots, still ascending by timestamp.
    fn latest(&self, portfolio_id: &str, count: usize) -> Result<Vec<PortfolioSnapshot>>;

    /// Snapshots within [start, end], ascending by timestamp.
    fn range(
        &self,
        portfolio_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PortfolioSnapshot>>;
}

/// Collaborator interface: benchmark return series aligned in period to the
/// portfolio's own return series.
pub trait BenchmarkSource: Send + Sync {
    fn returns(&self, periods: usize) -> Result<Vec<Decimal>>;
}
