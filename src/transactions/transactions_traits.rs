use crate::errors::Result;

use super::Transaction;

/// Collaborator interface: per-symbol transaction history.
///
/// Implementations may return transactions in any order; calculators sort by
/// timestamp before replaying.
pub trait TransactionSource: Send + Sync {
    /// All transactions for one symbol within a portfolio.
    fn transactions_for_symbol(&self, portfolio_id: &str, symbol: &str)
        -> Result<Vec<Transaction>>;

    /// All transactions for a portfolio, across symbols.
    fn transactions(&self, portfolio_id: &str) -> Result<Vec<Transaction>>;
}
