//! Paperfolio Core - Portfolio analytics calculation engine.
//!
//! This crate contains the quantitative core of the Paperfolio simulated
//! trading platform: cost basis accounting, profit-and-loss, risk metrics,
//! return calculations, correlation/diversification analysis, and target
//! allocation optimization. It is storage- and transport-agnostic; collaborators
//! feed it holdings, transactions, and value snapshots through the traits in
//! the `*_traits` modules and persist the result records themselves.

pub mod analysis;
pub mod constants;
pub mod correlation;
pub mod errors;
pub mod holdings;
pub mod ledger;
pub mod optimizer;
pub mod pnl;
pub mod returns;
pub mod risk;
pub mod snapshot;
pub mod transactions;
pub mod utils;

// Re-export common types from the domain modules
pub use holdings::*;
pub use ledger::*;
pub use snapshot::*;
pub use transactions::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
