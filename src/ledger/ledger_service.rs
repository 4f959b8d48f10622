//! Cost basis replay under FIFO, LIFO, and weighted-average conventions.

use log::warn;
use rust_decimal::Decimal;

use crate::constants::ROUNDING_SCALE;
use crate::errors::{Result, ValidationError};
use crate::transactions::{Transaction, TransactionKind};
use crate::utils::arithmetic::Ratio;

use super::{CostBasisMethod, LedgerState, Lot};

/// Replays a transaction log into current (quantity, average cost) state.
///
/// Stateless: every call validates, sorts by timestamp ascending, and folds
/// the full history. Quantity is conserved exactly (sum of buys minus sum of
/// sells); total invested is always quantity x average cost.
pub struct CostBasisLedger;

impl CostBasisLedger {
    pub fn replay(
        symbol: &str,
        transactions: &[Transaction],
        method: CostBasisMethod,
    ) -> Result<LedgerState> {
        for tx in transactions {
            tx.validate()?;
            if tx.kind == TransactionKind::Dividend {
                return Err(ValidationError::InvalidInput(format!(
                    "Transaction {} has kind {} - the cost basis ledger only replays BUY/SELL",
                    tx.id,
                    tx.kind.as_str()
                ))
                .into());
            }
            if tx.symbol != symbol {
                return Err(ValidationError::InvalidInput(format!(
                    "Transaction {} is for symbol {} but the ledger replays {}",
                    tx.id, tx.symbol, symbol
                ))
                .into());
            }
        }

        let mut ordered: Vec<&Transaction> = transactions.iter().collect();
        ordered.sort_by_key(|tx| tx.executed_at);

        let mut state = LedgerState::empty(symbol, method);
        // Weighted-average running aggregate; FIFO/LIFO use state.open_lots.
        let mut running_cost = Decimal::ZERO;

        for tx in ordered {
            match tx.kind {
                TransactionKind::Buy => {
                    Self::apply_buy(&mut state, &mut running_cost, tx);
                }
                TransactionKind::Sell => {
                    Self::apply_sell(&mut state, &mut running_cost, tx)?;
                }
                TransactionKind::Dividend => unreachable!("rejected during validation"),
            }
            if state.first_activity.is_none() {
                state.first_activity = Some(tx.executed_at);
            }
            state.last_activity = Some(tx.executed_at);
            state.transaction_count += 1;
        }

        Self::finalize(&mut state, running_cost);
        Ok(state)
    }

    fn apply_buy(state: &mut LedgerState, running_cost: &mut Decimal, tx: &Transaction) {
        // Buy fees are capitalized into the lot's cost basis.
        let cost_basis = (tx.gross_amount() + tx.fee).round_dp(ROUNDING_SCALE);
        state.total_bought += tx.quantity;
        match state.method {
            CostBasisMethod::Fifo | CostBasisMethod::Lifo => {
                state
                    .open_lots
                    .push_back(Lot::new(tx.quantity, tx.price, cost_basis, tx.executed_at));
            }
            CostBasisMethod::AverageCost => {
                *running_cost += cost_basis;
            }
        }
    }

    fn apply_sell(
        state: &mut LedgerState,
        running_cost: &mut Decimal,
        tx: &Transaction,
    ) -> Result<()> {
        let available = match state.method {
            CostBasisMethod::AverageCost => state.total_bought - state.total_sold,
            _ => state.open_lots.iter().map(|lot| lot.quantity).sum(),
        };
        if tx.quantity > available {
            return Err(ValidationError::InsufficientQuantity {
                symbol: state.symbol.clone(),
                available,
                needed: tx.quantity,
            }
            .into());
        }

        let proceeds = (tx.gross_amount() - tx.fee).round_dp(ROUNDING_SCALE);
        let consumed_basis = match state.method {
            CostBasisMethod::Fifo => Self::consume_lots(&mut state.open_lots, tx.quantity, false),
            CostBasisMethod::Lifo => Self::consume_lots(&mut state.open_lots, tx.quantity, true),
            CostBasisMethod::AverageCost => {
                // Remove at the current average price; the average is unchanged.
                let held = state.total_bought - state.total_sold;
                let average = Ratio::divide(*running_cost, held).or_zero();
                let consumed = (average * tx.quantity).round_dp(ROUNDING_SCALE);
                *running_cost -= consumed;
                consumed
            }
        };

        state.total_sold += tx.quantity;
        state.realized_gain += proceeds - consumed_basis;
        Ok(())
    }

    /// Consumes `quantity` from the open lots, front-first for FIFO or
    /// back-first for LIFO, shrinking a lot partially when it exceeds the
    /// remainder. Returns the cost basis of everything consumed.
    fn consume_lots(
        lots: &mut std::collections::VecDeque<Lot>,
        quantity: Decimal,
        newest_first: bool,
    ) -> Decimal {
        let mut remaining = quantity;
        let mut consumed_basis = Decimal::ZERO;

        while remaining > Decimal::ZERO {
            let lot = if newest_first { lots.back_mut() } else { lots.front_mut() };
            let Some(lot) = lot else {
                // Caller checked availability; an empty queue here means the
                // lots and the running totals disagree.
                warn!(
                    "Lot queue exhausted with {} still to consume - availability check out of sync",
                    remaining
                );
                break;
            };

            if lot.quantity <= remaining {
                remaining -= lot.quantity;
                consumed_basis += lot.cost_basis;
                if newest_first {
                    lots.pop_back();
                } else {
                    lots.pop_front();
                }
            } else {
                let fraction_basis = (lot.cost_basis * remaining / lot.quantity).round_dp(ROUNDING_SCALE);
                lot.quantity -= remaining;
                lot.cost_basis -= fraction_basis;
                consumed_basis += fraction_basis;
                remaining = Decimal::ZERO;
            }
        }

        consumed_basis
    }

    fn finalize(state: &mut LedgerState, running_cost: Decimal) {
        state.quantity = state.total_bought - state.total_sold;
        state.cost_basis = match state.method {
            CostBasisMethod::AverageCost => running_cost.round_dp(ROUNDING_SCALE),
            _ => state
                .open_lots
                .iter()
                .map(|lot| lot.cost_basis)
                .sum::<Decimal>()
                .round_dp(ROUNDING_SCALE),
        };
        state.average_cost = Ratio::over_positive(state.cost_basis, state.quantity)
            .or_zero()
            .round_dp(ROUNDING_SCALE);
    }
}
