// In crates/accounting/src/aggregator.rs

use chrono::{DateTime, Utc};
use core_types::{Direction, Fill, Position, PositionStatus};
use rust_decimal::Decimal;

use crate::{Error, Result};

/// Collapses an ordered list of fills for one instrument into a single
/// canonical `Position`.
///
/// The caller supplies fills in chronological order; this function uses
/// slice order as ground truth and never re-sorts. When `declared` is
/// provided it is authoritative for the position's direction; otherwise the
/// first fill's side defines it, matching how a trader naturally logs
/// "I bought, then sold pieces of it."
///
/// This is a pure function: aggregating the same fills twice yields the
/// same `Position`.
pub fn aggregate(fills: &[Fill], declared: Option<Direction>) -> Result<Position> {
    let first = fills.first().ok_or_else(|| Error::InvalidInput {
        reason: "cannot aggregate an empty fill list".to_string(),
    })?;

    let symbol = first.symbol.clone();
    if let Some(stray) = fills.iter().find(|f| f.symbol != symbol) {
        return Err(Error::InvalidInput {
            reason: format!(
                "fill list spans more than one symbol: {} and {}",
                symbol, stray.symbol
            ),
        });
    }

    let direction = declared.unwrap_or_else(|| first.action.direction());
    let entry_action = direction.entry_action();

    // --- 1. Partition and Sum ---
    // A single pass over the fills, in record order. The last exit row seen
    // is the position's close time.
    let mut total_main_quantity = Decimal::ZERO;
    let mut main_notional = Decimal::ZERO;
    let mut total_exit_quantity = Decimal::ZERO;
    let mut exit_notional = Decimal::ZERO;
    let mut total_fees = Decimal::ZERO;
    let mut exit_time: Option<DateTime<Utc>> = None;

    for fill in fills {
        total_fees += fill.fee;
        if fill.action == entry_action {
            total_main_quantity += fill.quantity;
            main_notional += fill.quantity * fill.price;
        } else {
            total_exit_quantity += fill.quantity;
            exit_notional += fill.quantity * fill.price;
            exit_time = Some(fill.timestamp);
        }
    }

    if total_main_quantity.is_zero() {
        return Err(Error::InvalidInput {
            reason: format!(
                "position has no main-leg quantity: no {} fill with positive quantity",
                direction
            ),
        });
    }

    // --- 2. Weighted Average Prices ---
    let weighted_entry_price = main_notional / total_main_quantity;
    let weighted_exit_price = if total_exit_quantity > Decimal::ZERO {
        Some(exit_notional / total_exit_quantity)
    } else {
        None
    };

    // --- 3. Remaining Quantity & Status ---
    // Exits beyond the main leg are a caller-validation violation; clamp
    // instead of going negative.
    let remaining_quantity = (total_main_quantity - total_exit_quantity).max(Decimal::ZERO);

    let status = if total_exit_quantity.is_zero() {
        PositionStatus::Open
    } else if total_exit_quantity >= total_main_quantity {
        PositionStatus::Closed
    } else {
        PositionStatus::PartiallyClosed
    };

    tracing::debug!(
        symbol = %symbol,
        direction = %direction,
        ?status,
        fills = fills.len(),
        "Aggregated fills into position."
    );

    Ok(Position {
        symbol,
        direction,
        total_main_quantity,
        weighted_entry_price,
        total_exit_quantity,
        weighted_exit_price,
        remaining_quantity,
        status,
        entry_time: first.timestamp,
        exit_time,
        total_fees,
    })
}
