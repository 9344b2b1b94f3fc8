// In crates/core-types/src/types.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A trading instrument identifier (e.g., "AAPL", "BTCUSDT").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The side of a single executed fill, as the trader recorded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillAction {
    Buy,
    Sell,
}

impl FillAction {
    /// The position direction a fill of this action opens.
    pub fn direction(self) -> Direction {
        match self {
            FillAction::Buy => Direction::Long,
            FillAction::Sell => Direction::Short,
        }
    }
}

/// The direction of a position's main leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }

    /// The fill action that adds to a position of this direction.
    pub fn entry_action(self) -> FillAction {
        match self {
            Direction::Long => FillAction::Buy,
            Direction::Short => FillAction::Sell,
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(Direction::Long),
            "short" => Ok(Direction::Short),
            other => Err(Error::UnknownDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// The lifecycle state of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    Open,
    PartiallyClosed,
    Closed,
}

/// One executed order leg. Fills are immutable once recorded; they are the
/// append-only input that positions are derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub symbol: Symbol,
    pub action: FillAction,
    pub timestamp: DateTime<Utc>,
    /// Executed quantity (always positive; the side lives in `action`).
    pub quantity: Decimal,
    /// Execution price.
    pub price: Decimal,
    /// Fee paid on this fill. Optional upstream, zero when absent.
    #[serde(default)]
    pub fee: Decimal,
}

/// A position derived from its fills. Never mutated in place; any edit to
/// the underlying fills requires re-aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub direction: Direction,
    /// Total quantity on the side that opened the position.
    pub total_main_quantity: Decimal,
    /// Quantity-weighted mean price of the main-leg fills.
    pub weighted_entry_price: Decimal,
    /// Total quantity on the opposite side.
    pub total_exit_quantity: Decimal,
    /// Quantity-weighted mean price of the exit fills, if any were recorded.
    pub weighted_exit_price: Option<Decimal>,
    /// Main quantity still open, floored at zero.
    pub remaining_quantity: Decimal,
    pub status: PositionStatus,
    pub entry_time: DateTime<Utc>,
    /// Timestamp of the last exit fill in record order, if any.
    pub exit_time: Option<DateTime<Utc>>,
    pub total_fees: Decimal,
}

impl Position {
    pub fn is_closed(&self) -> bool {
        self.status == PositionStatus::Closed
    }

    pub fn has_exits(&self) -> bool {
        self.weighted_exit_price.is_some()
    }
}
