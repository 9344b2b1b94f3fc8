// In crates/analytics/src/types.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Performance figures derived from a single aggregated position.
///
/// Money values stay `Decimal`; ratios and percentages that only exist for
/// display are `f64`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionMetrics {
    /// Price difference over the full main quantity, before fees. Zero when
    /// no exit has been recorded.
    pub gross_pnl: Decimal,
    /// `gross_pnl` minus the fee total (fees always treated as a cost).
    pub net_pnl: Decimal,
    /// Percent move from entry to weighted exit, signed by outcome.
    pub percent_gain: f64,
    /// Entry-to-stop distance times quantity; zero without a stop-loss.
    pub trade_risk: Decimal,
    /// Realized gain over pre-defined risk. Zero unless both an exit price
    /// and a stop-loss exist and the directional risk is positive.
    pub realized_reward_to_risk: f64,
}

/// One position's realized result as seen by the portfolio calculations:
/// the net P&L plus the date used to sequence the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub net_pnl: Decimal,
    #[serde(default)]
    pub realized_reward_to_risk: f64,
    pub sequence_date: DateTime<Utc>,
}

/// Dashboard metrics aggregated over a set of trade outcomes.
///
/// Every field is well-defined on empty or degenerate input; "no trades
/// yet" is a normal state for a journal, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PortfolioMetrics {
    pub total_trades: u32,
    pub net_pnl: Decimal,
    pub win_rate: f64,
    /// Gross profit over gross loss magnitude. Capped at the configured
    /// sentinel when there are wins and no losses; never `Infinity`/`NaN`.
    pub profit_factor: f64,
    pub avg_winner: Decimal,
    /// Mean losing trade, reported as a non-negative magnitude.
    pub avg_loser: Decimal,
    pub largest_profit: Decimal,
    /// Worst losing trade, kept negative; display layers show the magnitude.
    pub largest_loss: Decimal,
    /// Sum (not mean) of realized R multiples across the set.
    pub total_reward_to_risk: f64,
    /// Largest peak-to-trough decline of the cumulative P&L curve.
    pub max_drawdown: Decimal,
    /// Per-trade Sharpe: mean over sample standard deviation of net P&L.
    pub sharpe_ratio: f64,
    /// Probability-weighted average outcome per trade.
    pub expectancy: Decimal,
}

impl PortfolioMetrics {
    /// Creates a new, all-zero metrics set.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Weights for the cross-user leaderboard blend. A tunable scoring formula,
/// not a statistically meaningful figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub win_rate: f64,
    pub profit_factor: f64,
    pub net_pnl: f64,
    pub followers: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            win_rate: 0.3,
            profit_factor: 10.0,
            net_pnl: 0.001,
            followers: 0.1,
        }
    }
}

/// Tunable knobs for the analytics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Multiplier applied to price moves (1 for stocks, contract size for
    /// futures). Used when the caller does not pass one per position.
    pub contract_multiplier: Decimal,
    /// The sentinel reported for an all-win, no-loss profit factor.
    pub profit_factor_cap: f64,
    pub score_weights: ScoreWeights,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            contract_multiplier: Decimal::ONE,
            profit_factor_cap: 999.0,
            score_weights: ScoreWeights::default(),
        }
    }
}
