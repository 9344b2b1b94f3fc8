use crate::types::{AnalyticsSettings, PortfolioMetrics, PositionMetrics, TradeOutcome};
use core_types::{Direction, Position};
use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Profit factor is capped harder inside the leaderboard blend so the
/// all-win sentinel cannot dominate the ranking.
const SCORE_PROFIT_FACTOR_CAP: f64 = 5.0;

/// The engine responsible for turning aggregated positions into performance
/// metrics.
///
/// The engine is stateless and pure: every call is a transform of its
/// arguments, safe to re-run and to parallelize across positions or users.
#[derive(Debug, Default)]
pub struct AnalyticsEngine {
    settings: AnalyticsSettings,
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: AnalyticsSettings) -> Self {
        Self { settings }
    }

    /// Calculates the per-position metrics for a single aggregated position.
    ///
    /// Never fails: a position without an exit price or a stop-loss is a
    /// normal journal state, so undefined ratios degrade to zero instead of
    /// erroring. `contract_multiplier` falls back to the configured default
    /// when not supplied.
    pub fn position_metrics(
        &self,
        position: &Position,
        stop_loss: Option<Decimal>,
        contract_multiplier: Option<Decimal>,
    ) -> PositionMetrics {
        let multiplier = contract_multiplier.unwrap_or(self.settings.contract_multiplier);
        let entry = position.weighted_entry_price;

        // --- 1. Gross P&L and Percent Gain ---
        // The full main quantity is valued at the weighted exit price, so a
        // partial close is priced as if the whole book had exited there.
        let (gross_pnl, percent_gain) = match position.weighted_exit_price {
            Some(exit) => {
                let price_diff = match position.direction {
                    Direction::Long => exit - entry,
                    Direction::Short => entry - exit,
                };
                let gross = price_diff * position.total_main_quantity * multiplier;
                let percent = if entry > Decimal::ZERO {
                    (price_diff / entry * dec!(100)).to_f64().unwrap_or(0.0)
                } else {
                    0.0
                };
                (gross, percent)
            }
            None => (Decimal::ZERO, 0.0),
        };

        // --- 2. Net P&L ---
        // Fees are a cost regardless of the sign they were recorded with.
        let net_pnl = gross_pnl - position.total_fees.abs();

        // --- 3. Trade Risk ---
        let trade_risk = match stop_loss {
            Some(stop) => (entry - stop).abs() * position.total_main_quantity * multiplier,
            None => Decimal::ZERO,
        };

        // --- 4. Realized Reward-to-Risk ---
        // Defined only when both the exit price and the stop-loss exist and
        // the stop sits on the losing side of the entry.
        let realized_reward_to_risk = match (position.weighted_exit_price, stop_loss) {
            (Some(exit), Some(stop)) => {
                let risk = match position.direction {
                    Direction::Long => entry - stop,
                    Direction::Short => stop - entry,
                };
                if risk > Decimal::ZERO {
                    let gain = match position.direction {
                        Direction::Long => exit - entry,
                        Direction::Short => entry - exit,
                    };
                    (gain / risk).abs().to_f64().unwrap_or(0.0)
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        PositionMetrics {
            gross_pnl,
            net_pnl,
            percent_gain,
            trade_risk,
            realized_reward_to_risk,
        }
    }

    /// Calculates the full dashboard metrics over a set of trade outcomes.
    ///
    /// Drawdown and Sharpe depend on order, so the engine sorts a working
    /// copy by `sequence_date` (stable sort, ties keep input order) before
    /// walking the equity curve. Everything else is order-insensitive.
    /// Runs on arbitrary historical data, including "no trades yet".
    pub fn portfolio_metrics(&self, outcomes: &[TradeOutcome]) -> PortfolioMetrics {
        let mut metrics = PortfolioMetrics::new();
        if outcomes.is_empty() {
            return metrics;
        }

        let mut ordered: Vec<&TradeOutcome> = outcomes.iter().collect();
        ordered.sort_by_key(|o| o.sequence_date);

        metrics.total_trades = ordered.len() as u32;
        metrics.net_pnl = ordered.iter().map(|o| o.net_pnl).sum();

        // --- 1. Winners / Losers Partition ---
        // Zero-P&L trades count toward the total but neither bucket.
        let winners: Vec<Decimal> = ordered
            .iter()
            .filter(|o| o.net_pnl > Decimal::ZERO)
            .map(|o| o.net_pnl)
            .collect();
        let losers: Vec<Decimal> = ordered
            .iter()
            .filter(|o| o.net_pnl < Decimal::ZERO)
            .map(|o| o.net_pnl)
            .collect();

        metrics.win_rate = (winners.len() as f64 / metrics.total_trades as f64) * 100.0;

        // --- 2. Profit Factor ---
        let gross_profit: Decimal = winners.iter().sum();
        let gross_loss: Decimal = losers.iter().sum::<Decimal>().abs();
        metrics.profit_factor = if gross_loss > Decimal::ZERO {
            (gross_profit / gross_loss)
                .to_f64()
                .unwrap_or(0.0)
                .min(self.settings.profit_factor_cap)
        } else if gross_profit > Decimal::ZERO {
            // All wins, no losses: report the documented sentinel, never a
            // raw Infinity that could leak into serialization.
            self.settings.profit_factor_cap
        } else {
            0.0
        };

        // --- 3. Averages and Extremes ---
        if !winners.is_empty() {
            metrics.avg_winner = gross_profit / Decimal::from(winners.len());
            metrics.largest_profit = winners.iter().max().copied().unwrap_or(Decimal::ZERO);
        }
        if !losers.is_empty() {
            metrics.avg_loser = gross_loss / Decimal::from(losers.len());
            metrics.largest_loss = losers.iter().min().copied().unwrap_or(Decimal::ZERO);
        }

        // --- 4. Reward-to-Risk ---
        metrics.total_reward_to_risk = summed_reward_to_risk(&ordered);

        // --- 5. Max Drawdown ---
        // Running equity curve from zero; the largest peak-minus-cumulative
        // gap observed is the drawdown.
        let mut cumulative = Decimal::ZERO;
        let mut peak = Decimal::ZERO;
        let mut max_drawdown = Decimal::ZERO;
        for outcome in &ordered {
            cumulative += outcome.net_pnl;
            peak = peak.max(cumulative);
            max_drawdown = max_drawdown.max(peak - cumulative);
        }
        metrics.max_drawdown = max_drawdown;

        // --- 6. Sharpe Ratio (simplified, per-trade) ---
        if ordered.len() > 1 {
            let pnls: Vec<f64> = ordered
                .iter()
                .map(|o| o.net_pnl.to_f64().unwrap_or(0.0))
                .collect();
            let mean = pnls.iter().sum::<f64>() / pnls.len() as f64;
            // Sample standard deviation (n - 1).
            let variance = pnls.iter().map(|p| (*p - mean).powi(2)).sum::<f64>()
                / (pnls.len() - 1) as f64;
            let std_dev = variance.sqrt();
            if std_dev > 0.0 {
                metrics.sharpe_ratio = mean / std_dev;
            }
        }

        // --- 7. Expectancy ---
        let total = Decimal::from(metrics.total_trades);
        let win_probability = Decimal::from(winners.len()) / total;
        let loss_probability = Decimal::from(losers.len()) / total;
        metrics.expectancy =
            win_probability * metrics.avg_winner - loss_probability * metrics.avg_loser;

        tracing::debug!(
            total_trades = metrics.total_trades,
            win_rate = metrics.win_rate,
            profit_factor = metrics.profit_factor,
            "Calculated portfolio metrics."
        );

        metrics
    }

    /// The composite leaderboard score used for cross-user ranking.
    /// Higher scores are better.
    ///
    /// A weighted linear blend of win rate, capped profit factor, net P&L,
    /// and follower count; the weights come from configuration.
    pub fn leaderboard_score(&self, metrics: &PortfolioMetrics, followers: u64) -> f64 {
        let weights = &self.settings.score_weights;
        let capped_profit_factor = metrics.profit_factor.min(SCORE_PROFIT_FACTOR_CAP);

        (metrics.win_rate * weights.win_rate)
            + (capped_profit_factor * weights.profit_factor)
            + (metrics.net_pnl.to_f64().unwrap_or(0.0) * weights.net_pnl)
            + (followers as f64 * weights.followers)
    }
}

/// Portfolio-level reward-to-risk is a raw sum of the realized R multiples,
/// not an average.
fn summed_reward_to_risk(outcomes: &[&TradeOutcome]) -> f64 {
    outcomes.iter().map(|o| o.realized_reward_to_risk).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use core_types::{PositionStatus, Symbol};
    use proptest::prelude::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn outcome(net_pnl: Decimal, d: u32) -> TradeOutcome {
        TradeOutcome {
            net_pnl,
            realized_reward_to_risk: 0.0,
            sequence_date: day(d),
        }
    }

    fn closed_position(
        direction: Direction,
        entry: Decimal,
        exit: Option<Decimal>,
        quantity: Decimal,
        fees: Decimal,
    ) -> Position {
        Position {
            symbol: Symbol("AAPL".to_string()),
            direction,
            total_main_quantity: quantity,
            weighted_entry_price: entry,
            total_exit_quantity: if exit.is_some() { quantity } else { Decimal::ZERO },
            weighted_exit_price: exit,
            remaining_quantity: if exit.is_some() { Decimal::ZERO } else { quantity },
            status: if exit.is_some() {
                PositionStatus::Closed
            } else {
                PositionStatus::Open
            },
            entry_time: day(1),
            exit_time: exit.map(|_| day(2)),
            total_fees: fees,
        }
    }

    #[test]
    fn long_winner_with_fees() {
        let engine = AnalyticsEngine::new();
        let position = closed_position(
            Direction::Long,
            dec!(100),
            Some(dec!(110)),
            dec!(10),
            dec!(5),
        );
        let metrics = engine.position_metrics(&position, None, None);

        assert_eq!(metrics.gross_pnl, dec!(100));
        assert_eq!(metrics.net_pnl, dec!(95));
        assert!((metrics.percent_gain - 10.0).abs() < 1e-9);
        assert_eq!(metrics.trade_risk, dec!(0));
        assert_eq!(metrics.realized_reward_to_risk, 0.0);
    }

    #[test]
    fn short_profits_when_price_falls() {
        let engine = AnalyticsEngine::new();
        let position =
            closed_position(Direction::Short, dec!(50), Some(dec!(45)), dec!(4), dec!(0));
        let metrics = engine.position_metrics(&position, None, None);

        assert_eq!(metrics.gross_pnl, dec!(20));
        assert!((metrics.percent_gain - 10.0).abs() < 1e-9);
    }

    #[test]
    fn open_position_has_zero_pnl_but_keeps_risk() {
        let engine = AnalyticsEngine::new();
        let position = closed_position(Direction::Long, dec!(100), None, dec!(10), dec!(2));
        let metrics = engine.position_metrics(&position, Some(dec!(95)), None);

        assert_eq!(metrics.gross_pnl, dec!(0));
        // Fees still apply even before any exit.
        assert_eq!(metrics.net_pnl, dec!(-2));
        assert_eq!(metrics.percent_gain, 0.0);
        assert_eq!(metrics.trade_risk, dec!(50));
        assert_eq!(metrics.realized_reward_to_risk, 0.0);
    }

    #[test]
    fn realized_reward_to_risk_uses_stop_distance() {
        let engine = AnalyticsEngine::new();
        let position = closed_position(
            Direction::Long,
            dec!(100),
            Some(dec!(120)),
            dec!(10),
            dec!(0),
        );
        // Risk 10 per unit, gain 20 per unit.
        let metrics = engine.position_metrics(&position, Some(dec!(90)), None);
        assert!((metrics.realized_reward_to_risk - 2.0).abs() < 1e-9);
    }

    #[test]
    fn stop_on_the_wrong_side_yields_zero_reward_to_risk() {
        let engine = AnalyticsEngine::new();
        let position = closed_position(
            Direction::Long,
            dec!(100),
            Some(dec!(120)),
            dec!(10),
            dec!(0),
        );
        // Stop above a long entry: directional risk is not positive.
        let metrics = engine.position_metrics(&position, Some(dec!(105)), None);
        assert_eq!(metrics.realized_reward_to_risk, 0.0);
    }

    #[test]
    fn negative_recorded_fees_still_reduce_net_pnl() {
        let engine = AnalyticsEngine::new();
        let position = closed_position(
            Direction::Long,
            dec!(100),
            Some(dec!(110)),
            dec!(10),
            dec!(-5),
        );
        let metrics = engine.position_metrics(&position, None, None);
        assert_eq!(metrics.net_pnl, dec!(95));
    }

    #[test]
    fn partial_close_values_full_main_quantity() {
        let engine = AnalyticsEngine::new();
        let position = Position {
            symbol: Symbol("AAPL".to_string()),
            direction: Direction::Long,
            total_main_quantity: dec!(10),
            weighted_entry_price: dec!(100),
            total_exit_quantity: dec!(4),
            weighted_exit_price: Some(dec!(110)),
            remaining_quantity: dec!(6),
            status: PositionStatus::PartiallyClosed,
            entry_time: day(1),
            exit_time: Some(day(2)),
            total_fees: Decimal::ZERO,
        };
        let metrics = engine.position_metrics(&position, None, None);
        // 10 units priced at the exit, not the 4 that actually left.
        assert_eq!(metrics.gross_pnl, dec!(100));
    }

    #[test]
    fn contract_multiplier_scales_pnl_and_risk() {
        let engine = AnalyticsEngine::new();
        let position =
            closed_position(Direction::Long, dec!(100), Some(dec!(102)), dec!(2), dec!(0));
        let metrics = engine.position_metrics(&position, Some(dec!(99)), Some(dec!(50)));

        assert_eq!(metrics.gross_pnl, dec!(200));
        assert_eq!(metrics.trade_risk, dec!(100));
    }

    #[test]
    fn empty_portfolio_is_all_zeros() {
        let engine = AnalyticsEngine::new();
        let metrics = engine.portfolio_metrics(&[]);
        assert_eq!(metrics, PortfolioMetrics::new());
    }

    #[test]
    fn win_rate_profit_factor_and_expectancy() {
        // 6 winners of +50, 4 losers of -30.
        let engine = AnalyticsEngine::new();
        let mut outcomes = Vec::new();
        for d in 1..=6 {
            outcomes.push(outcome(dec!(50), d));
        }
        for d in 7..=10 {
            outcomes.push(outcome(dec!(-30), d));
        }
        let metrics = engine.portfolio_metrics(&outcomes);

        assert_eq!(metrics.total_trades, 10);
        assert!((metrics.win_rate - 60.0).abs() < 1e-9);
        assert!((metrics.profit_factor - 2.5).abs() < 1e-9);
        assert_eq!(metrics.avg_winner, dec!(50));
        assert_eq!(metrics.avg_loser, dec!(30));
        assert_eq!(metrics.largest_profit, dec!(50));
        assert_eq!(metrics.largest_loss, dec!(-30));
        // 0.6 * 50 - 0.4 * 30 = 18
        assert_eq!(metrics.expectancy, dec!(18));
        assert_eq!(metrics.net_pnl, dec!(180));
    }

    #[test]
    fn all_win_profit_factor_hits_the_sentinel() {
        let engine = AnalyticsEngine::new();
        let outcomes = vec![outcome(dec!(60), 1), outcome(dec!(40), 2)];
        let metrics = engine.portfolio_metrics(&outcomes);

        assert_eq!(metrics.profit_factor, 999.0);
        assert!(metrics.profit_factor.is_finite());
    }

    #[test]
    fn all_flat_profit_factor_is_zero() {
        let engine = AnalyticsEngine::new();
        let outcomes = vec![outcome(dec!(0), 1), outcome(dec!(0), 2)];
        let metrics = engine.portfolio_metrics(&outcomes);

        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.expectancy, dec!(0));
    }

    #[test]
    fn drawdown_tracks_peak_to_trough() {
        // Equity [100, 150, 70, 90], peak [100, 150, 150, 150].
        let engine = AnalyticsEngine::new();
        let outcomes = vec![
            outcome(dec!(100), 1),
            outcome(dec!(50), 2),
            outcome(dec!(-80), 3),
            outcome(dec!(20), 4),
        ];
        let metrics = engine.portfolio_metrics(&outcomes);
        assert_eq!(metrics.max_drawdown, dec!(80));
    }

    #[test]
    fn opening_loss_counts_as_drawdown() {
        let engine = AnalyticsEngine::new();
        let outcomes = vec![outcome(dec!(-50), 1), outcome(dec!(30), 2)];
        let metrics = engine.portfolio_metrics(&outcomes);
        assert_eq!(metrics.max_drawdown, dec!(50));
    }

    #[test]
    fn drawdown_is_independent_of_input_order() {
        let engine = AnalyticsEngine::new();
        let chronological = vec![
            outcome(dec!(100), 1),
            outcome(dec!(50), 2),
            outcome(dec!(-80), 3),
            outcome(dec!(20), 4),
        ];
        let mut shuffled = chronological.clone();
        shuffled.swap(0, 3);
        shuffled.swap(1, 2);

        assert_eq!(
            engine.portfolio_metrics(&chronological),
            engine.portfolio_metrics(&shuffled)
        );
    }

    #[test]
    fn sharpe_from_known_sample() {
        // [10, 20, 30]: mean 20, sample std dev 10.
        let engine = AnalyticsEngine::new();
        let outcomes = vec![
            outcome(dec!(10), 1),
            outcome(dec!(20), 2),
            outcome(dec!(30), 3),
        ];
        let metrics = engine.portfolio_metrics(&outcomes);
        assert!((metrics.sharpe_ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sharpe_needs_at_least_two_trades_and_spread() {
        let engine = AnalyticsEngine::new();

        let single = vec![outcome(dec!(10), 1)];
        assert_eq!(engine.portfolio_metrics(&single).sharpe_ratio, 0.0);

        let flat = vec![outcome(dec!(10), 1), outcome(dec!(10), 2)];
        assert_eq!(engine.portfolio_metrics(&flat).sharpe_ratio, 0.0);
    }

    #[test]
    fn reward_to_risk_is_summed_not_averaged() {
        let engine = AnalyticsEngine::new();
        let outcomes = vec![
            TradeOutcome {
                net_pnl: dec!(10),
                realized_reward_to_risk: 2.0,
                sequence_date: day(1),
            },
            TradeOutcome {
                net_pnl: dec!(5),
                realized_reward_to_risk: 1.5,
                sequence_date: day(2),
            },
        ];
        let metrics = engine.portfolio_metrics(&outcomes);
        assert!((metrics.total_reward_to_risk - 3.5).abs() < 1e-9);
    }

    #[test]
    fn leaderboard_score_matches_the_documented_blend() {
        let engine = AnalyticsEngine::new();
        let metrics = PortfolioMetrics {
            win_rate: 60.0,
            profit_factor: 2.5,
            net_pnl: dec!(240),
            ..PortfolioMetrics::new()
        };
        // 60 * 0.3 + 2.5 * 10 + 240 * 0.001 + 100 * 0.1
        let score = engine.leaderboard_score(&metrics, 100);
        assert!((score - 53.24).abs() < 1e-9);
    }

    #[test]
    fn leaderboard_score_caps_the_sentinel_profit_factor() {
        let engine = AnalyticsEngine::new();
        let metrics = PortfolioMetrics {
            profit_factor: 999.0,
            ..PortfolioMetrics::new()
        };
        let score = engine.leaderboard_score(&metrics, 0);
        assert!((score - SCORE_PROFIT_FACTOR_CAP * 10.0).abs() < 1e-9);
    }

    proptest! {
        // Sentinel policy: no input set may produce an Infinity or NaN that
        // could reach a serialization boundary.
        #[test]
        fn metrics_stay_finite_on_arbitrary_outcomes(
            pnls in proptest::collection::vec(-100_000i64..100_000, 0..32)
        ) {
            let engine = AnalyticsEngine::new();
            let outcomes: Vec<TradeOutcome> = pnls
                .iter()
                .enumerate()
                .map(|(i, p)| TradeOutcome {
                    net_pnl: Decimal::from(*p),
                    realized_reward_to_risk: 0.0,
                    sequence_date: day((i % 27 + 1) as u32),
                })
                .collect();
            let metrics = engine.portfolio_metrics(&outcomes);

            prop_assert!(metrics.win_rate.is_finite());
            prop_assert!(metrics.profit_factor.is_finite());
            prop_assert!(metrics.sharpe_ratio.is_finite());
            prop_assert!(metrics.total_reward_to_risk.is_finite());
            prop_assert!(metrics.max_drawdown >= Decimal::ZERO);
        }
    }
}
