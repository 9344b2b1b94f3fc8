// In app/src/main.rs

use accounting::aggregate;
use analytics::engine::AnalyticsEngine;
use analytics::types::{PortfolioMetrics, PositionMetrics, TradeOutcome};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_types::{Direction, Fill, Position};
use journal_config::Settings;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "A trading-journal position accounting and analytics tool."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregates a fill log into a single position and prints its metrics.
    Position {
        /// Path to a JSON array of fills for one instrument, in
        /// chronological order.
        #[arg(short, long)]
        fills: PathBuf,

        /// Declared position direction ("long" or "short"). Inferred from
        /// the first fill when omitted.
        #[arg(long)]
        direction: Option<String>,

        /// Stop-loss price, used for trade risk and reward-to-risk.
        #[arg(long)]
        stop_loss: Option<Decimal>,

        /// Contract multiplier override for this position.
        #[arg(long)]
        multiplier: Option<Decimal>,
    },

    /// Computes portfolio metrics over a JSON array of trade outcomes.
    Report {
        /// Path to a JSON array of trade outcomes (net P&L, realized R,
        /// sequence date).
        #[arg(short, long)]
        trades: PathBuf,

        /// Follower count, fed into the leaderboard score.
        #[arg(long, default_value_t = 0)]
        followers: u64,
    },
}

// --- Main Application Entry Point ---

fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let settings = journal_config::load_settings()?;

    let level = settings
        .app
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Position {
            fills,
            direction,
            stop_loss,
            multiplier,
        } => {
            handle_position(&settings, &fills, direction, stop_loss, multiplier)?;
        }
        Commands::Report { trades, followers } => {
            handle_report(&settings, &trades, followers)?;
        }
    }

    Ok(())
}

// --- "Position" Subcommand Logic ---

fn handle_position(
    settings: &Settings,
    path: &PathBuf,
    direction: Option<String>,
    stop_loss: Option<Decimal>,
    multiplier: Option<Decimal>,
) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fills file {}", path.display()))?;
    let fills: Vec<Fill> =
        serde_json::from_str(&raw).context("failed to parse fills JSON")?;
    tracing::info!(fills = fills.len(), "Loaded fill log.");

    let declared = direction
        .as_deref()
        .map(Direction::from_str)
        .transpose()?;

    let position = aggregate(&fills, declared)?;
    let engine = AnalyticsEngine::with_settings(settings.analytics.clone());
    let metrics = engine.position_metrics(&position, stop_loss, multiplier);

    print_position(&position, &metrics);
    Ok(())
}

// --- "Report" Subcommand Logic ---

fn handle_report(settings: &Settings, path: &PathBuf, followers: u64) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trades file {}", path.display()))?;
    let outcomes: Vec<TradeOutcome> =
        serde_json::from_str(&raw).context("failed to parse trades JSON")?;
    tracing::info!(trades = outcomes.len(), "Loaded trade outcomes.");

    let engine = AnalyticsEngine::with_settings(settings.analytics.clone());
    let metrics = engine.portfolio_metrics(&outcomes);
    let score = engine.leaderboard_score(&metrics, followers);

    print_report(&metrics, score);
    Ok(())
}

/// Helper function to print an aggregated position and its metrics.
fn print_position(position: &Position, metrics: &PositionMetrics) {
    println!("\n--- Position ---");
    println!("-----------------------------------");
    println!("Symbol:                {}", position.symbol);
    println!("Direction:             {}", position.direction);
    println!("Status:                {:?}", position.status);
    println!("Main Quantity:         {}", position.total_main_quantity);
    println!("Weighted Entry:        {:.4}", position.weighted_entry_price);
    match position.weighted_exit_price {
        Some(exit) => println!("Weighted Exit:         {:.4}", exit),
        None => println!("Weighted Exit:         (no exits)"),
    }
    println!("Remaining Quantity:    {}", position.remaining_quantity);
    println!("Total Fees:            {:.2}", position.total_fees);
    println!("-----------------------------------");
    println!("Gross P&L:             ${:.2}", metrics.gross_pnl);
    println!("Net P&L:               ${:.2}", metrics.net_pnl);
    println!("Percent Gain:          {:.2}%", metrics.percent_gain);
    println!("Trade Risk:            ${:.2}", metrics.trade_risk);
    println!("Realized R:            {:.2}", metrics.realized_reward_to_risk);
    println!("-----------------------------------");
}

/// Helper function to print the portfolio report in a readable format.
fn print_report(metrics: &PortfolioMetrics, score: f64) {
    println!("\n--- Portfolio Performance Report ---");
    println!("-----------------------------------");
    println!("Total Trades:          {}", metrics.total_trades);
    println!("Net P&L:               ${:.2}", metrics.net_pnl);
    println!("Win Rate:              {:.2}%", metrics.win_rate);
    println!("Profit Factor:         {:.2}", metrics.profit_factor);
    println!("Avg Winner:            ${:.2}", metrics.avg_winner);
    println!("Avg Loser:             ${:.2}", metrics.avg_loser);
    println!("Largest Profit:        ${:.2}", metrics.largest_profit);
    println!("Largest Loss:          ${:.2}", metrics.largest_loss.abs());
    println!("-----------------------------------");
    println!("Max Drawdown:          ${:.2}", metrics.max_drawdown);
    println!("Sharpe Ratio:          {:.3}", metrics.sharpe_ratio);
    println!("Expectancy:            ${:.2}", metrics.expectancy);
    println!("Total R:               {:.2}", metrics.total_reward_to_risk);
    println!("-----------------------------------");
    println!("Leaderboard Score:     {:.2}", score);
    println!("-----------------------------------");
}
