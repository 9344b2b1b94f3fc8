// In crates/analytics/src/lib.rs

pub mod engine;
pub mod types;

// Re-export the most important types for easy access.
pub use engine::AnalyticsEngine;
pub use types::{
    AnalyticsSettings, PortfolioMetrics, PositionMetrics, ScoreWeights, TradeOutcome,
};
