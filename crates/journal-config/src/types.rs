// In crates/journal-config/src/types.rs

use analytics::types::AnalyticsSettings;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Tunable knobs for the analytics engine (contract multiplier,
    /// profit-factor sentinel, leaderboard score weights).
    #[serde(default)]
    pub analytics: AnalyticsSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    pub log_level: String,
}
