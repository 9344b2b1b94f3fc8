// In crates/accounting/src/lib.rs

pub mod aggregator;
pub mod error;

// Re-export the most important items for easy access.
pub use aggregator::aggregate;
pub use error::{Error, Result};
