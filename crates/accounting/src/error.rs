// In crates/accounting/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A caller bug: the fill set should have been validated before it
    /// reached this layer.
    #[error("Invalid fill input: {reason}")]
    InvalidInput { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
