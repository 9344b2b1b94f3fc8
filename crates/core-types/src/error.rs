// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown direction '{0}', expected 'long' or 'short'")]
    UnknownDirection(String),
}

pub type Result<T> = std::result::Result<T, Error>;
