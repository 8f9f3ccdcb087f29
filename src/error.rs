//! Errors at the storage edge
//!
//! The simulation itself never fails; only reading and writing files can.

use thiserror::Error;

/// Failure to read or write a JSON file
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Upgrade purchase refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    #[error("upgrade costs {cost} but only {available} is available")]
    InsufficientScore { cost: u64, available: u64 },
}
