//! Error types for the points ledger

use crate::types::Payer;
use std::fmt;
use thiserror::Error;

/// Result type for points ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Points ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Caller asked to redeem a negative amount
    #[error("Invalid redemption request: cannot redeem {0} points")]
    InvalidRedemptionRequest(i64),

    /// A payer (or the account as a whole) would be overdrawn
    #[error("Negative balance: {0}")]
    NegativeBalance(Overdraft),

    /// Point arithmetic left the `i64` range
    #[error("Points overflow: {0}")]
    Overflow(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True for caller-visible business rejections
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidRedemptionRequest(_) | Error::NegativeBalance(_) | Error::Overflow(_)
        )
    }
}

/// Why a balance would go negative
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overdraft {
    /// The payer's first chronological entry is a debit
    NoPriorCredit {
        /// Offending payer
        payer: Payer,
        /// Magnitude of the debit
        points: i64,
    },

    /// A debit exceeds the payer's credit accumulated up to that point
    ExceedsCredit {
        /// Offending payer
        payer: Payer,
        /// Points the payer's credits could not absorb
        shortfall: i64,
    },

    /// A redemption exceeds the account's total redeemable balance
    InsufficientTotal {
        /// Points requested
        requested: i64,
        /// Points left unsatisfied after the ledger was exhausted
        shortfall: i64,
    },
}

impl fmt::Display for Overdraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overdraft::NoPriorCredit { payer, points } => write!(
                f,
                "payer '{}' spends {} points before any credit",
                payer, points
            ),
            Overdraft::ExceedsCredit { payer, shortfall } => write!(
                f,
                "payer '{}' is overdrawn by {} points",
                payer, shortfall
            ),
            Overdraft::InsufficientTotal {
                requested,
                shortfall,
            } => write!(
                f,
                "insufficient balance to redeem {} points ({} short)",
                requested, shortfall
            ),
        }
    }
}

impl From<Overdraft> for Error {
    fn from(overdraft: Overdraft) -> Self {
        Error::NegativeBalance(overdraft)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}
