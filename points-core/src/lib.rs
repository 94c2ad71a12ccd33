//! Points Manager Core
//!
//! Loyalty-points ledger for a single account credited by many partners
//! ("payers").
//!
//! # Architecture
//!
//! - **Raw history**: append-only record of every credit and spend
//! - **Clean ledger**: derived view in which each spend has been absorbed,
//!   oldest credit first, by that same payer's earlier credits
//! - **Redemption**: spends the clean ledger oldest-first across all payers
//! - **Single writer**: one actor task owns the account

#![forbid(unsafe_code)]
//!
//! # Invariants
//!
//! - The clean ledger is always rebuilt from raw history, never patched
//! - No payer's running balance is ever negative in the clean ledger
//! - A failed redemption leaves the raw history untouched

#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod types;
pub mod balance;
pub mod ledger;
pub mod redemption;
pub mod account;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Overdraft, Result};
pub use types::{Payer, PayerAmounts, Transaction};
pub use ledger::{normalize, CleanLedger};
pub use redemption::{plan, RedemptionPlan};
pub use balance::balances;
pub use account::Account;
pub use actor::{spawn_account_actor, AccountHandle};
pub use config::Config;
pub use metrics::Metrics;
