//! Ledger normalization
//!
//! Turns the raw, arbitrarily ordered history into a clean ledger in which
//! every spend has been absorbed by that payer's earlier credits.
//!
//! # Algorithm
//!
//! 1. Stable-sort a view of the history by timestamp (ties keep insertion order)
//! 2. Walk it once, keeping a FIFO queue of unspent credit slots per payer
//! 3. Each spend drains its payer's queue oldest-first
//! 4. Drop every slot left at zero
//!
//! # Example
//!
//! ```text
//! Raw (insertion order):
//!   DANNON        1000  11-02 14:00
//!   UNILEVER       200  10-31 11:00
//!   DANNON        -200  10-31 15:00
//!   MILLER COORS 10000  11-01 14:00
//!   DANNON         300  10-31 10:00
//!
//! Clean:
//!   DANNON         100  10-31 10:00   (300 - 200)
//!   UNILEVER       200  10-31 11:00
//!   MILLER COORS 10000  11-01 14:00
//!   DANNON        1000  11-02 14:00
//! ```
//!
//! Point values are tracked in a separate arena indexed by sorted position;
//! the raw transactions themselves are never touched.

use crate::{
    error::Overdraft,
    types::{Payer, Transaction},
    Error, Result,
};
use std::collections::{HashMap, VecDeque};

/// Validated, chronologically ordered, fully distributed ledger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanLedger {
    entries: Vec<Transaction>,
}

impl CleanLedger {
    /// Entries in timestamp order
    pub fn entries(&self) -> &[Transaction] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total redeemable points across all payers
    pub fn total(&self) -> i64 {
        self.entries.iter().map(|txn| txn.points).sum()
    }

    /// Redeemable points for one payer
    pub fn payer_total(&self, payer: &Payer) -> i64 {
        self.entries
            .iter()
            .filter(|txn| &txn.payer == payer)
            .map(|txn| txn.points)
            .sum()
    }

    /// Consume into entries
    pub fn into_vec(self) -> Vec<Transaction> {
        self.entries
    }
}

/// Build the clean ledger from raw history.
///
/// All-or-nothing: any overdraft aborts and no ledger is produced.
pub fn normalize(history: &[Transaction]) -> Result<CleanLedger> {
    let mut ordered: Vec<&Transaction> = history.iter().collect();
    ordered.sort_by_key(|txn| txn.timestamp);

    let mut points: Vec<i64> = ordered.iter().map(|txn| txn.points).collect();
    let mut credits: HashMap<&Payer, VecDeque<usize>> = HashMap::new();

    for (slot, txn) in ordered.iter().enumerate() {
        if txn.is_credit() {
            credits.entry(&txn.payer).or_default().push_back(slot);
            continue;
        }

        let spend = txn.points.checked_neg().ok_or_else(|| {
            Error::Overflow(format!("spend of {} points by '{}'", txn.points, txn.payer))
        })?;

        let Some(queue) = credits.get_mut(&txn.payer) else {
            return Err(Overdraft::NoPriorCredit {
                payer: txn.payer.clone(),
                points: spend,
            }
            .into());
        };

        let shortfall = distribute(&mut points, queue, spend);
        if shortfall > 0 {
            return Err(Overdraft::ExceedsCredit {
                payer: txn.payer.clone(),
                shortfall,
            }
            .into());
        }
        points[slot] = 0;
    }

    let entries: Vec<Transaction> = ordered
        .into_iter()
        .zip(points)
        .filter(|(_, remaining)| *remaining != 0)
        .map(|(txn, remaining)| txn.with_points(remaining))
        .collect();

    tracing::debug!(
        raw = history.len(),
        clean = entries.len(),
        payers = credits.len(),
        "Normalized ledger"
    );

    Ok(CleanLedger { entries })
}

/// Absorb `remaining` into the queued credits, oldest first.
///
/// Fully spent credits leave the queue. Returns what could not be absorbed.
/// `remaining` is positive and every queued credit is non-negative, so no
/// step here can leave the `i64` range.
fn distribute(points: &mut [i64], queue: &mut VecDeque<usize>, mut remaining: i64) -> i64 {
    while let Some(&slot) = queue.front() {
        let available = points[slot];
        if available > remaining {
            points[slot] = available - remaining;
            return 0;
        }

        points[slot] = 0;
        queue.pop_front();
        remaining -= available;
        if remaining == 0 {
            return 0;
        }
    }
    remaining
}
