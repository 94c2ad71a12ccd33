//! Redemption planning
//!
//! Unlike normalization, which is scoped per payer, redemption treats the
//! clean ledger as one pool and spends it oldest-first across all payers.
//!
//! ```text
//! Clean:  P1@t1=300  P2@t2=200  P1@t3=1000
//! Redeem 400:
//!   P1@t1  take 300  (100 left to redeem)
//!   P2@t2  take 100  (done)
//! Plan:   P1: -300, P2: -100
//! ```

use crate::{
    error::Overdraft,
    ledger::CleanLedger,
    types::{Payer, PayerAmounts, Transaction},
    Error, Result,
};
use chrono::{DateTime, Utc};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Per-payer debits satisfying one redemption
///
/// Amounts are negative and listed in first-debited order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedemptionPlan {
    debits: PayerAmounts,
}

impl RedemptionPlan {
    /// Debits by payer
    pub fn debits(&self) -> &PayerAmounts {
        &self.debits
    }

    /// Debit for one payer, if any
    pub fn debit_for(&self, payer: &Payer) -> Option<i64> {
        self.debits.get(payer)
    }

    /// Total points redeemed (positive)
    pub fn redeemed(&self) -> i64 {
        -self.debits.total()
    }

    /// Nothing debited
    pub fn is_empty(&self) -> bool {
        self.debits.is_empty()
    }

    /// Synthetic debit transactions recording this plan at `now`
    pub fn to_transactions(&self, now: DateTime<Utc>) -> Vec<Transaction> {
        self.debits
            .iter()
            .map(|(payer, points)| Transaction::new(payer.clone(), points, now))
            .collect()
    }
}

#[derive(Serialize)]
struct PayerPoints<'a> {
    payer: &'a str,
    points: i64,
}

impl Serialize for RedemptionPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.debits.len()))?;
        for (payer, points) in self.debits.iter() {
            seq.serialize_element(&PayerPoints {
                payer: payer.as_str(),
                points,
            })?;
        }
        seq.end()
    }
}

/// Plan a redemption of `points` against a clean ledger.
pub fn plan(ledger: &CleanLedger, points: i64) -> Result<RedemptionPlan> {
    if points < 0 {
        return Err(Error::InvalidRedemptionRequest(points));
    }

    let mut debits = PayerAmounts::new();
    let mut remaining = points;

    for entry in ledger.entries() {
        if remaining == 0 {
            break;
        }
        if entry.points <= 0 {
            continue;
        }

        let take = entry.points.min(remaining);
        debits.add(&entry.payer, -take)?;
        remaining -= take;
    }

    if remaining > 0 {
        return Err(Overdraft::InsufficientTotal {
            requested: points,
            shortfall: remaining,
        }
        .into());
    }

    tracing::debug!(points, payers = debits.len(), "Planned redemption");
    Ok(RedemptionPlan { debits })
}
