//! Core types for the points ledger
//!
//! All types are designed for:
//! - Value semantics (transactions are never mutated once recorded)
//! - Deterministic output ordering (first-seen payer order, never hash order)
//! - Plain serde (de)serialization for the HTTP shell and seed files

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Point-issuing partner
///
/// Any string is a legal payer, including the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payer(String);

impl Payer {
    /// Create new payer
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Payer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Payer {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Payer {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One signed point movement from one payer at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Issuing partner
    pub payer: Payer,

    /// Positive for a credit, negative for a spend; zero is inert
    pub points: i64,

    /// Instant establishing the global ordering
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create new transaction
    pub fn new(payer: impl Into<Payer>, points: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            payer: payer.into(),
            points,
            timestamp,
        }
    }

    /// Non-negative points
    pub fn is_credit(&self) -> bool {
        self.points >= 0
    }

    /// Negative points
    pub fn is_debit(&self) -> bool {
        self.points < 0
    }

    /// Same payer and instant, different point value
    pub fn with_points(&self, points: i64) -> Self {
        Self {
            payer: self.payer.clone(),
            points,
            timestamp: self.timestamp,
        }
    }
}

/// Per-payer amounts kept in first-seen payer order
///
/// Serializes as a JSON object whose keys appear in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayerAmounts {
    entries: Vec<(Payer, i64)>,
    index: HashMap<Payer, usize>,
}

impl PayerAmounts {
    /// Empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to the payer's running total, inserting it on first sight.
    ///
    /// Fails without changing anything if the total would leave the `i64` range.
    pub fn add(&mut self, payer: &Payer, amount: i64) -> Result<()> {
        match self.index.get(payer) {
            Some(&slot) => {
                let total = &mut self.entries[slot].1;
                *total = total.checked_add(amount).ok_or_else(|| {
                    Error::Overflow(format!("total for payer '{}' out of range", payer))
                })?;
            }
            None => {
                self.index.insert(payer.clone(), self.entries.len());
                self.entries.push((payer.clone(), amount));
            }
        }
        Ok(())
    }

    /// Current total for a payer
    pub fn get(&self, payer: &Payer) -> Option<i64> {
        self.index.get(payer).map(|&slot| self.entries[slot].1)
    }

    /// Iterate in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&Payer, i64)> + '_ {
        self.entries.iter().map(|(payer, amount)| (payer, *amount))
    }

    /// Number of payers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No payers recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum over all payers
    pub fn total(&self) -> i64 {
        self.entries.iter().map(|(_, amount)| amount).sum()
    }

    /// Consume into ordered pairs
    pub fn into_vec(self) -> Vec<(Payer, i64)> {
        self.entries
    }
}

impl Serialize for PayerAmounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (payer, amount) in &self.entries {
            map.serialize_entry(payer.as_str(), amount)?;
        }
        map.end()
    }
}
