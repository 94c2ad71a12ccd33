//! Single-account points state
//!
//! Owns the append-only raw history and the clean ledger derived from it.
//! The clean ledger is never patched: every normalization rebuilds it from
//! the raw history and replaces it wholesale.

use crate::{
    balance,
    ledger::{self, CleanLedger},
    redemption::{self, RedemptionPlan},
    types::{PayerAmounts, Transaction},
    Error, Result,
};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Points account
#[derive(Debug, Clone, Default)]
pub struct Account {
    /// Insertion-ordered raw history
    raw_history: Vec<Transaction>,

    /// Result of the last successful normalization
    clean_ledger: CleanLedger,
}

impl Account {
    /// Empty account
    pub fn new() -> Self {
        Self::default()
    }

    /// Account seeded with an initial raw history
    pub fn with_history(history: impl IntoIterator<Item = Transaction>) -> Self {
        Self {
            raw_history: history.into_iter().collect(),
            clean_ledger: CleanLedger::default(),
        }
    }

    /// Account seeded from a JSON array of transactions.
    ///
    /// Each entry goes through [`Account::add_transaction`].
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let history: Vec<Transaction> = serde_json::from_str(&content)?;

        let mut account = Self::new();
        for txn in history {
            account.add_transaction(txn)?;
        }
        Ok(account)
    }

    /// Append a transaction to the raw history.
    ///
    /// Rejected with [`Error::Overflow`] when its points cannot be negated or
    /// would push the payer's raw total out of the `i64` range.
    pub fn add_transaction(&mut self, txn: Transaction) -> Result<()> {
        if txn.points == i64::MIN {
            return Err(Error::Overflow(format!(
                "{} points for payer '{}' cannot be recorded",
                txn.points, txn.payer
            )));
        }

        self.raw_history
            .iter()
            .filter(|recorded| recorded.payer == txn.payer)
            .try_fold(0i64, |total, recorded| total.checked_add(recorded.points))
            .and_then(|total| total.checked_add(txn.points))
            .ok_or_else(|| {
                Error::Overflow(format!(
                    "{} more points would overflow the total for payer '{}'",
                    txn.points, txn.payer
                ))
            })?;

        tracing::debug!(payer = %txn.payer, points = txn.points, "Recording transaction");
        self.raw_history.push(txn);
        Ok(())
    }

    /// Raw per-payer totals
    pub fn balances(&self) -> Result<PayerAmounts> {
        balance::balances(&self.raw_history)
    }

    /// Rebuild the clean ledger from the raw history.
    ///
    /// On failure the stored clean ledger is cleared.
    pub fn normalize(&mut self) -> Result<&CleanLedger> {
        match ledger::normalize(&self.raw_history) {
            Ok(clean) => {
                self.clean_ledger = clean;
                Ok(&self.clean_ledger)
            }
            Err(e) => {
                self.clean_ledger = CleanLedger::default();
                Err(e)
            }
        }
    }

    /// Redeem points, stamping the synthetic debits with the current time
    pub fn redeem(&mut self, points: i64) -> Result<RedemptionPlan> {
        self.redeem_at(points, Utc::now())
    }

    /// Redeem points, stamping the synthetic debits with `now`.
    ///
    /// Raw history is only appended to when the whole plan succeeds.
    pub fn redeem_at(&mut self, points: i64, now: DateTime<Utc>) -> Result<RedemptionPlan> {
        if points < 0 {
            return Err(Error::InvalidRedemptionRequest(points));
        }

        let clean = self.normalize()?;
        let plan = redemption::plan(clean, points)?;

        self.raw_history.extend(plan.to_transactions(now));
        tracing::info!(
            points,
            payers = plan.debits().len(),
            history = self.raw_history.len(),
            "Redeemed points"
        );

        Ok(plan)
    }

    /// Raw history in insertion order
    pub fn raw_history(&self) -> &[Transaction] {
        &self.raw_history
    }

    /// Clean ledger from the last normalization
    pub fn clean_ledger(&self) -> &CleanLedger {
        &self.clean_ledger
    }

    /// Number of raw transactions
    pub fn len(&self) -> usize {
        self.raw_history.len()
    }

    /// No raw transactions
    pub fn is_empty(&self) -> bool {
        self.raw_history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Overdraft;
    use crate::types::Payer;
    use chrono::{Duration, TimeZone};
    use std::io::Write;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, 31, 0, 0, 0).unwrap()
    }

    fn sample_account() -> Account {
        let t = base();
        let mut account = Account::new();
        for txn in [
            Transaction::new("DANNON", 1000, t + Duration::hours(62)),
            Transaction::new("UNILEVER", 200, t + Duration::hours(11)),
            Transaction::new("DANNON", -200, t + Duration::hours(15)),
            Transaction::new("MILLER COORS", 10000, t + Duration::hours(38)),
            Transaction::new("DANNON", 300, t + Duration::hours(10)),
        ] {
            account.add_transaction(txn).unwrap();
        }
        account
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 11, 5, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_add_transaction_appends() {
        let mut account = Account::new();
        assert!(account.is_empty());

        for payer in ["", "FakeCompany", "FakeCompany with punctuation 'L.L.C."] {
            for points in -10..=10 {
                let expected = Transaction::new(payer, points, base());
                account.add_transaction(expected.clone()).unwrap();
                assert_eq!(account.raw_history().last(), Some(&expected));
            }
        }
        assert_eq!(account.len(), 63);
    }

    #[test]
    fn test_add_transaction_rejects_out_of_range_points() {
        let mut account = sample_account();

        let err = account
            .add_transaction(Transaction::new("DANNON", i64::MIN, base()))
            .unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));

        account
            .add_transaction(Transaction::new("MILLER COORS", i64::MAX - 10000, base()))
            .unwrap();
        let err = account
            .add_transaction(Transaction::new("MILLER COORS", 1, base()))
            .unwrap_err();
        assert!(matches!(err, Error::Overflow(_)));

        // Rejected entries never reach the history, so everything still works
        assert_eq!(account.len(), 6);
        let balances = account.balances().unwrap();
        assert_eq!(balances.get(&Payer::new("MILLER COORS")), Some(i64::MAX));
        assert!(account.redeem_at(100, now()).is_ok());
    }

    #[test]
    fn test_debit_at_max_is_accepted() {
        let mut account = Account::new();
        account
            .add_transaction(Transaction::new("DANNON", -i64::MAX, base()))
            .unwrap();
        assert_eq!(
            account.balances().unwrap().get(&Payer::new("DANNON")),
            Some(-i64::MAX)
        );
        assert!(matches!(
            account.normalize(),
            Err(Error::NegativeBalance(Overdraft::NoPriorCredit { .. }))
        ));
    }

    #[test]
    fn test_future_dated_credit_is_redeemable_now() {
        // Redemption draws on every clean entry regardless of its date, while
        // the synthetic debit is stamped with the redemption instant. A debit
        // dated before the credit it drew on cannot be normalized again.
        let future = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let mut account = Account::with_history(vec![Transaction::new("P", 100, future)]);

        let plan = account.redeem_at(50, now()).unwrap();
        assert_eq!(plan.debit_for(&Payer::new("P")), Some(-50));

        assert!(matches!(
            account.normalize(),
            Err(Error::NegativeBalance(Overdraft::NoPriorCredit { points: 50, .. }))
        ));
        assert!(account.redeem_at(1, now()).is_err());
        assert_eq!(account.balances().unwrap().get(&Payer::new("P")), Some(50));
    }

    #[test]
    fn test_balances_on_empty_account() {
        assert!(Account::new().balances().unwrap().is_empty());
    }

    #[test]
    fn test_redeem_end_to_end() {
        let mut account = sample_account();
        let plan = account.redeem_at(5000, now()).unwrap();

        let debits: Vec<(&str, i64)> = plan
            .debits()
            .iter()
            .map(|(p, v)| (p.as_str(), v))
            .collect();
        assert_eq!(
            debits,
            vec![("DANNON", -100), ("UNILEVER", -200), ("MILLER COORS", -4700)]
        );

        let balances = account.balances().unwrap();
        assert_eq!(balances.get(&Payer::new("DANNON")), Some(1000));
        assert_eq!(balances.get(&Payer::new("UNILEVER")), Some(0));
        assert_eq!(balances.get(&Payer::new("MILLER COORS")), Some(5300));

        assert_eq!(account.len(), 8);
        assert!(account.raw_history()[5..]
            .iter()
            .all(|txn| txn.timestamp == now() && txn.is_debit()));
    }

    #[test]
    fn test_redemptions_compose() {
        let mut account = sample_account();
        account.redeem_at(100, now()).unwrap();
        let plan = account.redeem_at(250, now()).unwrap();

        assert_eq!(plan.debit_for(&Payer::new("UNILEVER")), Some(-200));
        assert_eq!(plan.debit_for(&Payer::new("MILLER COORS")), Some(-50));
        assert_eq!(plan.debit_for(&Payer::new("DANNON")), None);
    }

    #[test]
    fn test_negative_redemption_leaves_state_alone() {
        let mut account = sample_account();
        account.normalize().unwrap();
        let clean_before = account.clean_ledger().clone();

        let err = account.redeem_at(-5, now()).unwrap_err();
        assert!(matches!(err, Error::InvalidRedemptionRequest(-5)));
        assert_eq!(account.len(), 5);
        assert_eq!(account.clean_ledger(), &clean_before);
    }

    #[test]
    fn test_insufficient_balance_leaves_history_alone() {
        let mut account = sample_account();
        let before = account.raw_history().to_vec();

        let err = account.redeem_at(11_301, now()).unwrap_err();
        assert!(matches!(
            err,
            Error::NegativeBalance(Overdraft::InsufficientTotal { shortfall: 1, .. })
        ));
        assert_eq!(account.raw_history(), before.as_slice());
    }

    #[test]
    fn test_overdrawn_payer_blocks_redemption() {
        let mut account = sample_account();
        account
            .add_transaction(Transaction::new("UNILEVER", -500, base() + Duration::hours(12)))
            .unwrap();

        let err = account.redeem_at(10, now()).unwrap_err();
        assert!(matches!(
            err,
            Error::NegativeBalance(Overdraft::ExceedsCredit { .. })
        ));
        assert_eq!(account.len(), 6);
        assert!(account.clean_ledger().is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut account = sample_account();
        let first = account.normalize().unwrap().clone();
        let second = account.normalize().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn test_from_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"payer": "DANNON", "points": 300, "timestamp": "2020-10-31T10:00:00Z"}},
                {{"payer": "DANNON", "points": -100, "timestamp": "2020-10-31T15:00:00Z"}}
            ]"#
        )
        .unwrap();

        let mut account = Account::from_seed_file(file.path()).unwrap();
        assert_eq!(account.len(), 2);
        assert_eq!(account.balances().unwrap().get(&Payer::new("DANNON")), Some(200));
        assert_eq!(account.normalize().unwrap().total(), 200);
    }

    #[test]
    fn test_from_seed_file_rejects_overflowing_history() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"payer": "DANNON", "points": {max}, "timestamp": "2020-10-31T10:00:00Z"}},
                {{"payer": "DANNON", "points": {max}, "timestamp": "2020-10-31T15:00:00Z"}}
            ]"#,
            max = i64::MAX
        )
        .unwrap();

        assert!(matches!(
            Account::from_seed_file(file.path()),
            Err(Error::Overflow(_))
        ));
    }

    #[test]
    fn test_from_seed_file_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Account::from_seed_file(file.path()),
            Err(Error::Serialization(_))
        ));
    }
}
