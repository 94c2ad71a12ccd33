//! Per-payer balance aggregation over the raw history

use crate::{
    types::{PayerAmounts, Transaction},
    Result,
};

/// Sum raw points per payer, in first-seen payer order.
///
/// Debits are summed as-is; nothing is validated or reordered. The only
/// failure is a payer total leaving the `i64` range.
pub fn balances(history: &[Transaction]) -> Result<PayerAmounts> {
    let mut totals = PayerAmounts::new();
    for txn in history {
        totals.add(&txn.payer, txn.points)?;
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Payer;
    use crate::Error;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_history() {
        assert!(balances(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_sums_unvalidated() {
        let t = Utc.with_ymd_and_hms(2020, 11, 2, 14, 0, 0).unwrap();
        let history = vec![
            Transaction::new("DANNON", 1000, t),
            Transaction::new("UNILEVER", 200, t),
            Transaction::new("DANNON", -200, t),
            Transaction::new("MILLER COORS", -10, t),
            Transaction::new("DANNON", 300, t),
        ];

        let totals = balances(&history).unwrap();
        assert_eq!(totals.len(), 3);
        assert_eq!(totals.get(&Payer::new("DANNON")), Some(1100));
        assert_eq!(totals.get(&Payer::new("UNILEVER")), Some(200));
        assert_eq!(totals.get(&Payer::new("MILLER COORS")), Some(-10));
    }

    #[test]
    fn test_sum_out_of_range_is_an_error() {
        let t = Utc.with_ymd_and_hms(2020, 11, 2, 14, 0, 0).unwrap();
        let history = vec![
            Transaction::new("DANNON", i64::MAX, t),
            Transaction::new("DANNON", i64::MAX, t),
        ];
        assert!(matches!(balances(&history), Err(Error::Overflow(_))));
    }
}
