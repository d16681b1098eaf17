//! Deposit extraction: isolating genuine external contributions into ISA
//! accounts from everything else that touches them.
//!
//! A transaction produces a deposit only when it credits the ISA account a
//! positive net amount AND some other leg of the same transaction debits a
//! contribution-source account. Internal transfers between ISA accounts,
//! interest credits and reinvested dividends all fail the second test.

use super::classify::{self, IsaKind, SourcePolicy};
use crate::ledger::{AccountId, Snapshot};
use crate::tax::TaxYear;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// One qualifying external contribution into an ISA account.
///
/// Ordering follows the report layout: year, then date, account path and
/// amount.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deposit {
    pub year: TaxYear,
    pub date: NaiveDate,
    pub account: String,
    pub amount: Decimal,
    pub kind: IsaKind,
}

/// Every ISA account in the snapshot, as (colon-joined path, id) pairs.
pub fn isa_accounts(snapshot: &Snapshot) -> Vec<(String, AccountId)> {
    snapshot
        .walk()
        .filter(|(_, account)| classify::is_isa_account(*account))
        .map(|(path, account)| (path.join(":"), account.id()))
        .collect()
}

/// Qualifying deposits into one ISA account, dated on or before `as_of`.
pub fn account_deposits(
    snapshot: &Snapshot,
    path: &str,
    id: AccountId,
    as_of: NaiveDate,
    policy: SourcePolicy,
) -> Vec<Deposit> {
    let mut deposits = Vec::new();
    let Some(kind) = classify::isa_kind(snapshot.account(id)) else {
        return deposits;
    };

    for txn in snapshot.transactions_for(id) {
        if txn.date > as_of {
            continue;
        }

        let mut amount = Decimal::ZERO;
        let mut contribution = false;
        for split in &txn.splits {
            if split.account == id {
                if split.value > Decimal::ZERO {
                    amount += split.value;
                }
            } else if split.value < Decimal::ZERO
                && classify::is_contribution_source(snapshot.account(split.account), policy)
            {
                contribution = true;
            }
        }

        if !amount.is_zero() && contribution {
            deposits.push(Deposit {
                year: TaxYear::from_date(txn.date),
                date: txn.date,
                account: path.to_string(),
                amount,
                kind,
            });
        }
    }

    deposits
}

/// All qualifying deposits across every ISA account in the ledger.
pub fn extract_deposits(
    snapshot: &Snapshot,
    as_of: NaiveDate,
    policy: SourcePolicy,
) -> Vec<Deposit> {
    let mut all = Vec::new();
    for (path, id) in isa_accounts(snapshot) {
        all.extend(account_deposits(snapshot, &path, id, as_of, policy));
    }
    all
}
