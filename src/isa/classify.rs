//! ISA account classification from textual account metadata.
//!
//! ISA accounts are recognized by their description ("Cash ISA" or
//! "Stocks & Shares ISA", optionally prefixed "Closed "), matched as a
//! prefix exactly as entered. No fuzzy matching: a description that does not
//! match is simply not an ISA account.

use crate::ledger::{AccountKind, AccountRef};
use once_cell::sync::Lazy;
use regex::Regex;

/// The only currency ISA accounts can be denominated in.
pub const ISA_CURRENCY: &str = "GBP";

static ISA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Closed )?(Cash|Stocks & Shares) ISA ?").unwrap());
static CASH_ISA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(Closed )?Cash ISA ?").unwrap());
static STOCKS_ISA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Closed )?Stocks & Shares ISA ?").unwrap());

/// Which ISA wrapper an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IsaKind {
    Cash,
    Stocks,
}

impl IsaKind {
    /// Short label used in report tables.
    pub fn label(&self) -> &'static str {
        match self {
            IsaKind::Cash => "Cash",
            IsaKind::Stocks => "S&S",
        }
    }
}

impl std::fmt::Display for IsaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IsaKind::Cash => write!(f, "cash"),
            IsaKind::Stocks => write!(f, "stocks"),
        }
    }
}

/// Income account names that mark in-wrapper income rather than external
/// money. "Investments" is excluded only when the policy says so.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcePolicy {
    pub exclude_investments: bool,
}

impl SourcePolicy {
    fn excludes_income_name(&self, name: &str) -> bool {
        matches!(name, "Interest" | "Dividends")
            || (self.exclude_investments && name == "Investments")
    }
}

pub fn is_isa_account(account: AccountRef) -> bool {
    account.currency() == Some(ISA_CURRENCY) && ISA_RE.is_match(account.description())
}

pub fn isa_kind(account: AccountRef) -> Option<IsaKind> {
    let description = account.description();
    if CASH_ISA_RE.is_match(description) {
        Some(IsaKind::Cash)
    } else if STOCKS_ISA_RE.is_match(description) {
        Some(IsaKind::Stocks)
    } else {
        None
    }
}

/// Whether an ISA account's description carries the "Closed " marker.
pub fn is_closed(account: AccountRef) -> bool {
    account.description().starts_with("Closed ")
}

/// Whether a debit from this account counts as external money entering an
/// ISA. ISA accounts themselves, stock and mutual-fund accounts, and income
/// accounts under an excluded name (interest, dividends, optionally
/// investments) do not qualify.
pub fn is_contribution_source(account: AccountRef, policy: SourcePolicy) -> bool {
    if is_isa_account(account) {
        return false;
    }

    match account.kind() {
        AccountKind::Stock | AccountKind::Mutual => false,
        AccountKind::Income => {
            let mut current = Some(account);
            while let Some(a) = current {
                if policy.excludes_income_name(a.name()) {
                    return false;
                }
                current = a.parent();
            }
            true
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountId, Snapshot, SnapshotBuilder};

    fn lookup(snap: &Snapshot, name: &str) -> AccountId {
        snap.walk()
            .find(|(_, a)| a.name() == name)
            .map(|(_, a)| a.id())
            .unwrap_or_else(|| panic!("no account named {name}"))
    }

    fn fixture() -> Snapshot {
        let mut b = SnapshotBuilder::new();
        let root = b.add_account("Root Account", "", AccountKind::Root, None, None);
        let assets = b.add_account("Assets", "", AccountKind::Asset, Some("GBP"), Some(root));
        b.add_account("Current", "Everyday banking", AccountKind::Bank, Some("GBP"), Some(assets));
        b.add_account("Nutmeg", "Cash ISA", AccountKind::Bank, Some("GBP"), Some(assets));
        b.add_account("Vanguard", "Stocks & Shares ISA ", AccountKind::Bank, Some("GBP"), Some(assets));
        b.add_account("Old ISA", "Closed Cash ISA", AccountKind::Bank, Some("GBP"), Some(assets));
        b.add_account("Euro ISA", "Cash ISA", AccountKind::Bank, Some("EUR"), Some(assets));
        b.add_account("Acme plc", "Cash ISA", AccountKind::Stock, None, Some(assets));
        let income = b.add_account("Income", "", AccountKind::Income, Some("GBP"), Some(root));
        b.add_account("Salary", "", AccountKind::Income, Some("GBP"), Some(income));
        let interest = b.add_account("Interest", "", AccountKind::Income, Some("GBP"), Some(income));
        b.add_account("Nutmeg Interest", "", AccountKind::Income, Some("GBP"), Some(interest));
        b.add_account("Dividends", "", AccountKind::Income, Some("GBP"), Some(income));
        let investments = b.add_account("Investments", "", AccountKind::Income, Some("GBP"), Some(income));
        b.add_account("Fund Income", "", AccountKind::Income, Some("GBP"), Some(investments));
        b.build().unwrap()
    }

    #[test]
    fn isa_accounts_require_gbp_and_matching_description() {
        let snap = fixture();
        let isa = |name| is_isa_account(snap.account(lookup(&snap, name)));

        assert!(isa("Nutmeg"));
        assert!(isa("Vanguard"));
        assert!(isa("Old ISA"));
        assert!(!isa("Current"));
        // wrong currency, and no currency at all
        assert!(!isa("Euro ISA"));
        assert!(!isa("Acme plc"));
    }

    #[test]
    fn kind_follows_the_description() {
        let snap = fixture();
        let kind = |name| isa_kind(snap.account(lookup(&snap, name)));

        assert_eq!(kind("Nutmeg"), Some(IsaKind::Cash));
        assert_eq!(kind("Vanguard"), Some(IsaKind::Stocks));
        assert_eq!(kind("Old ISA"), Some(IsaKind::Cash));
        assert_eq!(kind("Current"), None);
    }

    #[test]
    fn closed_marker() {
        let snap = fixture();
        assert!(is_closed(snap.account(lookup(&snap, "Old ISA"))));
        assert!(!is_closed(snap.account(lookup(&snap, "Nutmeg"))));
    }

    #[test]
    fn description_matching_is_exact_wording() {
        let mut b = SnapshotBuilder::new();
        let root = b.add_account("Root Account", "", AccountKind::Root, None, None);
        b.add_account("A", "cash isa", AccountKind::Bank, Some("GBP"), Some(root));
        b.add_account("B", "Stocks and Shares ISA", AccountKind::Bank, Some("GBP"), Some(root));
        b.add_account("C", "My Cash ISA", AccountKind::Bank, Some("GBP"), Some(root));
        let snap = b.build().unwrap();

        assert!(snap.walk().all(|(_, a)| !is_isa_account(a)));
    }

    #[test]
    fn contribution_sources() {
        let snap = fixture();
        let policy = SourcePolicy::default();
        let source = |name| is_contribution_source(snap.account(lookup(&snap, name)), policy);

        assert!(source("Current"));
        assert!(source("Salary"));
        // ISA accounts and holdings are never sources
        assert!(!source("Nutmeg"));
        assert!(!source("Old ISA"));
        assert!(!source("Acme plc"));
        // in-wrapper income, directly or via an ancestor name
        assert!(!source("Interest"));
        assert!(!source("Nutmeg Interest"));
        assert!(!source("Dividends"));
    }

    #[test]
    fn investments_exclusion_is_policy_controlled() {
        let snap = fixture();
        let fund = snap.account(lookup(&snap, "Fund Income"));

        assert!(is_contribution_source(fund, SourcePolicy::default()));
        assert!(!is_contribution_source(
            fund,
            SourcePolicy {
                exclude_investments: true
            }
        ));
    }

    #[test]
    fn excluded_names_only_apply_to_income_accounts() {
        let mut b = SnapshotBuilder::new();
        let root = b.add_account("Root Account", "", AccountKind::Root, None, None);
        b.add_account("Interest", "", AccountKind::Bank, Some("GBP"), Some(root));
        let snap = b.build().unwrap();

        let account = snap.account(lookup(&snap, "Interest"));
        assert!(is_contribution_source(account, SourcePolicy::default()));
    }
}
