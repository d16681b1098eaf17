//! Read-only ledger snapshot: an immutable account tree plus transactions.
//!
//! Storage backends (e.g. the GnuCash XML reader) assemble a [`Snapshot`]
//! through [`SnapshotBuilder`]; everything downstream of loading operates on
//! the snapshot only, so classification and extraction logic never touch a
//! live ledger session.

pub mod gnucash;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::VecDeque;

/// Handle to an account within one [`Snapshot`].
///
/// Ids are only meaningful for the snapshot that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountId(usize);

/// Account type tag, mirroring the GnuCash account types we care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountKind {
    Root,
    Bank,
    Cash,
    Asset,
    Stock,
    Mutual,
    Income,
    Expense,
    Equity,
    Liability,
    Credit,
    #[default]
    Other,
}

impl AccountKind {
    pub fn from_str(s: &str) -> Option<AccountKind> {
        match s {
            "ROOT" => Some(AccountKind::Root),
            "BANK" => Some(AccountKind::Bank),
            "CASH" => Some(AccountKind::Cash),
            "ASSET" => Some(AccountKind::Asset),
            "STOCK" => Some(AccountKind::Stock),
            "MUTUAL" => Some(AccountKind::Mutual),
            "INCOME" => Some(AccountKind::Income),
            "EXPENSE" => Some(AccountKind::Expense),
            "EQUITY" => Some(AccountKind::Equity),
            "LIABILITY" => Some(AccountKind::Liability),
            "CREDIT" => Some(AccountKind::Credit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct AccountNode {
    name: String,
    description: String,
    currency: Option<String>,
    kind: AccountKind,
    parent: Option<AccountId>,
    children: Vec<AccountId>,
}

/// One leg of a double-entry transaction: a signed value against an account.
#[derive(Debug, Clone)]
pub struct Split {
    pub account: AccountId,
    pub value: Decimal,
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub splits: Vec<Split>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("ledger has no root account")]
    NoRootAccount,
    #[error("ledger has more than one root account")]
    MultipleRootAccounts,
}

/// Immutable view of a loaded ledger.
#[derive(Debug)]
pub struct Snapshot {
    accounts: Vec<AccountNode>,
    root: AccountId,
    transactions: Vec<Transaction>,
    // account index -> indices of transactions with a split on that account
    by_account: Vec<Vec<usize>>,
}

impl Snapshot {
    pub fn root(&self) -> AccountRef<'_> {
        self.account(self.root)
    }

    pub fn account(&self, id: AccountId) -> AccountRef<'_> {
        AccountRef { snap: self, id }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Transactions with at least one split against the given account.
    pub fn transactions_for(&self, id: AccountId) -> impl Iterator<Item = &Transaction> {
        self.by_account[id.0]
            .iter()
            .map(move |&i| &self.transactions[i])
    }

    /// Breadth-first traversal of the account tree, yielding each account
    /// with its path. The path excludes the root and ends with the account's
    /// own name, so the root itself has an empty path.
    pub fn walk(&self) -> Walk<'_> {
        let mut queue = VecDeque::new();
        queue.push_back((Vec::new(), self.root));
        Walk { snap: self, queue }
    }
}

/// Cheap read-only view of one account.
#[derive(Debug, Clone, Copy)]
pub struct AccountRef<'a> {
    snap: &'a Snapshot,
    id: AccountId,
}

impl<'a> AccountRef<'a> {
    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.node().name
    }

    pub fn description(&self) -> &'a str {
        &self.node().description
    }

    /// Commodity mnemonic, e.g. "GBP". `None` for non-currency commodities.
    pub fn currency(&self) -> Option<&'a str> {
        self.node().currency.as_deref()
    }

    pub fn kind(&self) -> AccountKind {
        self.node().kind
    }

    pub fn parent(&self) -> Option<AccountRef<'a>> {
        self.node().parent.map(|id| self.snap.account(id))
    }

    /// Child accounts, sorted by name.
    pub fn children(&self) -> impl Iterator<Item = AccountRef<'a>> + 'a {
        let snap = self.snap;
        self.node().children.iter().map(move |&id| snap.account(id))
    }

    fn node(&self) -> &'a AccountNode {
        &self.snap.accounts[self.id.0]
    }
}

/// Iterator returned by [`Snapshot::walk`].
pub struct Walk<'a> {
    snap: &'a Snapshot,
    queue: VecDeque<(Vec<String>, AccountId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Vec<String>, AccountRef<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        let (path, id) = self.queue.pop_front()?;
        let account = self.snap.account(id);
        for child in account.children() {
            let mut child_path = path.clone();
            child_path.push(child.name().to_string());
            self.queue.push_back((child_path, child.id()));
        }
        Some((path, account))
    }
}

/// Assembles a [`Snapshot`]; used by loaders and test fixtures.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    accounts: Vec<AccountNode>,
    transactions: Vec<Transaction>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account; `parent: None` marks the root. Returns the id used to
    /// reference the account in later calls.
    pub fn add_account(
        &mut self,
        name: &str,
        description: &str,
        kind: AccountKind,
        currency: Option<&str>,
        parent: Option<AccountId>,
    ) -> AccountId {
        let id = AccountId(self.accounts.len());
        self.accounts.push(AccountNode {
            name: name.to_string(),
            description: description.to_string(),
            currency: currency.map(str::to_string),
            kind,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Reparent an account added earlier. Loaders use this when parent
    /// references can only be resolved after the whole tree has been read.
    pub fn set_parent(&mut self, account: AccountId, parent: AccountId) {
        self.accounts[account.0].parent = Some(parent);
    }

    pub fn add_transaction(
        &mut self,
        date: NaiveDate,
        description: &str,
        splits: Vec<(AccountId, Decimal)>,
    ) {
        self.transactions.push(Transaction {
            date,
            description: description.to_string(),
            splits: splits
                .into_iter()
                .map(|(account, value)| Split { account, value })
                .collect(),
        });
    }

    pub fn build(mut self) -> Result<Snapshot, SnapshotError> {
        let mut root = None;
        for (i, node) in self.accounts.iter().enumerate() {
            if node.parent.is_none() {
                if root.replace(AccountId(i)).is_some() {
                    return Err(SnapshotError::MultipleRootAccounts);
                }
            }
        }
        let root = root.ok_or(SnapshotError::NoRootAccount)?;

        let children_of: Vec<Vec<AccountId>> = (0..self.accounts.len())
            .map(|i| {
                let mut children: Vec<AccountId> = self
                    .accounts
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| n.parent == Some(AccountId(i)))
                    .map(|(j, _)| AccountId(j))
                    .collect();
                children.sort_by(|a, b| self.accounts[a.0].name.cmp(&self.accounts[b.0].name));
                children
            })
            .collect();
        for (node, children) in self.accounts.iter_mut().zip(children_of) {
            node.children = children;
        }

        let mut by_account = vec![Vec::new(); self.accounts.len()];
        for (i, txn) in self.transactions.iter().enumerate() {
            for split in &txn.splits {
                let index: &mut Vec<usize> = &mut by_account[split.account.0];
                if index.last() != Some(&i) {
                    index.push(i);
                }
            }
        }

        Ok(Snapshot {
            accounts: self.accounts,
            root,
            transactions: self.transactions,
            by_account,
        })
    }
}
