//! Streaming reader for the GnuCash v2 XML ledger format.
//!
//! Only the data the snapshot model needs is read: the account tree
//! (`gnc:account`) and transactions with their splits (`gnc:transaction`).
//! Commodity definitions, price databases, slots and scheduled-transaction
//! templates are skipped. Split values are exact `num/denom` rationals; the
//! denominator is the currency SCU, a power of ten, so conversion to
//! `Decimal` is exact.

use super::{AccountId, AccountKind, Snapshot, SnapshotBuilder, SnapshotError};
use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing <{field}> in <{element}>")]
    MissingField {
        element: &'static str,
        field: &'static str,
    },

    #[error("split references unknown account {0}")]
    UnknownAccount(String),

    #[error("account references unknown parent {0}")]
    UnknownParent(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("file is gzip-compressed; re-save it as uncompressed XML (GnuCash: Preferences > General > Compress files)")]
    Compressed,
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Open and read a GnuCash XML file into a snapshot.
///
/// The file handle lives only for the duration of this call.
pub fn read_file(path: &Path) -> Result<Snapshot> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 2];
    let n = file.read(&mut magic)?;
    if n == 2 && magic == [0x1f, 0x8b] {
        return Err(LedgerError::Compressed);
    }
    file.rewind()?;
    read(BufReader::new(file))
}

#[derive(Default)]
struct RawAccount {
    guid: String,
    name: String,
    kind: String,
    description: String,
    commodity_space: String,
    commodity_id: String,
    parent: String,
}

#[derive(Default)]
struct RawSplit {
    value: String,
    account: String,
}

#[derive(Default)]
struct RawTransaction {
    date: String,
    description: String,
    splits: Vec<RawSplit>,
}

// Where the next text event should be routed.
#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    AcctGuid,
    AcctName,
    AcctKind,
    AcctDesc,
    AcctCommoditySpace,
    AcctCommodityId,
    AcctParent,
    TxnDate,
    TxnDesc,
    SplitValue,
    SplitAccount,
}

/// Read a GnuCash XML document into a snapshot.
pub fn read<R: BufRead>(reader: R) -> Result<Snapshot> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut accounts: Vec<RawAccount> = Vec::new();
    let mut transactions: Vec<RawTransaction> = Vec::new();

    let mut acct: Option<RawAccount> = None;
    let mut txn: Option<RawTransaction> = None;
    let mut split: Option<RawSplit> = None;

    let mut in_template = false;
    let mut in_date_posted = false;
    let mut in_act_commodity = false;
    let mut field = Field::None;

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                if name.as_ref() == b"gnc:template-transactions" {
                    in_template = true;
                } else if !in_template {
                    match name.as_ref() {
                        b"gnc:account" => acct = Some(RawAccount::default()),
                        b"act:id" if acct.is_some() => field = Field::AcctGuid,
                        b"act:name" => field = Field::AcctName,
                        b"act:type" => field = Field::AcctKind,
                        b"act:description" => field = Field::AcctDesc,
                        b"act:parent" => field = Field::AcctParent,
                        b"act:commodity" => in_act_commodity = true,
                        b"cmdty:space" if in_act_commodity && acct.is_some() => {
                            field = Field::AcctCommoditySpace
                        }
                        b"cmdty:id" if in_act_commodity && acct.is_some() => {
                            field = Field::AcctCommodityId
                        }
                        b"gnc:transaction" => txn = Some(RawTransaction::default()),
                        b"trn:date-posted" => in_date_posted = true,
                        b"ts:date" if in_date_posted => field = Field::TxnDate,
                        b"trn:description" => field = Field::TxnDesc,
                        b"trn:split" => split = Some(RawSplit::default()),
                        b"split:value" => field = Field::SplitValue,
                        b"split:account" => field = Field::SplitAccount,
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if field != Field::None {
                    let text = t.unescape().map_err(|e| LedgerError::Xml(e.to_string()))?;
                    route_text(field, &text, &mut acct, &mut txn, &mut split);
                }
            }
            Ok(Event::End(e)) => {
                field = Field::None;
                match e.name().as_ref() {
                    b"gnc:template-transactions" => in_template = false,
                    _ if in_template => {}
                    b"act:commodity" => in_act_commodity = false,
                    b"trn:date-posted" => in_date_posted = false,
                    b"gnc:account" => {
                        if let Some(a) = acct.take() {
                            accounts.push(a);
                        }
                    }
                    b"trn:split" => {
                        if let (Some(s), Some(t)) = (split.take(), txn.as_mut()) {
                            t.splits.push(s);
                        }
                    }
                    b"gnc:transaction" => {
                        if let Some(t) = txn.take() {
                            transactions.push(t);
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(LedgerError::Xml(e.to_string())),
        }
        buf.clear();
    }

    assemble(accounts, transactions)
}

fn route_text(
    field: Field,
    text: &str,
    acct: &mut Option<RawAccount>,
    txn: &mut Option<RawTransaction>,
    split: &mut Option<RawSplit>,
) {
    match field {
        Field::None => {}
        Field::AcctGuid => push(acct, text, |a| &mut a.guid),
        Field::AcctName => push(acct, text, |a| &mut a.name),
        Field::AcctKind => push(acct, text, |a| &mut a.kind),
        Field::AcctDesc => push(acct, text, |a| &mut a.description),
        Field::AcctCommoditySpace => push(acct, text, |a| &mut a.commodity_space),
        Field::AcctCommodityId => push(acct, text, |a| &mut a.commodity_id),
        Field::AcctParent => push(acct, text, |a| &mut a.parent),
        Field::TxnDate => push(txn, text, |t| &mut t.date),
        Field::TxnDesc => push(txn, text, |t| &mut t.description),
        Field::SplitValue => push(split, text, |s| &mut s.value),
        Field::SplitAccount => push(split, text, |s| &mut s.account),
    }
}

// Text may arrive in multiple events around entity references, so append.
fn push<T>(target: &mut Option<T>, text: &str, f: impl Fn(&mut T) -> &mut String) {
    if let Some(t) = target.as_mut() {
        f(t).push_str(text);
    }
}

fn assemble(accounts: Vec<RawAccount>, transactions: Vec<RawTransaction>) -> Result<Snapshot> {
    let mut builder = SnapshotBuilder::new();
    let mut by_guid: HashMap<String, AccountId> = HashMap::new();
    let mut parents: Vec<(AccountId, String)> = Vec::new();

    for raw in accounts {
        if raw.guid.is_empty() {
            return Err(LedgerError::MissingField {
                element: "gnc:account",
                field: "act:id",
            });
        }
        let kind = AccountKind::from_str(&raw.kind).unwrap_or(AccountKind::Other);
        // Only currency commodities carry a code; stock tickers do not count.
        let currency = match raw.commodity_space.as_str() {
            "CURRENCY" | "ISO4217" => Some(raw.commodity_id.as_str()),
            _ => None,
        };
        let id = builder.add_account(&raw.name, &raw.description, kind, currency, None);
        by_guid.insert(raw.guid, id);
        if !raw.parent.is_empty() {
            parents.push((id, raw.parent));
        }
    }

    for (id, parent_guid) in parents {
        let parent = *by_guid
            .get(&parent_guid)
            .ok_or(LedgerError::UnknownParent(parent_guid))?;
        builder.set_parent(id, parent);
    }

    for raw in transactions {
        if raw.date.is_empty() {
            return Err(LedgerError::MissingField {
                element: "gnc:transaction",
                field: "trn:date-posted",
            });
        }
        let date = parse_date(&raw.date)?;
        let mut splits = Vec::with_capacity(raw.splits.len());
        for s in raw.splits {
            if s.account.is_empty() {
                return Err(LedgerError::MissingField {
                    element: "trn:split",
                    field: "split:account",
                });
            }
            let account = *by_guid
                .get(&s.account)
                .ok_or(LedgerError::UnknownAccount(s.account))?;
            splits.push((account, parse_value(&s.value)?));
        }
        builder.add_transaction(date, &raw.description, splits);
    }

    Ok(builder.build()?)
}

/// Parse a GnuCash timestamp ("2024-04-06 00:00:00 +0100") or bare date.
fn parse_date(s: &str) -> Result<NaiveDate> {
    if let Ok(dt) = chrono::DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Ok(dt.date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| LedgerError::Parse(format!("invalid date '{s}'")))
}

/// Parse a GnuCash rational value ("123456/100", may be negative).
fn parse_value(s: &str) -> Result<Decimal> {
    let invalid = || LedgerError::Parse(format!("invalid value '{s}'"));
    let (num, denom) = s.split_once('/').ok_or_else(invalid)?;
    let num: i128 = num.trim().parse().map_err(|_| invalid())?;
    let denom: i128 = denom.trim().parse().map_err(|_| invalid())?;
    if denom <= 0 {
        return Err(invalid());
    }

    let mut scale = 0u32;
    let mut rest = denom;
    while rest % 10 == 0 {
        rest /= 10;
        scale += 1;
    }
    if rest == 1 && scale <= 28 {
        Decimal::try_from_i128_with_scale(num, scale).map_err(|_| invalid())
    } else {
        // Non-decimal SCU; values in transaction currency never hit this,
        // quantities of odd-lot commodities may.
        let num = Decimal::try_from_i128_with_scale(num, 0).map_err(|_| invalid())?;
        let denom = Decimal::try_from_i128_with_scale(denom, 0).map_err(|_| invalid())?;
        num.checked_div(denom).ok_or_else(invalid)
    }
}
