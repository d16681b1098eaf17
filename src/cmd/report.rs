//! Report command - per-tax-year ISA deposits and allowance usage

use crate::cmd::load_snapshot;
use crate::isa::{self, SourcePolicy, YearReview};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// GnuCash XML file
    #[arg(short, long)]
    file: PathBuf,

    /// Show contributions as at this date (YYYY-MM-DD; defaults to today)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Also treat income under an "Investments" account as in-wrapper income
    #[arg(long)]
    exclude_investments: bool,

    /// Output deposit rows as CSV instead of formatted tables
    #[arg(long)]
    csv: bool,

    /// Output as JSON instead of formatted tables
    #[arg(long, conflicts_with = "csv")]
    json: bool,
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let snapshot = load_snapshot(&self.file)?;
        let as_of = self
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let policy = SourcePolicy {
            exclude_investments: self.exclude_investments,
        };

        let deposits = isa::extract_deposits(&snapshot, as_of, policy);
        let years = isa::review(deposits, as_of);

        if self.json {
            self.print_json(&years)
        } else if self.csv {
            self.write_csv(&years)
        } else {
            self.print_tables(&years);
            Ok(())
        }
    }

    fn print_tables(&self, years: &[YearReview]) {
        for year in years {
            println!();
            if year.estimated {
                println!("TAX YEAR {} (allowance estimated)", year.year);
            } else {
                println!("TAX YEAR {}", year.year);
            }

            if !year.deposits.is_empty() {
                let rows: Vec<DepositRow> = year.deposits.iter().map(DepositRow::from).collect();
                println!("{}", styled(Table::new(rows)));
            }

            let rows: Vec<UsageRow> = year.usage.iter().map(UsageRow::from).collect();
            println!("{}", styled(Table::new(rows)));
        }
    }

    fn write_csv(&self, years: &[YearReview]) -> anyhow::Result<()> {
        let mut wtr = csv::Writer::from_writer(io::stdout());
        for year in years {
            for deposit in &year.deposits {
                wtr.serialize(CsvDepositRecord::from(deposit))?;
            }
        }
        wtr.flush()?;
        Ok(())
    }

    fn print_json(&self, years: &[YearReview]) -> anyhow::Result<()> {
        let data: Vec<YearData> = years.iter().map(YearData::from).collect();
        println!("{}", serde_json::to_string_pretty(&data)?);
        Ok(())
    }
}

fn styled(mut table: Table) -> Table {
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()));
    table
}

/// Row for the per-year deposit table
#[derive(Tabled)]
struct DepositRow {
    #[tabled(rename = "Date")]
    date: String,

    #[tabled(rename = "Amount")]
    amount: String,

    #[tabled(rename = "Account")]
    account: String,
}

impl From<&isa::Deposit> for DepositRow {
    fn from(deposit: &isa::Deposit) -> Self {
        DepositRow {
            date: deposit.date.format("%Y-%m-%d").to_string(),
            amount: format_gbp(deposit.amount),
            account: deposit.account.clone(),
        }
    }
}

/// Row for the allowance usage table
#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "")]
    label: &'static str,

    #[tabled(rename = "Allowance")]
    allowance: String,

    #[tabled(rename = "Contributions")]
    contributions: String,

    #[tabled(rename = "Remaining")]
    remaining: String,
}

impl From<&isa::Usage> for UsageRow {
    fn from(usage: &isa::Usage) -> Self {
        UsageRow {
            label: usage.label,
            allowance: format_gbp(usage.allowance),
            contributions: format_gbp(usage.contributions),
            remaining: format_gbp_signed(usage.remaining),
        }
    }
}

/// Flat record for CSV output
#[derive(Serialize)]
struct CsvDepositRecord {
    tax_year: String,
    date: String,
    account: String,
    amount: String,
    kind: String,
}

impl From<&isa::Deposit> for CsvDepositRecord {
    fn from(deposit: &isa::Deposit) -> Self {
        CsvDepositRecord {
            tax_year: deposit.year.display(),
            date: deposit.date.format("%Y-%m-%d").to_string(),
            account: deposit.account.clone(),
            amount: format!("{:.2}", deposit.amount),
            kind: deposit.kind.to_string(),
        }
    }
}

/// Per-year structure for JSON output
#[derive(Serialize)]
struct YearData {
    tax_year: String,
    estimated: bool,
    deposits: Vec<DepositData>,
    allowances: Vec<UsageData>,
}

#[derive(Serialize)]
struct DepositData {
    date: String,
    amount: String,
    account: String,
    kind: String,
}

#[derive(Serialize)]
struct UsageData {
    kind: String,
    allowance: String,
    contributions: String,
    remaining: String,
}

impl From<&YearReview> for YearData {
    fn from(year: &YearReview) -> Self {
        YearData {
            tax_year: year.year.display(),
            estimated: year.estimated,
            deposits: year
                .deposits
                .iter()
                .map(|d| DepositData {
                    date: d.date.format("%Y-%m-%d").to_string(),
                    amount: format!("{:.2}", d.amount),
                    account: d.account.clone(),
                    kind: d.kind.to_string(),
                })
                .collect(),
            allowances: year
                .usage
                .iter()
                .map(|u| UsageData {
                    kind: u.label.to_string(),
                    allowance: format!("{:.2}", u.allowance),
                    contributions: format!("{:.2}", u.contributions),
                    remaining: format!("{:.2}", u.remaining),
                })
                .collect(),
        }
    }
}

fn format_gbp(amount: Decimal) -> String {
    format!("£{:.2}", amount)
}

fn format_gbp_signed(amount: Decimal) -> String {
    if amount < Decimal::ZERO {
        format!("-£{:.2}", amount.abs())
    } else {
        format!("£{:.2}", amount)
    }
}
