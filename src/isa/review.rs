//! Per-tax-year aggregation of deposits against the allowance table.

use super::classify::IsaKind;
use super::deposits::Deposit;
use crate::tax::TaxYear;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// One line of the allowance summary: a kind (or the combined total)
/// compared against its annual limit. `remaining` goes negative on
/// over-contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub label: &'static str,
    pub allowance: Decimal,
    pub contributions: Decimal,
    pub remaining: Decimal,
}

/// Review of a single tax year: its deposits in report order and the
/// Cash / S&S / Total usage lines.
#[derive(Debug)]
pub struct YearReview {
    pub year: TaxYear,
    /// True when the year had no allowance-table entry and the latest known
    /// year's figures were substituted.
    pub estimated: bool,
    pub deposits: Vec<Deposit>,
    pub usage: [Usage; 3],
}

/// Aggregate deposits into per-year reviews, ordered by year.
///
/// The tax year containing `as_of` is always present, even with no
/// deposits, so the current year's remaining allowance is always reported.
pub fn review(deposits: Vec<Deposit>, as_of: NaiveDate) -> Vec<YearReview> {
    let mut by_year: BTreeMap<TaxYear, Vec<Deposit>> = BTreeMap::new();
    for deposit in deposits {
        by_year.entry(deposit.year).or_default().push(deposit);
    }
    by_year.entry(TaxYear::from_date(as_of)).or_default();

    by_year
        .into_iter()
        .map(|(year, deposits)| review_year(year, deposits))
        .collect()
}

fn review_year(year: TaxYear, mut deposits: Vec<Deposit>) -> YearReview {
    deposits.sort();

    let (allowance, estimated) = match year.isa_allowance() {
        Some(allowance) => (allowance, false),
        None => {
            let latest = TaxYear::latest_known();
            log::warn!("no ISA allowance known for {year}, estimating with {latest} figures");
            let allowance = latest
                .isa_allowance()
                .expect("latest known tax year has a table entry");
            (allowance, true)
        }
    };

    let kind_total = |kind: IsaKind| -> Decimal {
        deposits
            .iter()
            .filter(|d| d.kind == kind)
            .map(|d| d.amount)
            .sum()
    };
    let cash = kind_total(IsaKind::Cash);
    let stocks = kind_total(IsaKind::Stocks);
    let total = cash + stocks;

    let usage = [
        Usage {
            label: IsaKind::Cash.label(),
            allowance: allowance.cash,
            contributions: cash,
            remaining: allowance.cash - cash,
        },
        Usage {
            label: IsaKind::Stocks.label(),
            allowance: allowance.stocks,
            contributions: stocks,
            remaining: allowance.stocks - stocks,
        },
        Usage {
            label: "Total",
            allowance: allowance.total,
            contributions: total,
            remaining: allowance.total - total,
        },
    ];

    YearReview {
        year,
        estimated,
        deposits,
        usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn deposit(y: i32, m: u32, d: u32, account: &str, amount: Decimal, kind: IsaKind) -> Deposit {
        let date = date(y, m, d);
        Deposit {
            year: TaxYear::from_date(date),
            date,
            account: account.to_string(),
            amount,
            kind,
        }
    }

    #[test]
    fn contributions_are_totalled_per_kind_and_overall() {
        let deposits = vec![
            deposit(2024, 5, 1, "Assets:Nutmeg", dec!(5000.00), IsaKind::Cash),
            deposit(2024, 6, 1, "Assets:Vanguard", dec!(3000.00), IsaKind::Stocks),
            deposit(2024, 7, 1, "Assets:Nutmeg", dec!(1000.00), IsaKind::Cash),
        ];
        let years = review(deposits, date(2024, 12, 31));

        assert_eq!(years.len(), 1);
        let year = &years[0];
        assert_eq!(year.year, TaxYear(2025));
        assert!(!year.estimated);

        let [cash, stocks, total] = &year.usage;
        assert_eq!(cash.contributions, dec!(6000.00));
        assert_eq!(stocks.contributions, dec!(3000.00));
        assert_eq!(total.contributions, dec!(9000.00));
        assert_eq!(
            cash.contributions + stocks.contributions,
            total.contributions
        );
        assert_eq!(cash.remaining, dec!(14000.00));
        assert_eq!(total.remaining, dec!(11000.00));
    }

    #[test]
    fn remaining_goes_negative_on_over_contribution() {
        let deposits = vec![deposit(
            2024, 5, 1,
            "Assets:Nutmeg",
            dec!(25000.00),
            IsaKind::Cash,
        )];
        let years = review(deposits, date(2024, 12, 31));

        let [cash, _, total] = &years[0].usage;
        assert_eq!(cash.remaining, dec!(-5000.00));
        assert_eq!(total.remaining, dec!(-5000.00));
    }

    #[test]
    fn as_of_year_is_reported_even_without_deposits() {
        let years = review(Vec::new(), date(2024, 12, 31));

        assert_eq!(years.len(), 1);
        let year = &years[0];
        assert_eq!(year.year, TaxYear(2025));
        assert!(year.deposits.is_empty());
        assert_eq!(year.usage[2].contributions, Decimal::ZERO);
        assert_eq!(year.usage[2].remaining, dec!(20000.00));
    }

    #[test]
    fn years_are_ordered_and_deposits_sorted_within_a_year() {
        let deposits = vec![
            deposit(2024, 5, 2, "Assets:Vanguard", dec!(200.00), IsaKind::Stocks),
            deposit(2023, 5, 1, "Assets:Nutmeg", dec!(100.00), IsaKind::Cash),
            deposit(2024, 5, 1, "Assets:Nutmeg", dec!(300.00), IsaKind::Cash),
        ];
        let years = review(deposits, date(2024, 12, 31));

        let labels: Vec<String> = years.iter().map(|y| y.year.display()).collect();
        assert_eq!(labels, vec!["2023/24", "2024/25"]);

        let dates: Vec<NaiveDate> = years[1].deposits.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(2024, 5, 1), date(2024, 5, 2)]);
    }

    #[test]
    fn unknown_year_falls_back_to_latest_allowance() {
        let deposits = vec![deposit(
            2031, 5, 1,
            "Assets:Nutmeg",
            dec!(100.00),
            IsaKind::Cash,
        )];
        let years = review(deposits, date(2031, 5, 1));

        assert_eq!(years.len(), 1);
        let year = &years[0];
        assert!(year.estimated);
        assert_eq!(
            year.usage[2].allowance,
            TaxYear::latest_known().isa_allowance().unwrap().total
        );
    }
}
