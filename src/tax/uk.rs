use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// UK Tax Year (runs 6 April to 5 April)
/// The year value represents the end year (e.g., 2025 = 2024/25 tax year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

/// Annual ISA subscription limits for one tax year.
///
/// `total` is the combined limit across both ISA kinds; before 2014/15 it
/// equals the stocks limit, from 2014/15 the three limits are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allowance {
    pub cash: Decimal,
    pub stocks: Decimal,
    pub total: Decimal,
}

impl TaxYear {
    /// Create a tax year from a date
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        // Tax year starts 6 April
        // If date is 6 April or later, it's in the tax year ending next April
        // If date is before 6 April, it's in the current tax year ending this April
        if date >= NaiveDate::from_ymd_opt(year, 4, 6).unwrap() {
            TaxYear(year + 1)
        } else {
            TaxYear(year)
        }
    }

    /// Display as "2024/25" format
    pub fn display(&self) -> String {
        format!("{}/{:02}", self.0 - 1, self.0 % 100)
    }

    /// Most recent tax year with a legislated ISA allowance.
    pub const fn latest_known() -> TaxYear {
        TaxYear(2026)
    }

    /// ISA subscription limits for this tax year, `None` for years outside
    /// the table (pre-ISA years and years not yet legislated).
    pub fn isa_allowance(&self) -> Option<Allowance> {
        let (cash, stocks, total) = match self.0 {
            // 1999/00 to 2007/08
            2000..=2008 => (dec!(3000.00), dec!(7000.00), dec!(7000.00)),
            // 2008/09 to 2009/10
            2009..=2010 => (dec!(3600.00), dec!(7200.00), dec!(7200.00)),
            2011 => (dec!(5100.00), dec!(10200.00), dec!(10200.00)),
            2012 => (dec!(5340.00), dec!(10680.00), dec!(10680.00)),
            2013 => (dec!(5640.00), dec!(11280.00), dec!(11280.00)),
            2014 => (dec!(5760.00), dec!(11520.00), dec!(11520.00)),
            // 2014/15: cash and stocks limits merged
            2015 => (dec!(15000.00), dec!(15000.00), dec!(15000.00)),
            2016..=2017 => (dec!(15240.00), dec!(15240.00), dec!(15240.00)),
            // 2017/18 to 2025/26: frozen at £20,000
            2018..=2026 => (dec!(20000.00), dec!(20000.00), dec!(20000.00)),
            _ => return None,
        };
        Some(Allowance {
            cash,
            stocks,
            total,
        })
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tax_year_from_date_before_april_6() {
        // 5 April 2024 is in 2023/24 tax year
        let date = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();
        assert_eq!(TaxYear::from_date(date), TaxYear(2024));
        assert_eq!(TaxYear::from_date(date).display(), "2023/24");
    }

    #[test]
    fn tax_year_from_date_on_april_6() {
        // 6 April 2024 is in 2024/25 tax year
        let date = NaiveDate::from_ymd_opt(2024, 4, 6).unwrap();
        assert_eq!(TaxYear::from_date(date), TaxYear(2025));
        assert_eq!(TaxYear::from_date(date).display(), "2024/25");
    }

    #[test]
    fn tax_year_from_date_january() {
        // 15 January 2024 is in 2023/24 tax year
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(TaxYear::from_date(date), TaxYear(2024));
    }

    #[test]
    fn tax_year_from_date_december() {
        // 31 December 2024 is in 2024/25 tax year
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(TaxYear::from_date(date), TaxYear(2025));
    }

    #[test]
    fn tax_year_display_pads_single_digit() {
        assert_eq!(TaxYear(2000).display(), "1999/00");
        assert_eq!(TaxYear(2008).display(), "2007/08");
        assert_eq!(TaxYear(2025).display(), "2024/25");
    }

    #[test]
    fn allowance_early_years_split_limits() {
        let a = TaxYear(2000).isa_allowance().unwrap();
        assert_eq!(a.cash, dec!(3000.00));
        assert_eq!(a.stocks, dec!(7000.00));
        assert_eq!(a.total, dec!(7000.00));
    }

    #[test]
    fn allowance_merged_from_2014_15() {
        let a = TaxYear(2015).isa_allowance().unwrap();
        assert_eq!(a.cash, a.stocks);
        assert_eq!(a.stocks, a.total);
        assert_eq!(a.total, dec!(15000.00));
    }

    #[test]
    fn allowance_current_years() {
        assert_eq!(TaxYear(2018).isa_allowance().unwrap().total, dec!(20000.00));
        assert_eq!(TaxYear(2026).isa_allowance().unwrap().total, dec!(20000.00));
    }

    #[test]
    fn allowance_outside_table() {
        assert_eq!(TaxYear(1999).isa_allowance(), None);
        assert_eq!(TaxYear(2027).isa_allowance(), None);
    }

    #[test]
    fn latest_known_has_an_entry() {
        assert!(TaxYear::latest_known().isa_allowance().is_some());
    }
}
