use crate::error::LedgerError;
use crate::models::donation::ZakatType;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for Granularity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Granularity::Daily),
            "weekly" | "week" => Ok(Granularity::Weekly),
            "monthly" | "month" => Ok(Granularity::Monthly),
            "yearly" | "year" => Ok(Granularity::Yearly),
            _ => Err(LedgerError::validation(format!(
                "Invalid period '{}'. Use daily, weekly, monthly or yearly.",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelLocale {
    #[default]
    English,
    Indonesian,
}

impl LabelLocale {
    const ENGLISH_MONTHS: [&'static str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December",
    ];
    const INDONESIAN_MONTHS: [&'static str; 12] = [
        "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
        "Oktober", "November", "Desember",
    ];

    /// `month` is 1-based.
    pub fn month_name(self, month: u32) -> &'static str {
        let names = match self {
            LabelLocale::English => &Self::ENGLISH_MONTHS,
            LabelLocale::Indonesian => &Self::INDONESIAN_MONTHS,
        };
        names[(month.clamp(1, 12) - 1) as usize]
    }

    pub fn week_word(self) -> &'static str {
        match self {
            LabelLocale::English => "Week",
            LabelLocale::Indonesian => "Minggu",
        }
    }
}

impl FromStr for LabelLocale {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "english" => Ok(LabelLocale::English),
            "id" | "id-id" | "indonesian" => Ok(LabelLocale::Indonesian),
            other => Err(LedgerError::Config(format!("unsupported locale '{}'", other))),
        }
    }
}

/// Sortable bucket identity. All keys produced by one aggregation share a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Day { year: i32, month: u32, day: u32 },
    Week { year: i32, week: u32 },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

/// Inclusive calendar-date bounds; either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryAmounts {
    pub fitrah: Decimal,
    pub mal: Decimal,
    pub infak: Decimal,
    pub other: Decimal,
}

impl CategoryAmounts {
    pub fn get(&self, category: ZakatType) -> Decimal {
        match category {
            ZakatType::Fitrah => self.fitrah,
            ZakatType::Mal => self.mal,
            ZakatType::Infak => self.infak,
            ZakatType::Other => self.other,
        }
    }

    pub fn add(&mut self, category: ZakatType, amount: Decimal) {
        let slot = match category {
            ZakatType::Fitrah => &mut self.fitrah,
            ZakatType::Mal => &mut self.mal,
            ZakatType::Infak => &mut self.infak,
            ZakatType::Other => &mut self.other,
        };
        *slot += amount;
    }

    pub fn sum(&self) -> Decimal {
        self.fitrah + self.mal + self.infak + self.other
    }

    pub fn iter(&self) -> impl Iterator<Item = (ZakatType, Decimal)> + '_ {
        ZakatType::ALL.into_iter().map(|category| (category, self.get(category)))
    }
}

/// One report row. `total` always equals `amount_by_category.sum()`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodSummary {
    pub key: PeriodKey,
    pub period_label: String,
    pub amount_by_category: CategoryAmounts,
    pub total: Decimal,
    pub transaction_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_amounts_sum_matches_parts() {
        let mut amounts = CategoryAmounts::default();
        amounts.add(ZakatType::Fitrah, Decimal::new(100, 0));
        amounts.add(ZakatType::Other, Decimal::new(2550, 2));
        amounts.add(ZakatType::Fitrah, Decimal::new(5, 0));

        assert_eq!(amounts.get(ZakatType::Fitrah), Decimal::new(105, 0));
        assert_eq!(amounts.get(ZakatType::Mal), Decimal::ZERO);
        assert_eq!(amounts.sum(), Decimal::new(13050, 2));
        assert_eq!(amounts.iter().count(), 4);
    }

    #[test]
    fn test_period_keys_order_numerically() {
        let week9 = PeriodKey::Week { year: 2024, week: 9 };
        let week10 = PeriodKey::Week { year: 2024, week: 10 };
        let next_year = PeriodKey::Week { year: 2025, week: 1 };
        assert!(week9 < week10);
        assert!(week10 < next_year);
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let range = DateRange::new(Some(start), Some(end));

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(DateRange::unbounded().contains(start));
    }

    #[test]
    fn test_locale_parsing() {
        assert_eq!("id".parse::<LabelLocale>().unwrap(), LabelLocale::Indonesian);
        assert_eq!("EN".parse::<LabelLocale>().unwrap(), LabelLocale::English);
        assert!("fr".parse::<LabelLocale>().is_err());
        assert_eq!(LabelLocale::Indonesian.month_name(3), "Maret");
    }
}
