use crate::db::repository;
use crate::error::Result;
use crate::models::donation::{DonationRecord, ZakatType};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub const DEFAULT_RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryStat {
    pub total: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonationStats {
    pub by_category: BTreeMap<ZakatType, CategoryStat>,
    pub total_amount: Decimal,
    pub total_count: usize,
}

impl DonationStats {
    pub fn get(&self, category: ZakatType) -> CategoryStat {
        self.by_category.get(&category).copied().unwrap_or_default()
    }
}

pub fn donation_stats<'a>(donations: impl IntoIterator<Item = &'a DonationRecord>) -> DonationStats {
    let mut by_category: BTreeMap<ZakatType, CategoryStat> = ZakatType::ALL
        .into_iter()
        .map(|category| (category, CategoryStat::default()))
        .collect();

    let mut total_count = 0;
    for donation in donations {
        total_count += 1;
        let stat = by_category.entry(donation.category).or_default();
        stat.total += donation.amount;
        stat.count += 1;
    }

    DonationStats {
        total_amount: by_category.values().map(|s| s.total).sum(),
        total_count,
        by_category,
    }
}

pub fn load_stats(conn: &Connection) -> Result<DonationStats> {
    let donations = repository::get_all_donations(conn)?;
    Ok(donation_stats(&donations))
}

/// Newest first. A zero limit falls back to the dashboard default.
pub fn recent_donations(conn: &Connection, limit: usize) -> Result<Vec<DonationRecord>> {
    let limit = if limit == 0 { DEFAULT_RECENT_LIMIT } else { limit };
    repository::get_recent_donations(conn, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use chrono::NaiveDate;

    fn donation(id: &str, day: u32, amount: i64, category: ZakatType) -> DonationRecord {
        DonationRecord::new(
            id.to_string(),
            NaiveDate::from_ymd_opt(2024, 4, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            "Donor".to_string(),
            "Recipient".to_string(),
            Decimal::new(amount, 0),
            category,
        )
    }

    #[test]
    fn test_donation_stats_sums_and_counts() {
        let donations = vec![
            donation("a", 1, 45_000, ZakatType::Fitrah),
            donation("b", 2, 45_000, ZakatType::Fitrah),
            donation("c", 3, 1_000_000, ZakatType::Mal),
        ];

        let stats = donation_stats(&donations);
        assert_eq!(stats.get(ZakatType::Fitrah), CategoryStat { total: Decimal::new(90_000, 0), count: 2 });
        assert_eq!(stats.get(ZakatType::Mal).count, 1);
        assert_eq!(stats.get(ZakatType::Infak), CategoryStat::default());
        assert_eq!(stats.by_category.len(), 4);
        assert_eq!(stats.total_amount, Decimal::new(1_090_000, 0));
        assert_eq!(stats.total_count, 3);
    }

    #[test]
    fn test_donation_stats_empty() {
        let empty: Vec<DonationRecord> = Vec::new();
        let stats = donation_stats(&empty);
        assert_eq!(stats.total_amount, Decimal::ZERO);
        assert_eq!(stats.total_count, 0);
    }

    #[test]
    fn test_recent_donations_newest_first_with_default_limit() {
        let conn = establish_test_connection().unwrap();
        for day in 1..=7 {
            repository::add_donation(&conn, &donation(&format!("d{}", day), day, 1000, ZakatType::Infak))
                .unwrap();
        }

        let recent = recent_donations(&conn, 0).unwrap();
        assert_eq!(recent.len(), DEFAULT_RECENT_LIMIT);
        assert_eq!(recent[0].id, "d7");

        let two = recent_donations(&conn, 2).unwrap();
        assert_eq!(two.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["d7", "d6"]);

        assert_eq!(load_stats(&conn).unwrap().get(ZakatType::Infak).count, 7);
    }
}
