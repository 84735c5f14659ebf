use crate::db::repository;
use crate::error::Result;
use crate::models::donation::{DonationRecord, ZakatType};
use rusqlite::Connection;

pub fn search_donations_by_category<'a>(
    category: &str,
    donations: &'a [DonationRecord],
) -> Vec<&'a DonationRecord> {
    let category = ZakatType::from_raw(category);
    donations
        .iter()
        .filter(|donation| donation.category == category)
        .collect()
}

pub fn search_donations_by_category_db(
    conn: &Connection,
    category: &str,
) -> Result<Vec<DonationRecord>> {
    repository::search_by_category(conn, ZakatType::from_raw(category))
}
