use crate::db::repository;
use crate::error::{LedgerError, Result};
use rusqlite::Connection;

pub fn remove_donation_from_db(conn: &Connection, id_input: &str) -> Result<()> {
    let id = id_input.trim();
    if id.is_empty() {
        return Err(LedgerError::validation("Donation ID cannot be empty."));
    }
    repository::remove_donation(conn, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::establish_test_connection;
    use crate::models::donation::{DonationRecord, ZakatType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn test_remove_rejects_empty_id() {
        let conn = establish_test_connection().unwrap();
        let err = remove_donation_from_db(&conn, "  ").unwrap_err();
        assert_eq!(err.to_string(), "Donation ID cannot be empty.");
    }

    #[test]
    fn test_remove_trims_id() {
        let conn = establish_test_connection().unwrap();
        let donation = DonationRecord::new(
            "abc".to_string(),
            NaiveDate::from_ymd_opt(2024, 4, 10).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            "Ali Akbar".to_string(),
            "Panitia Zakat RT 05".to_string(),
            Decimal::new(35000, 0),
            ZakatType::Fitrah,
        );
        repository::add_donation(&conn, &donation).unwrap();

        remove_donation_from_db(&conn, " abc\n").unwrap();
        assert!(repository::get_all_donations(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_remove_unknown_id() {
        let conn = establish_test_connection().unwrap();
        let err = remove_donation_from_db(&conn, "nope").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
