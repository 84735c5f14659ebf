use crate::error::{LedgerError, Result};
use crate::models::donation::{DATE_TIME_FORMAT, DonationRecord, OnBehalfOf, ZakatType};
use chrono::{Days, NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use std::str::FromStr;

const SELECT_DONATION: &str = "SELECT id, date, donor_name, recipient_name, amount, payment_method, zakat_type, notes, donor_signature, recipient_signature FROM donations";

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn row_to_donation(row: &Row) -> rusqlite::Result<DonationRecord> {
    let date_str: String = row.get(1)?;
    let amount_str: String = row.get(4)?;
    let payment_str: String = row.get(5)?;
    let zakat_type_str: String = row.get(6)?;

    Ok(DonationRecord {
        id: row.get(0)?,
        date: NaiveDateTime::parse_from_str(&date_str, DATE_TIME_FORMAT)
            .map_err(|e| conversion_error(1, e))?,
        donor_name: row.get(2)?,
        recipient_name: row.get(3)?,
        on_behalf_of: Vec::new(),
        amount: Decimal::from_str(&amount_str).map_err(|e| conversion_error(4, e))?,
        payment_method: payment_str.parse().map_err(|e| conversion_error(5, e))?,
        category: ZakatType::from_raw(&zakat_type_str),
        notes: row.get(7)?,
        donor_signature: row.get(8)?,
        recipient_signature: row.get(9)?,
    })
}

fn load_beneficiaries(conn: &Connection, donations: &mut [DonationRecord]) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT kind, name FROM donation_beneficiaries WHERE donation_id = ?1 ORDER BY position ASC",
    )?;
    for donation in donations.iter_mut() {
        let rows = stmt.query_map([&donation.id], |row| {
            let kind_str: String = row.get(0)?;
            Ok(OnBehalfOf {
                kind: kind_str.parse().map_err(|e| conversion_error(0, e))?,
                name: row.get(1)?,
            })
        })?;
        donation.on_behalf_of = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    }
    Ok(())
}

fn query_donations(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<DonationRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let mut donations = stmt
        .query_map(params, row_to_donation)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    load_beneficiaries(conn, &mut donations)?;
    Ok(donations)
}

fn write_beneficiaries(conn: &Connection, donation: &DonationRecord) -> Result<()> {
    conn.execute(
        "DELETE FROM donation_beneficiaries WHERE donation_id = ?1",
        [&donation.id],
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO donation_beneficiaries (donation_id, position, kind, name) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for (position, entry) in donation.on_behalf_of.iter().enumerate() {
        stmt.execute(params![
            &donation.id,
            position as i64,
            entry.kind.as_str(),
            &entry.name
        ])?;
    }
    Ok(())
}

/// Inserts without opening a transaction, so callers can batch several rows.
pub fn insert_donation(conn: &Connection, donation: &DonationRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO donations (id, date, donor_name, recipient_name, amount, payment_method, zakat_type, notes, donor_signature, recipient_signature) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            &donation.id,
            donation.date.format(DATE_TIME_FORMAT).to_string(),
            &donation.donor_name,
            &donation.recipient_name,
            donation.amount.to_string(),
            donation.payment_method.as_str(),
            donation.category.as_str(),
            &donation.notes,
            &donation.donor_signature,
            &donation.recipient_signature,
        ],
    )?;
    write_beneficiaries(conn, donation)
}

pub fn add_donation(conn: &Connection, donation: &DonationRecord) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    insert_donation(&tx, donation)?;
    tx.commit()?;
    tracing::info!(id = %donation.id, category = %donation.category, "donation stored");
    Ok(())
}

pub fn get_all_donations(conn: &Connection) -> Result<Vec<DonationRecord>> {
    let donations = query_donations(
        conn,
        &format!("{} ORDER BY date DESC, id DESC", SELECT_DONATION),
        [],
    )?;
    tracing::debug!(count = donations.len(), "loaded donations");
    Ok(donations)
}

pub fn get_donation_by_id(conn: &Connection, id: &str) -> Result<Option<DonationRecord>> {
    let mut stmt = conn.prepare(&format!("{} WHERE id = ?1", SELECT_DONATION))?;
    let donation = stmt.query_row([id], row_to_donation).optional()?;
    match donation {
        Some(donation) => {
            let mut found = [donation];
            load_beneficiaries(conn, &mut found)?;
            let [donation] = found;
            Ok(Some(donation))
        }
        None => Ok(None),
    }
}

pub fn update_donation(conn: &Connection, donation: &DonationRecord) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    let rows_affected = tx.execute(
        "UPDATE donations SET donor_name = ?2, recipient_name = ?3, amount = ?4, payment_method = ?5, zakat_type = ?6, notes = ?7, donor_signature = ?8, recipient_signature = ?9 WHERE id = ?1",
        params![
            &donation.id,
            &donation.donor_name,
            &donation.recipient_name,
            donation.amount.to_string(),
            donation.payment_method.as_str(),
            donation.category.as_str(),
            &donation.notes,
            &donation.donor_signature,
            &donation.recipient_signature,
        ],
    )?;
    if rows_affected == 0 {
        return Err(LedgerError::NotFound(format!("Donation with ID {}", donation.id)));
    }
    write_beneficiaries(&tx, donation)?;
    tx.commit()?;
    tracing::info!(id = %donation.id, "donation updated");
    Ok(())
}

pub fn remove_donation(conn: &Connection, id: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM donation_beneficiaries WHERE donation_id = ?1", [id])?;
    let rows_affected = tx.execute("DELETE FROM donations WHERE id = ?1", [id])?;
    if rows_affected == 0 {
        return Err(LedgerError::NotFound(format!("Donation with ID {}", id)));
    }
    tx.commit()?;
    tracing::info!(id, "donation removed");
    Ok(())
}

pub fn search_by_category(conn: &Connection, category: ZakatType) -> Result<Vec<DonationRecord>> {
    query_donations(
        conn,
        &format!("{} WHERE zakat_type = ?1 ORDER BY date DESC, id DESC", SELECT_DONATION),
        [category.as_str()],
    )
}

/// Donations whose calendar date lies within the inclusive bounds, oldest first.
pub fn get_donations_in_range(
    conn: &Connection,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<DonationRecord>> {
    // Stored timestamps sort lexically, so the end bound is the start of the next day.
    let lower = start_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let upper = end_date
        .and_then(|d| d.checked_add_days(Days::new(1)))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "9999-12-31 23:59:60".to_string());

    let donations = query_donations(
        conn,
        &format!(
            "{} WHERE date >= ?1 AND date < ?2 ORDER BY date ASC, id ASC",
            SELECT_DONATION
        ),
        [lower, upper],
    )?;
    tracing::debug!(count = donations.len(), ?start_date, ?end_date, "loaded donations in range");
    Ok(donations)
}

pub fn get_recent_donations(conn: &Connection, limit: usize) -> Result<Vec<DonationRecord>> {
    query_donations(
        conn,
        &format!("{} ORDER BY date DESC, id DESC LIMIT ?1", SELECT_DONATION),
        [limit as i64],
    )
}
