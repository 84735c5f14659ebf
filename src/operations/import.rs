use super::add::{parse_on_behalf_of_list, validate_fields};
use crate::db::repository;
use crate::error::{LedgerError, Result};
use crate::models::donation::{DATE_TIME_FORMAT, DonationRecord};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::fs::File;
use std::path::Path;
use uuid::Uuid;

const COLUMNS: usize = 8;

#[derive(Debug, Clone, Copy)]
pub enum ImportFormat {
    Csv,
}

/// Imports every row or none of them.
pub fn import_donations_to_db(
    conn: &Connection,
    format: ImportFormat,
    path: &Path,
) -> Result<usize> {
    let donations = match format {
        ImportFormat::Csv => import_csv(path)?,
    };

    let tx = conn.unchecked_transaction()?;
    for donation in &donations {
        repository::insert_donation(&tx, donation)?;
    }
    tx.commit()?;

    tracing::info!(count = donations.len(), path = %path.display(), "imported donations");
    Ok(donations.len())
}

fn import_csv(path: &Path) -> Result<Vec<DonationRecord>> {
    let file = File::open(path).map_err(|e| {
        LedgerError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to open file '{}': {}", path.display(), e),
        ))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let mut donations = Vec::new();

    for (line_index, result) in reader.records().enumerate() {
        let line = line_index + 1;
        let record = result.map_err(|e| LedgerError::Parse {
            line,
            message: format!("CSV parse error: {}", e),
        })?;

        if record.len() != COLUMNS {
            return Err(LedgerError::Parse {
                line,
                message: format!(
                    "Invalid number of columns: expected {}, got {}",
                    COLUMNS,
                    record.len()
                ),
            });
        }

        let field = |i: usize| record.get(i).unwrap_or("");
        let donation = parse_row(
            field(0),
            field(1),
            field(2),
            field(3),
            field(4),
            field(5),
            field(6),
            field(7),
        )
        .map_err(|e| LedgerError::Parse {
            line,
            message: e.to_string(),
        })?;

        donations.push(donation);
    }

    Ok(donations)
}

#[allow(clippy::too_many_arguments)]
fn parse_row(
    date: &str,
    donor: &str,
    recipient: &str,
    on_behalf_of: &str,
    amount: &str,
    zakat_type: &str,
    payment_method: &str,
    notes: &str,
) -> Result<DonationRecord> {
    let date = parse_date(date)?;
    let on_behalf_of = parse_on_behalf_of_list(on_behalf_of)?;
    let fields = validate_fields(
        donor,
        recipient,
        &on_behalf_of,
        amount,
        zakat_type,
        payment_method,
        Some(notes),
    )?;

    Ok(DonationRecord {
        id: Uuid::new_v4().to_string(),
        donor_name: fields.donor_name,
        recipient_name: fields.recipient_name,
        on_behalf_of: fields.on_behalf_of,
        amount: fields.amount,
        date,
        payment_method: fields.payment_method,
        category: fields.category,
        notes: fields.notes,
        donor_signature: None,
        recipient_signature: None,
    })
}

/// Accepts a full timestamp or a bare date (midnight).
fn parse_date(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATE_TIME_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(|date| date.and_time(chrono::NaiveTime::MIN))
        })
        .map_err(|_| {
            LedgerError::validation(format!(
                "Invalid date format '{}'. Use YYYY-MM-DD or YYYY-MM-DD HH:MM:SS.",
                raw
            ))
        })
}
