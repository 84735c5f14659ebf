use super::add::validate_fields;
use crate::db::repository;
use crate::error::{LedgerError, Result};
use crate::models::donation::{DonationRecord, OnBehalfOf};
use rusqlite::Connection;

/// Edited donation fields. Type, payment method and signatures left as `None` keep the stored ones.
#[derive(Debug, Clone, Default)]
pub struct DonationUpdate {
    pub donor_name: String,
    pub recipient_name: String,
    pub on_behalf_of: Vec<OnBehalfOf>,
    pub amount: String,
    pub zakat_type: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub donor_signature: Option<String>,
    pub recipient_signature: Option<String>,
}

/// Applies `update` to `existing`; id and date never change.
pub fn apply_update(existing: &DonationRecord, update: &DonationUpdate) -> Result<DonationRecord> {
    let fields = validate_fields(
        &update.donor_name,
        &update.recipient_name,
        &update.on_behalf_of,
        &update.amount,
        update
            .zakat_type
            .as_deref()
            .unwrap_or(existing.category.as_str()),
        update
            .payment_method
            .as_deref()
            .unwrap_or(existing.payment_method.as_str()),
        update.notes.as_deref(),
    )?;

    let keep_or_replace = |replacement: &Option<String>, current: &Option<String>| {
        replacement
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| current.clone())
    };

    Ok(DonationRecord {
        id: existing.id.clone(),
        donor_name: fields.donor_name,
        recipient_name: fields.recipient_name,
        on_behalf_of: fields.on_behalf_of,
        amount: fields.amount,
        date: existing.date,
        payment_method: fields.payment_method,
        category: fields.category,
        notes: fields.notes,
        donor_signature: keep_or_replace(&update.donor_signature, &existing.donor_signature),
        recipient_signature: keep_or_replace(
            &update.recipient_signature,
            &existing.recipient_signature,
        ),
    })
}

pub fn update_donation_in_db(
    conn: &Connection,
    id: &str,
    update: &DonationUpdate,
) -> Result<DonationRecord> {
    let id = id.trim();
    let existing = repository::get_donation_by_id(conn, id)?
        .ok_or_else(|| LedgerError::NotFound(format!("Donation with ID {}", id)))?;
    let updated = apply_update(&existing, update)?;
    repository::update_donation(conn, &updated)?;
    Ok(updated)
}
