use crate::db::repository;
use crate::error::{LedgerError, Result};
use crate::models::donation::{
    BeneficiaryKind, DonationRecord, OnBehalfOf, PaymentMethod, ZakatType,
};
use chrono::{Local, NaiveDateTime, Timelike};
use rusqlite::Connection;
use rust_decimal::Decimal;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 255;
const MAX_NOTES_LEN: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct NewDonation {
    pub donor_name: String,
    pub recipient_name: String,
    pub on_behalf_of: Vec<OnBehalfOf>,
    pub amount: String,
    pub zakat_type: String,
    pub payment_method: String,
    pub notes: Option<String>,
    pub donor_signature: Option<String>,
    pub recipient_signature: Option<String>,
}

pub(crate) struct DonationFields {
    pub donor_name: String,
    pub recipient_name: String,
    pub on_behalf_of: Vec<OnBehalfOf>,
    pub amount: Decimal,
    pub category: ZakatType,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

pub(crate) fn validate_fields(
    donor_name: &str,
    recipient_name: &str,
    on_behalf_of: &[OnBehalfOf],
    amount: &str,
    zakat_type: &str,
    payment_method: &str,
    notes: Option<&str>,
) -> Result<DonationFields> {
    let donor_name = required_name(donor_name, "Donor name")?;
    let recipient_name = required_name(recipient_name, "Recipient name")?;

    let on_behalf_of: Vec<OnBehalfOf> = on_behalf_of
        .iter()
        .filter(|entry| !entry.name.trim().is_empty())
        .map(|entry| OnBehalfOf {
            kind: entry.kind,
            name: entry.name.trim().to_string(),
        })
        .collect();
    if on_behalf_of.is_empty() {
        return Err(LedgerError::validation(
            "At least one on-behalf-of entry is required",
        ));
    }

    let amount = parse_amount(amount)?;
    let payment_method: PaymentMethod = payment_method.parse()?;

    let notes = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
        return Err(LedgerError::validation("Notes too long"));
    }

    Ok(DonationFields {
        donor_name,
        recipient_name,
        on_behalf_of,
        amount,
        category: ZakatType::from_raw(zakat_type),
        payment_method,
        notes,
    })
}

fn required_name(raw: &str, field: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(LedgerError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(LedgerError::validation(format!("{} too long", field)));
    }
    Ok(value.to_string())
}

pub(crate) fn required_signature(raw: Option<&str>, field: &str) -> Result<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LedgerError::validation(format!("{} signature is required", field)))
}

pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().replace('_', "");
    let amount = cleaned.parse::<Decimal>().map_err(|_| {
        LedgerError::validation(format!(
            "Invalid amount format {}. Please provide a valid decimal number.",
            raw.trim()
        ))
    })?;
    if amount <= Decimal::ZERO {
        return Err(LedgerError::validation("Amount must be greater than zero"));
    }
    Ok(amount)
}

/// Parses `kind:name` (a bare name means `self`).
pub fn parse_on_behalf_of(raw: &str) -> Result<OnBehalfOf> {
    let raw = raw.trim();
    let (kind, name) = match raw.split_once(':') {
        Some((kind, name)) => (kind.parse()?, name.trim()),
        None => (BeneficiaryKind::OwnSelf, raw),
    };
    if name.is_empty() {
        return Err(LedgerError::validation(format!(
            "Invalid on-behalf-of entry '{}'. Use kind:name.",
            raw
        )));
    }
    Ok(OnBehalfOf {
        kind,
        name: name.to_string(),
    })
}

pub fn parse_on_behalf_of_list(raw: &str) -> Result<Vec<OnBehalfOf>> {
    raw.split(';')
        .filter(|part| !part.trim().is_empty())
        .map(parse_on_behalf_of)
        .collect()
}

/// Validates a new entry and stamps it with a fresh id and the given time.
pub fn create_donation_at(input: &NewDonation, date: NaiveDateTime) -> Result<DonationRecord> {
    let fields = validate_fields(
        &input.donor_name,
        &input.recipient_name,
        &input.on_behalf_of,
        &input.amount,
        &input.zakat_type,
        &input.payment_method,
        input.notes.as_deref(),
    )?;
    let donor_signature = required_signature(input.donor_signature.as_deref(), "Donor")?;
    let recipient_signature = required_signature(input.recipient_signature.as_deref(), "Recipient")?;

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
        donor_signature: Some(donor_signature),
        recipient_signature: Some(recipient_signature),
    })
}

/// Timestamps are stored with whole-second precision.
pub(crate) fn now_to_second() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn create_donation(input: &NewDonation) -> Result<DonationRecord> {
    create_donation_at(input, now_to_second())
}

pub fn add_donation_to_db(conn: &Connection, input: &NewDonation) -> Result<DonationRecord> {
    let donation = create_donation(input)?;
    repository::add_donation(conn, &donation)?;
    Ok(donation)
}
