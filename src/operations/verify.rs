use crate::db::repository;
use crate::error::Result;
use crate::models::donation::{DATE_TIME_FORMAT, DonationRecord};
use regex::Regex;
use rusqlite::Connection;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("non-word pattern compiles"));

#[derive(Debug, Clone, PartialEq)]
pub enum VerificationStatus {
    Valid(DonationRecord),
    NotFound,
    Invalid,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Valid(_) => "valid",
            VerificationStatus::NotFound => "not_found",
            VerificationStatus::Invalid => "invalid",
        }
    }
}

pub fn is_donation_id_valid(donation: Option<&DonationRecord>, id: &str) -> bool {
    donation.is_some_and(|d| d.id == id)
}

pub fn verify_donation(conn: &Connection, id: &str) -> Result<VerificationStatus> {
    let id = id.trim();
    if id.is_empty() {
        return Ok(VerificationStatus::Invalid);
    }

    let donation = repository::get_donation_by_id(conn, id)?;
    let status = match donation {
        Some(d) if is_donation_id_valid(Some(&d), id) => VerificationStatus::Valid(d),
        _ => VerificationStatus::NotFound,
    };
    tracing::debug!(id, status = status.as_str(), "verified donation");
    Ok(status)
}

fn normalize_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let collapsed = WHITESPACE.replace_all(&lowered, " ");
    NON_WORD.replace_all(&collapsed, "").into_owned()
}

/// Stable `|`-joined digest input for a donation.
pub fn canonical_base_string(donation: &DonationRecord) -> String {
    [
        donation.id.clone(),
        normalize_name(&donation.donor_name),
        normalize_name(&donation.recipient_name),
        donation.amount.normalize().to_string(),
        donation.date.format(DATE_TIME_FORMAT).to_string(),
        donation.payment_method.as_str().to_string(),
        donation.category.as_str().to_string(),
    ]
    .join("|")
}
