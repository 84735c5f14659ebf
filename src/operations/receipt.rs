use crate::format::format_currency;
use crate::models::donation::{DATE_TIME_FORMAT, DonationRecord};
use std::fmt::Write;

pub fn verify_url(base_url: &str, id: &str) -> String {
    format!("https://{}/verify/tx?id={}", base_url, id)
}

pub fn render_receipt(donation: &DonationRecord, base_url: &str) -> String {
    let mut out = String::new();
    let rule = "=".repeat(48);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:^48}", "BUKTI PENERIMAAN ZAKAT");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "{:<16}{}", "Receipt ID:", donation.id);
    let _ = writeln!(out, "{:<16}{}", "Date:", donation.date.format(DATE_TIME_FORMAT));
    let _ = writeln!(out, "{:<16}{}", "Donor:", donation.donor_name);
    let _ = writeln!(out, "{:<16}{}", "Recipient:", donation.recipient_name);
    let _ = writeln!(out, "{:<16}{}", "On behalf of:", donation.on_behalf_of_summary());
    let _ = writeln!(out, "{:<16}{}", "Zakat type:", donation.category.label());
    let _ = writeln!(out, "{:<16}{}", "Payment:", donation.payment_method.label());
    let _ = writeln!(out, "{:<16}{}", "Amount:", format_currency(donation.amount));
    if let Some(notes) = &donation.notes {
        let _ = writeln!(out, "{:<16}{}", "Notes:", notes);
    }
    let _ = writeln!(out, "{}", "-".repeat(48));
    let _ = writeln!(
        out,
        "Donor signature:     {}",
        if donation.donor_signature.is_some() { "signed" } else { "-" }
    );
    let _ = writeln!(
        out,
        "Recipient signature: {}",
        if donation.recipient_signature.is_some() { "signed" } else { "-" }
    );
    let _ = writeln!(out, "{}", "-".repeat(48));
    let _ = writeln!(out, "Verify: {}", verify_url(base_url, &donation.id));
    let _ = write!(out, "{}", rule);
    out
}
