use crate::error::LedgerError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Storage and display format for donation timestamps.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Donation category. Anything the ledger does not recognise is booked as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZakatType {
    Fitrah,
    Mal,
    Infak,
    Other,
}

impl ZakatType {
    pub const ALL: [ZakatType; 4] = [
        ZakatType::Fitrah,
        ZakatType::Mal,
        ZakatType::Infak,
        ZakatType::Other,
    ];

    /// Case-insensitive parse that never fails.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "fitrah" => ZakatType::Fitrah,
            "mal" => ZakatType::Mal,
            "infak" => ZakatType::Infak,
            _ => ZakatType::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ZakatType::Fitrah => "fitrah",
            ZakatType::Mal => "mal",
            ZakatType::Infak => "infak",
            ZakatType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ZakatType::Fitrah => "Fitrah",
            ZakatType::Mal => "Mal",
            ZakatType::Infak => "Infak",
            ZakatType::Other => "Other",
        }
    }
}

impl fmt::Display for ZakatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    EWallet,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::EWallet => "e_wallet",
            PaymentMethod::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::EWallet => "E-Wallet",
            PaymentMethod::Other => "Other",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            "e_wallet" | "ewallet" => Ok(PaymentMethod::EWallet),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(LedgerError::validation(format!(
                "Invalid payment method '{}'. Use cash, bank_transfer, e_wallet or other.",
                s.trim()
            ))),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeneficiaryKind {
    OwnSelf,
    Family,
    Badal,
    Other,
}

impl BeneficiaryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BeneficiaryKind::OwnSelf => "self",
            BeneficiaryKind::Family => "family",
            BeneficiaryKind::Badal => "badal",
            BeneficiaryKind::Other => "other",
        }
    }
}

impl FromStr for BeneficiaryKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "self" => Ok(BeneficiaryKind::OwnSelf),
            "family" => Ok(BeneficiaryKind::Family),
            "badal" => Ok(BeneficiaryKind::Badal),
            "other" => Ok(BeneficiaryKind::Other),
            _ => Err(LedgerError::validation(format!(
                "Invalid on-behalf-of type '{}'. Use self, family, badal or other.",
                s.trim()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnBehalfOf {
    pub kind: BeneficiaryKind,
    pub name: String,
}

impl fmt::Display for OnBehalfOf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DonationRecord {
    pub id: String,
    pub donor_name: String,
    pub recipient_name: String,
    pub on_behalf_of: Vec<OnBehalfOf>,
    pub amount: Decimal,
    pub date: NaiveDateTime,
    pub payment_method: PaymentMethod,
    pub category: ZakatType,
    pub notes: Option<String>,
    pub donor_signature: Option<String>,
    pub recipient_signature: Option<String>,
}

impl DonationRecord {
    /// Minimal record used by importers and tests; optional fields start empty.
    pub fn new(
        id: String,
        date: NaiveDateTime,
        donor_name: String,
        recipient_name: String,
        amount: Decimal,
        category: ZakatType,
    ) -> Self {
        Self {
            id,
            donor_name,
            recipient_name,
            on_behalf_of: Vec::new(),
            amount,
            date,
            payment_method: PaymentMethod::Cash,
            category,
            notes: None,
            donor_signature: None,
            recipient_signature: None,
        }
    }

    pub fn on_behalf_of_summary(&self) -> String {
        self.on_behalf_of
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
