// Core types: Vertical, Offer, Provider and the error enums
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A product category. Offers are only ever compared within one vertical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vertical {
    #[serde(rename = "mobil")]
    Mobile,
    #[serde(rename = "strom")]
    Power,
    #[serde(rename = "internett")]
    Internet,
    #[serde(rename = "forsikring")]
    Insurance,
    #[serde(rename = "lan")]
    Loan,
    #[serde(rename = "boligalarm")]
    Security,
    #[serde(rename = "tv-pakker")]
    Tv,
    #[serde(rename = "handverkere")]
    Handyman,
    #[serde(rename = "renhold")]
    Cleaning,
}

impl Vertical {
    pub const ALL: [Vertical; 9] = [
        Vertical::Mobile,
        Vertical::Power,
        Vertical::Internet,
        Vertical::Insurance,
        Vertical::Loan,
        Vertical::Security,
        Vertical::Tv,
        Vertical::Handyman,
        Vertical::Cleaning,
    ];

    /// Path segment used in page URLs (`/strom`, `/mobil`, ...).
    pub fn slug(self) -> &'static str {
        match self {
            Vertical::Mobile => "mobil",
            Vertical::Power => "strom",
            Vertical::Internet => "internett",
            Vertical::Insurance => "forsikring",
            Vertical::Loan => "lan",
            Vertical::Security => "boligalarm",
            Vertical::Tv => "tv-pakker",
            Vertical::Handyman => "handverkere",
            Vertical::Cleaning => "renhold",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.slug() == slug)
    }

    /// Category chip that switches the page into business mode.
    pub fn business_tag(self) -> &'static str {
        match self {
            Vertical::Power => "business",
            _ => "bedrift",
        }
    }

    /// Chip values accepted from the `type` query parameter.
    /// Power additionally accepts `fixed-{n}` for the known fixed terms.
    pub fn category_tags(self) -> &'static [&'static str] {
        match self {
            Vertical::Mobile => &["lavpris", "familie", "ubegrenset", "bedrift"],
            Vertical::Power => &[
                "spot",
                "fixed",
                "variable",
                "green",
                "residential",
                "cabin",
                "business",
            ],
            Vertical::Internet => &["fiber", "adsl", "mobilt", "bedrift"],
            Vertical::Insurance => &["bolig", "kjoretoy", "person", "dyr_fritid", "bedrift"],
            Vertical::Loan => &["forbrukslan", "boliglan", "refinansiering", "billan", "bedrift"],
            Vertical::Security => &[
                "innbrudd", "brann", "vann", "kamera", "smarthus", "smartlås", "bedrift",
            ],
            Vertical::Tv => &[
                "standard",
                "streaming",
                "sport",
                "flexible",
                "cabin",
                "combo",
                "extras",
                "bedrift",
            ],
            Vertical::Handyman => &["renovation", "electrical", "plumbing", "painting", "bedrift"],
            Vertical::Cleaning => &[
                "bolig",
                "kontor",
                "storrengjoring",
                "fast_renhold",
                "flytterengjoring",
                "bedrift",
            ],
        }
    }

    /// Verticals where the listing is a price comparison. Offers without a
    /// usable price are never shown for these.
    pub fn is_price_based(self) -> bool {
        matches!(
            self,
            Vertical::Mobile
                | Vertical::Power
                | Vertical::Internet
                | Vertical::Insurance
                | Vertical::Tv
        )
    }
}

impl fmt::Display for Vertical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Record identity. Unique within one fetch result only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OfferId {
    Number(i64),
    Text(String),
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OfferId::Number(n) => write!(f, "{}", n),
            OfferId::Text(s) => f.write_str(s),
        }
    }
}

pub const MB_PER_GB: f64 = 1024.0;

/// Data, minutes or SMS included in a plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Allowance {
    Unlimited,
    Limited(f64),
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: OfferId,
    pub provider: String,
    pub product_name: String,
    pub logo_url: Option<String>,
    pub url: Option<String>,
    pub details: OfferDetails,
}

impl Offer {
    pub fn vertical(&self) -> Vertical {
        match &self.details {
            OfferDetails::Mobile(_) => Vertical::Mobile,
            OfferDetails::Power(_) => Vertical::Power,
            OfferDetails::Internet(_) => Vertical::Internet,
            OfferDetails::Insurance(_) => Vertical::Insurance,
            OfferDetails::Loan(_) => Vertical::Loan,
            OfferDetails::Security(_) => Vertical::Security,
            OfferDetails::Tv(_) => Vertical::Tv,
            OfferDetails::Handyman(_) => Vertical::Handyman,
            OfferDetails::Cleaning(_) => Vertical::Cleaning,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OfferDetails {
    Mobile(MobileOffer),
    Power(PowerOffer),
    Internet(InternetOffer),
    Insurance(InsuranceOffer),
    Loan(LoanOffer),
    Security(SecurityOffer),
    Tv(TvOffer),
    Handyman(ServiceOffer),
    Cleaning(ServiceOffer),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MobileOffer {
    pub monthly_price: Option<f64>,
    /// Data in MB.
    pub data: Allowance,
    pub minutes: Allowance,
    pub sms: Allowance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PowerOffer {
    /// øre/kWh
    pub unit_price: Option<f64>,
    pub price_unit: String,
    pub contract_length: String,
    pub municipality: String,
    /// kr per month, shown next to the price but not part of the cost formula
    pub additional_fees: Option<f64>,
    /// øre/kWh including markup; used when `unit_price` is missing or zero
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionType {
    Fiber,
    Adsl,
    Mobile,
    Other,
}

impl ConnectionType {
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("fiber") {
            ConnectionType::Fiber
        } else if label.contains("adsl") || label.contains("dsl") {
            ConnectionType::Adsl
        } else if label.contains("mobil") || label.contains("4g") || label.contains("5g") {
            ConnectionType::Mobile
        } else {
            ConnectionType::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternetOffer {
    pub monthly_price: Option<f64>,
    /// Mbit/s downstream
    pub speed_mbps: Option<f64>,
    pub connection: ConnectionType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsuranceOffer {
    pub monthly_premium: Option<f64>,
    pub insurance_type: String,
    pub coverage_amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoanOffer {
    /// Raw percentage as delivered, e.g. `"12,4 %"`.
    pub effective_rate: Option<String>,
    pub loan_type: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecurityOffer {
    pub monthly_price: Option<f64>,
    pub setup_fee: Option<f64>,
    pub equipment: Vec<String>,
    pub smart_features: Vec<String>,
    pub monitoring_24_7: bool,
    pub app_control: bool,
    pub response_service: Option<String>,
    pub installation_included: bool,
    pub installation_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TvOffer {
    pub monthly_price: Option<f64>,
    pub channels_count: Option<u32>,
}

/// Handyman and cleaning offers; priced on request.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceOffer {
    pub service_type: String,
    pub hourly_rate: Option<f64>,
    pub certified: Option<bool>,
    pub equipment_included: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: OfferId,
    pub name: String,
    pub logo_url: Option<String>,
    pub vertical: Vertical,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data store responded with status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("request timed out")]
    Timeout,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("unreadable rows: {0}")]
    Parse(#[from] ParserError),
}

impl FetchError {
    /// Sorts reqwest's timeout errors into `Timeout`.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Http(e)
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("row is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("malformed row: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadField {
    Name,
    Phone,
    Email,
    Service,
    Provider,
    OrgNumber,
    Consent,
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LeadField::Name => "navn",
            LeadField::Phone => "telefon",
            LeadField::Email => "epost",
            LeadField::Service => "tjeneste",
            LeadField::Provider => "leverandor",
            LeadField::OrgNumber => "organisasjonsnummer",
            LeadField::Consent => "samtykke",
        };
        f.write_str(name)
    }
}

/// A lead form field that failed sanitization. Shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: LeadField,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: LeadField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("lead rejected: {0}")]
    Invalid(#[from] ValidationError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("lead endpoint responded with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("lead endpoint unreachable")]
    Unreachable,
}
