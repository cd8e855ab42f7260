//! Category chip matching for every vertical.

use crate::analyzer::categorizer::{categorize, PowerTag};
use crate::analyzer::equipment;
use crate::model::{Allowance, ConnectionType, Offer, OfferDetails};

/// Mobile plans at or below this monthly price count as `lavpris`.
pub const LOW_PRICE_LIMIT: f64 = 299.0;

const INSURANCE_KEYWORDS: &[(&str, &[&str])] = &[
    ("bolig", &["bolig", "hus", "innbo", "hjem", "villa", "hytte"]),
    ("kjoretoy", &["bil", "kjøretøy", "kjoretoy", "motorsykkel", "båt", "moped"]),
    ("person", &["person", "liv", "ulykke", "reise", "helse", "uføre", "barn"]),
    ("dyr_fritid", &["dyr", "hund", "katt", "hest", "fritid"]),
];

const LOAN_KEYWORDS: &[(&str, &[&str])] = &[
    ("forbrukslan", &["forbruk", "usikret", "privatlån"]),
    ("boliglan", &["bolig", "hus"]),
    ("refinansiering", &["refinans"]),
    ("billan", &["bil"]),
];

const TV_KEYWORDS: &[(&str, &[&str])] = &[
    ("standard", &["standard", "basis", "grunnpakke"]),
    ("streaming", &["stream", "strømming"]),
    ("sport", &["sport", "fotball"]),
    ("flexible", &["flex", "valgfri", "velg"]),
    ("cabin", &["hytte", "cabin"]),
    ("combo", &["combo", "kombi", "pakke med internett", "bredbånd"]),
    ("extras", &["ekstra", "tillegg", "premium"]),
];

/// Chip value → `service_type` for cleaning offers.
const CLEANING_SERVICE_TYPES: &[(&str, &str)] = &[
    ("bolig", "home"),
    ("kontor", "office"),
    ("storrengjoring", "deep"),
    ("fast_renhold", "regular"),
    ("flytterengjoring", "moving"),
    ("bedrift", "business"),
];

pub fn cleaning_service_type(chip: &str) -> Option<&'static str> {
    CLEANING_SERVICE_TYPES
        .iter()
        .find(|(c, _)| *c == chip)
        .map(|(_, service)| *service)
}

fn keyword_hit(table: &[(&str, &[&str])], chip: &str, text: &str) -> bool {
    let text = text.to_lowercase();
    table
        .iter()
        .find(|(id, _)| *id == chip)
        .is_some_and(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
}

/// Whether `offer` belongs to the category selected with `chip`.
///
/// Business chips outside power do not narrow the listing; they route the
/// visitor to the business lead form instead.
pub fn matches_category(offer: &Offer, chip: &str) -> bool {
    if chip.is_empty() || chip == "all" {
        return true;
    }
    let vertical = offer.vertical();
    if vertical != crate::model::Vertical::Power && chip == vertical.business_tag() {
        return true;
    }

    match &offer.details {
        OfferDetails::Power(_) => match PowerTag::parse(chip) {
            Some(selected) => categorize(offer).matches(selected),
            None => false,
        },
        OfferDetails::Security(alarm) => equipment::matches_chip(alarm, chip),
        OfferDetails::Mobile(mobile) => match chip {
            "lavpris" => mobile.monthly_price.is_some_and(|p| p <= LOW_PRICE_LIMIT),
            "familie" => {
                let name = offer.product_name.to_lowercase();
                name.contains("familie") || name.contains("family")
            }
            "ubegrenset" => mobile.data == Allowance::Unlimited,
            _ => false,
        },
        OfferDetails::Internet(internet) => match chip {
            "fiber" => internet.connection == ConnectionType::Fiber,
            "adsl" => internet.connection == ConnectionType::Adsl,
            "mobilt" => internet.connection == ConnectionType::Mobile,
            _ => false,
        },
        OfferDetails::Insurance(insurance) => {
            keyword_hit(INSURANCE_KEYWORDS, chip, &insurance.insurance_type)
                || keyword_hit(INSURANCE_KEYWORDS, chip, &offer.product_name)
        }
        OfferDetails::Loan(loan) => {
            keyword_hit(LOAN_KEYWORDS, chip, &loan.loan_type)
                || keyword_hit(LOAN_KEYWORDS, chip, &offer.product_name)
        }
        OfferDetails::Tv(_) => keyword_hit(TV_KEYWORDS, chip, &offer.product_name),
        OfferDetails::Handyman(service) => service.service_type.eq_ignore_ascii_case(chip),
        OfferDetails::Cleaning(service) => cleaning_service_type(chip)
            .is_some_and(|wanted| service.service_type.to_lowercase().contains(wanted)),
    }
}
