// One-line offer summaries for the log output
use crate::analyzer::categorizer::categorize;
use crate::analyzer::equipment::{
    PriceCategory, ServiceType, categorize_equipment, price_category, service_type,
};
use crate::analyzer::pricing::{display_price, has_valid_pricing, monthly_cost};
use crate::model::{Allowance, MB_PER_GB, Offer, OfferDetails, SecurityOffer};
use crate::normalizer::display_provider_name;

fn kr(amount: Option<f64>, unit: &str) -> String {
    match amount {
        Some(a) => format!("{:.0} kr{}", a, unit),
        None => "pris på forespørsel".to_string(),
    }
}

fn data(allowance: Allowance) -> String {
    match allowance {
        Allowance::Unlimited => "ubegrenset data".to_string(),
        Allowance::Limited(mb) => format!("{} GB", (mb / MB_PER_GB * 10.0).round() / 10.0),
        Allowance::Unknown => "ukjent data".to_string(),
    }
}

/// Installation terms: included, or the one-off setup fee.
fn installation(alarm: &SecurityOffer) -> Option<String> {
    let terms = if alarm.installation_included {
        "installasjon inkludert".to_string()
    } else {
        let fee = alarm.setup_fee.filter(|fee| *fee > 0.0)?;
        format!("etablering {:.0} kr", fee)
    };
    Some(match alarm.installation_type.as_deref() {
        Some(kind) => format!("{} ({})", terms, kind),
        None => terms,
    })
}

/// Provider, product and the figures a comparison card leads with.
pub fn summarize(offer: &Offer, annual_consumption_kwh: f64) -> String {
    let facts = match &offer.details {
        OfferDetails::Power(power) => {
            if has_valid_pricing(power) {
                format!(
                    "{:.2} øre/kWh, {} kr/mnd ved {} kWh [{}]",
                    display_price(power),
                    monthly_cost(power, annual_consumption_kwh),
                    annual_consumption_kwh,
                    categorize(offer)
                )
            } else {
                "mangler pris".to_string()
            }
        }
        OfferDetails::Mobile(mobile) => {
            format!("{}, {}", kr(mobile.monthly_price, "/mnd"), data(mobile.data))
        }
        OfferDetails::Internet(internet) => match internet.speed_mbps {
            Some(speed) => format!("{}, {} Mbit/s", kr(internet.monthly_price, "/mnd"), speed),
            None => kr(internet.monthly_price, "/mnd"),
        },
        OfferDetails::Insurance(insurance) => match insurance.coverage_amount {
            Some(coverage) => format!(
                "{} ({}, dekning {:.0} kr)",
                kr(insurance.monthly_premium, "/mnd"),
                insurance.insurance_type,
                coverage
            ),
            None => format!(
                "{} ({})",
                kr(insurance.monthly_premium, "/mnd"),
                insurance.insurance_type
            ),
        },
        OfferDetails::Loan(loan) => format!(
            "effektiv rente {}",
            loan.effective_rate.as_deref().unwrap_or("ukjent")
        ),
        OfferDetails::Security(alarm) => {
            let groups: Vec<&str> = categorize_equipment(&alarm.equipment)
                .categories
                .iter()
                .map(|c| c.name)
                .collect();
            let service = match service_type(alarm) {
                ServiceType::WithMonitoring => "med vaktselskap",
                ServiceType::AppOnly => "app-styrt",
                ServiceType::SelfMonitoring => "egenovervåking",
            };
            let tier = match alarm.monthly_price.map(price_category) {
                Some(PriceCategory::Budget) => " budsjett",
                Some(PriceCategory::Standard) => " standard",
                Some(PriceCategory::Premium) => " premium",
                None => "",
            };
            let mut summary = format!(
                "{}{}, {}, {}",
                kr(alarm.monthly_price, "/mnd"),
                tier,
                service,
                groups.join(" / ")
            );
            if let Some(setup) = installation(alarm) {
                summary.push_str(", ");
                summary.push_str(&setup);
            }
            summary
        }
        OfferDetails::Tv(tv) => match tv.channels_count {
            Some(channels) => format!("{}, {} kanaler", kr(tv.monthly_price, "/mnd"), channels),
            None => kr(tv.monthly_price, "/mnd"),
        },
        OfferDetails::Handyman(service) | OfferDetails::Cleaning(service) => {
            format!("{} ({})", kr(service.hourly_rate, "/t"), service.service_type)
        }
    };

    if offer.product_name.is_empty() {
        format!("{}: {}", display_provider_name(offer), facts)
    } else {
        format!("{} {}: {}", display_provider_name(offer), offer.product_name, facts)
    }
}
