use crate::model::{Offer, OfferDetails, PowerOffer};
use crate::utils::parse_percentage;

/// Annual consumption preselected in the power calculator.
pub const DEFAULT_CONSUMPTION_KWH: f64 = 16_000.0;

/// Per-kWh rate used for cost calculations. A zero unit price counts as
/// missing and falls back to the total price.
pub fn effective_rate(offer: &PowerOffer) -> f64 {
    match offer.unit_price {
        Some(price) if price != 0.0 => price,
        _ => offer.total_price.unwrap_or(0.0),
    }
}

/// Monthly cost in kr: `round(kwh * rate / 100 / 12)`.
pub fn monthly_cost(offer: &PowerOffer, annual_consumption_kwh: f64) -> i64 {
    (annual_consumption_kwh * effective_rate(offer) / 100.0 / 12.0).round() as i64
}

/// øre/kWh shown on the card.
pub fn display_price(offer: &PowerOffer) -> f64 {
    match offer.unit_price {
        Some(price) if price > 0.0 => price,
        _ => offer.total_price.unwrap_or(0.0),
    }
}

pub fn has_valid_pricing(offer: &PowerOffer) -> bool {
    offer.unit_price.is_some_and(|p| p > 0.0) || offer.total_price.is_some_and(|p| p > 0.0)
}

/// The number offers of one vertical are ranked by for `price_*` sorting.
/// Power uses the monthly cost at the given consumption, not the unit price.
pub fn comparable_price(offer: &Offer, annual_consumption_kwh: f64) -> Option<f64> {
    match &offer.details {
        OfferDetails::Power(power) => {
            has_valid_pricing(power).then(|| monthly_cost(power, annual_consumption_kwh) as f64)
        }
        OfferDetails::Mobile(mobile) => mobile.monthly_price,
        OfferDetails::Internet(internet) => internet.monthly_price,
        OfferDetails::Insurance(insurance) => insurance.monthly_premium,
        OfferDetails::Tv(tv) => tv.monthly_price,
        OfferDetails::Security(security) => security.monthly_price,
        OfferDetails::Handyman(service) | OfferDetails::Cleaning(service) => service.hourly_rate,
        OfferDetails::Loan(_) => None,
    }
}

/// False when a price-based offer has nothing to compare on.
pub fn has_usable_price(offer: &Offer) -> bool {
    match &offer.details {
        OfferDetails::Power(power) => has_valid_pricing(power),
        _ if offer.vertical().is_price_based() => comparable_price(offer, DEFAULT_CONSUMPTION_KWH)
            .is_some_and(|p| p.is_finite() && p > 0.0),
        _ => true,
    }
}

/// Effective loan rate in percent.
pub fn loan_rate(offer: &Offer) -> Option<f64> {
    match &offer.details {
        OfferDetails::Loan(loan) => loan.effective_rate.as_deref().and_then(parse_percentage),
        _ => None,
    }
}
