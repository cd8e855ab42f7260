use crate::analyzer::categorizer::{categorize, PowerTag};
use crate::analyzer::chips::matches_category;
use crate::analyzer::equipment::has_equipment_type;
use crate::analyzer::pricing::{
    DEFAULT_CONSUMPTION_KWH, comparable_price, display_price, has_usable_price, has_valid_pricing,
    loan_rate,
};
use crate::model::{Allowance, MB_PER_GB, Offer, OfferDetails};
use crate::normalizer::display_provider_name;
use crate::utils::contains_either_way;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Sentinel meaning "no constraint".
pub const ALL: &str = "all";

/// One active filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    /// Field equals the value.
    Exact(String),
    /// Inclusive `[min, max]`.
    Range(f64, f64),
    /// Case-insensitive substring match in either direction.
    Search(String),
}

impl FilterValue {
    /// `all` and empty strings do not constrain anything.
    pub fn is_inactive(&self) -> bool {
        match self {
            FilterValue::Exact(v) => v.is_empty() || v == ALL,
            FilterValue::Search(v) => v.trim().is_empty(),
            FilterValue::Range(min, max) => min.is_nan() || max.is_nan(),
        }
    }
}

/// Filter keys understood by the engine. Several UI names map to one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    Provider,
    Price,
    HourlyRate,
    Speed,
    EffectiveRate,
    ChannelsCount,
    Municipality,
    ContractLength,
    DataCategory,
    InsuranceType,
    EquipmentType,
    PriceRange,
    ServiceType,
    Certification,
    EquipmentIncluded,
}

impl FilterKey {
    pub fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "provider" | "operator" | "supplier_name" => FilterKey::Provider,
            "price" | "monthly_price" | "monthly_premium" => FilterKey::Price,
            "hourly_rate" => FilterKey::HourlyRate,
            "speed" => FilterKey::Speed,
            "effective_rate" => FilterKey::EffectiveRate,
            "channels_count" => FilterKey::ChannelsCount,
            "municipality" => FilterKey::Municipality,
            "contract_length" => FilterKey::ContractLength,
            "data_category" => FilterKey::DataCategory,
            "insurance_type" => FilterKey::InsuranceType,
            "equipment_type" => FilterKey::EquipmentType,
            "price_range" => FilterKey::PriceRange,
            "service_type" => FilterKey::ServiceType,
            "certification" => FilterKey::Certification,
            "equipment_included" => FilterKey::EquipmentIncluded,
            _ => return None,
        };
        Some(key)
    }
}

/// Active filters keyed by their UI name. Lives for one page session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    entries: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: FilterValue) -> Self {
        self.set(key, value);
        self
    }

    /// Setting an inactive value removes the entry.
    pub fn set(&mut self, key: impl Into<String>, value: FilterValue) {
        let key = key.into();
        if value.is_inactive() {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Text of a search/exact filter, e.g. the selected municipality.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            FilterValue::Exact(v) | FilterValue::Search(v) => Some(v.as_str()),
            FilterValue::Range(..) => None,
        }
    }
}

/// Narrows `offers` to those passing every active filter and the selected
/// category chip. Offers without a usable price are always dropped for
/// price-based verticals.
pub fn filter(offers: &[Offer], filters: &FilterState, category: Option<&str>) -> Vec<Offer> {
    let chip = category.filter(|c| !c.is_empty() && *c != ALL);

    let active: Vec<(FilterKey, &FilterValue)> = filters
        .iter()
        .filter(|(_, value)| !value.is_inactive())
        .filter_map(|(name, value)| match FilterKey::parse(name) {
            Some(key) => Some((key, value)),
            None => {
                debug!("Ignoring unknown filter key '{}'", name);
                None
            }
        })
        .collect();

    let result: Vec<Offer> = offers
        .iter()
        .filter(|offer| has_usable_price(offer))
        .filter(|offer| chip.is_none_or(|c| matches_category(offer, c)))
        .filter(|offer| {
            active
                .iter()
                .all(|(key, value)| passes(offer, *key, value, chip.is_some()))
        })
        .cloned()
        .collect();

    debug!(
        "Filtered {} -> {} offers (chip: {}, filters: {})",
        offers.len(),
        result.len(),
        chip.unwrap_or(ALL),
        active.len()
    );
    result
}

fn passes(offer: &Offer, key: FilterKey, value: &FilterValue, chip_active: bool) -> bool {
    match value {
        FilterValue::Exact(wanted) => exact_match(offer, key, wanted, chip_active),
        FilterValue::Range(min, max) => {
            numeric_field(offer, key).is_some_and(|v| v >= *min && v <= *max)
        }
        FilterValue::Search(term) => {
            text_field(offer, key).is_some_and(|field| contains_either_way(field, term))
        }
    }
}

/// Numeric value a range filter compares against. `None` fails the filter.
fn numeric_field(offer: &Offer, key: FilterKey) -> Option<f64> {
    let value = match (key, &offer.details) {
        (FilterKey::Price, OfferDetails::Power(power)) => {
            has_valid_pricing(power).then(|| display_price(power))
        }
        (FilterKey::Price, OfferDetails::Handyman(_) | OfferDetails::Cleaning(_)) => None,
        (FilterKey::Price, _) => comparable_price(offer, DEFAULT_CONSUMPTION_KWH),
        (FilterKey::HourlyRate, OfferDetails::Handyman(s) | OfferDetails::Cleaning(s)) => {
            s.hourly_rate
        }
        (FilterKey::Speed, OfferDetails::Internet(internet)) => internet.speed_mbps,
        (FilterKey::EffectiveRate, OfferDetails::Loan(_)) => loan_rate(offer),
        (FilterKey::ChannelsCount, OfferDetails::Tv(tv)) => tv.channels_count.map(f64::from),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn text_field(offer: &Offer, key: FilterKey) -> Option<&str> {
    match (key, &offer.details) {
        (FilterKey::Provider, _) => Some(offer.provider.as_str()),
        (FilterKey::Municipality, OfferDetails::Power(power)) => Some(power.municipality.as_str()),
        (FilterKey::ContractLength, OfferDetails::Power(power)) => {
            Some(power.contract_length.as_str())
        }
        (FilterKey::InsuranceType, OfferDetails::Insurance(insurance)) => {
            Some(insurance.insurance_type.as_str())
        }
        (FilterKey::ServiceType, OfferDetails::Handyman(s) | OfferDetails::Cleaning(s)) => {
            Some(s.service_type.as_str())
        }
        _ => None,
    }
}

fn exact_match(offer: &Offer, key: FilterKey, wanted: &str, chip_active: bool) -> bool {
    match key {
        FilterKey::Provider => {
            offer.provider == wanted || display_provider_name(offer) == wanted
        }
        FilterKey::ContractLength => contract_length_matches(offer, wanted),
        FilterKey::DataCategory => data_category_matches(offer, wanted),
        FilterKey::PriceRange => price_range_matches(offer, wanted),
        FilterKey::EquipmentType => match &offer.details {
            // The category chip takes precedence over the panel's equipment type.
            OfferDetails::Security(_) if chip_active => true,
            OfferDetails::Security(alarm) => has_equipment_type(alarm, wanted),
            _ => false,
        },
        FilterKey::Certification => match &offer.details {
            OfferDetails::Handyman(s) | OfferDetails::Cleaning(s) => {
                flag_matches(s.certified, wanted)
            }
            _ => false,
        },
        FilterKey::EquipmentIncluded => match &offer.details {
            OfferDetails::Handyman(s) | OfferDetails::Cleaning(s) => {
                flag_matches(s.equipment_included, wanted)
            }
            _ => false,
        },
        _ => text_field(offer, key).is_some_and(|field| field == wanted),
    }
}

fn contract_length_matches(offer: &Offer, wanted: &str) -> bool {
    if !matches!(offer.details, OfferDetails::Power(_)) {
        return false;
    }
    let tag = categorize(offer);
    if wanted == "spot" {
        return tag == PowerTag::Spot;
    }
    match wanted.parse::<u32>() {
        Ok(months) => tag == PowerTag::Fixed(Some(months)),
        Err(_) => text_field(offer, FilterKey::ContractLength)
            .is_some_and(|field| field.eq_ignore_ascii_case(wanted)),
    }
}

fn data_category_matches(offer: &Offer, wanted: &str) -> bool {
    let OfferDetails::Mobile(mobile) = &offer.details else {
        return false;
    };
    match (wanted, mobile.data) {
        ("unlimited", Allowance::Unlimited) => true,
        ("small", Allowance::Limited(mb)) => mb / MB_PER_GB < 5.0,
        ("medium", Allowance::Limited(mb)) => (5.0..=20.0).contains(&(mb / MB_PER_GB)),
        ("large", Allowance::Limited(mb)) => mb / MB_PER_GB > 20.0,
        _ => false,
    }
}

fn price_range_matches(offer: &Offer, wanted: &str) -> bool {
    let Some(price) = comparable_price(offer, DEFAULT_CONSUMPTION_KWH) else {
        return false;
    };
    match wanted {
        "under_200" => price < 200.0,
        "200_400" => (200.0..400.0).contains(&price),
        "over_400" => price >= 400.0,
        _ => true,
    }
}

fn flag_matches(flag: Option<bool>, wanted: &str) -> bool {
    match wanted.parse::<bool>() {
        Ok(expected) => flag == Some(expected),
        Err(_) => true,
    }
}
