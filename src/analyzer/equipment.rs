//! Home-alarm equipment tags: chip matching and card grouping.

use crate::model::SecurityOffer;

pub struct EquipmentCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub items: &'static [&'static str],
}

pub const EQUIPMENT_CATEGORIES: &[EquipmentCategory] = &[
    EquipmentCategory {
        id: "sensors",
        name: "Sensorer",
        items: &["dor_vindu", "bevegelse", "glassbruddsensor", "magnetkontakt", "innbrudd"],
    },
    EquipmentCategory {
        id: "cameras",
        name: "Kamera & Overvåkning",
        items: &["kamera", "utendors_kamera", "innendors_kamera", "overvakningskamera"],
    },
    EquipmentCategory {
        id: "fire_safety",
        name: "Brann & Røyk",
        items: &["brann", "royk_varsler", "varmevarsler", "co_varsler"],
    },
    EquipmentCategory {
        id: "water_safety",
        name: "Vann & Lekkasje",
        items: &["vann", "vannlekkasje", "fuktighet"],
    },
    EquipmentCategory {
        id: "app_control",
        name: "App & Styring",
        items: &["app", "appstyring", "smarttelefonkontroll", "push_varsling"],
    },
    EquipmentCategory {
        id: "guard_services",
        name: "Vektertjenester",
        items: &["vekter", "alarmstasjon", "vekterutrykning", "nokkeloppbevaring", "proff"],
    },
    EquipmentCategory {
        id: "smart_home",
        name: "Smarthus-integrasjon",
        items: &["smarthus", "z_wave", "homekit", "google_home", "alexa", "smartlås"],
    },
    EquipmentCategory {
        id: "extras",
        name: "Ekstrautstyr",
        items: &["sirene", "fjernkontroll", "skilt", "strom_backup", "backup"],
    },
];

/// Keywords that count as a hit for a category chip.
const CHIP_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "innbrudd",
        &["innbrudd", "break", "inntrenging", "tyveri", "sensor", "dør", "vindu"],
    ),
    ("brann", &["brann", "fire", "røyk", "smoke", "flamme"]),
    (
        "vann",
        &["vann", "water", "lekkasje", "leak", "fukt", "moisture"],
    ),
    (
        "kamera",
        &["kamera", "camera", "video", "overvåk", "surveillance", "webcam"],
    ),
    (
        "smarthus",
        &["smarthus", "smart", "home", "hjem", "automatisering", "automation", "iot"],
    ),
];

/// Equipment and smart features, lower-cased.
fn features(offer: &SecurityOffer) -> impl Iterator<Item = String> + '_ {
    offer
        .equipment
        .iter()
        .chain(offer.smart_features.iter())
        .map(|item| item.trim().to_lowercase())
}

/// Fuzzy match of an offer's equipment against a category chip.
pub fn matches_chip(offer: &SecurityOffer, chip: &str) -> bool {
    let chip = chip.to_lowercase();
    features(offer).any(|item| item == chip || item_matches_chip(&item, &chip))
}

fn item_matches_chip(item: &str, chip: &str) -> bool {
    if chip == "smartlås" {
        return item.contains("smartlås")
            || (item.contains("smart") && item.contains("lås"))
            || item.contains("lock")
            || (item.contains("digital") && item.contains("lås"))
            || item.contains("keypad")
            || item.contains("fingerprint")
            || item.contains("dørlås");
    }
    CHIP_KEYWORDS
        .iter()
        .find(|(id, _)| *id == chip)
        .is_some_and(|(_, keywords)| keywords.iter().any(|k| item.contains(k)))
}

/// Filter-panel equipment type: exact or contains match.
pub fn has_equipment_type(offer: &SecurityOffer, equipment_type: &str) -> bool {
    let wanted = equipment_type.to_lowercase();
    features(offer).any(|item| item == wanted || item.contains(&wanted))
}

pub struct CategorizedEquipment {
    pub categories: Vec<&'static EquipmentCategory>,
    pub uncategorized: Vec<String>,
}

fn related(item: &str, category_item: &str) -> bool {
    item.contains(category_item) || category_item.contains(item)
}

/// Groups an equipment list into the card's icon categories.
pub fn categorize_equipment(equipment: &[String]) -> CategorizedEquipment {
    let normalized: Vec<String> = equipment
        .iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect();

    let categories = EQUIPMENT_CATEGORIES
        .iter()
        .filter(|category| {
            category
                .items
                .iter()
                .any(|ci| normalized.iter().any(|item| related(item, ci)))
        })
        .collect();

    let uncategorized = normalized
        .iter()
        .filter(|item| {
            !EQUIPMENT_CATEGORIES
                .iter()
                .any(|category| category.items.iter().any(|ci| related(item, ci)))
        })
        .cloned()
        .collect();

    CategorizedEquipment {
        categories,
        uncategorized,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceType {
    WithMonitoring,
    AppOnly,
    SelfMonitoring,
}

pub fn service_type(offer: &SecurityOffer) -> ServiceType {
    let has_guard = offer.response_service.as_deref() == Some("with_guard")
        || offer.monitoring_24_7
        || offer.equipment.iter().any(|e| e == "vekter");
    if has_guard {
        return ServiceType::WithMonitoring;
    }
    if offer.response_service.as_deref() == Some("without_guard") && offer.app_control {
        return ServiceType::AppOnly;
    }
    ServiceType::SelfMonitoring
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceCategory {
    Budget,
    Standard,
    Premium,
}

pub fn price_category(monthly_price: f64) -> PriceCategory {
    if monthly_price < 200.0 {
        PriceCategory::Budget
    } else if monthly_price < 400.0 {
        PriceCategory::Standard
    } else {
        PriceCategory::Premium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(equipment: &[&str], smart: &[&str]) -> SecurityOffer {
        SecurityOffer {
            monthly_price: Some(299.0),
            equipment: equipment.iter().map(|s| s.to_string()).collect(),
            smart_features: smart.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn chips_match_fuzzily() {
        let offer = alarm(&["Røykvarsler", "Dørsensor"], &["Smart Lock"]);
        assert!(matches_chip(&offer, "brann"));
        assert!(matches_chip(&offer, "innbrudd"));
        assert!(matches_chip(&offer, "smartlås"));
        assert!(!matches_chip(&offer, "vann"));
        assert!(!matches_chip(&offer, "kamera"));
    }

    #[test]
    fn unknown_chip_only_matches_exactly() {
        let offer = alarm(&["sirene"], &[]);
        assert!(matches_chip(&offer, "sirene"));
        assert!(!matches_chip(&offer, "skilt"));
    }

    #[test]
    fn equipment_is_grouped_by_category() {
        let grouped = categorize_equipment(&[
            "Kamera".to_string(),
            "vannlekkasje".to_string(),
            "gavekort".to_string(),
        ]);
        let ids: Vec<_> = grouped.categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["cameras", "water_safety"]);
        assert_eq!(grouped.uncategorized, vec!["gavekort".to_string()]);
    }

    #[test]
    fn service_type_prefers_guard() {
        let mut offer = alarm(&[], &[]);
        assert_eq!(service_type(&offer), ServiceType::SelfMonitoring);
        offer.response_service = Some("without_guard".into());
        offer.app_control = true;
        assert_eq!(service_type(&offer), ServiceType::AppOnly);
        offer.monitoring_24_7 = true;
        assert_eq!(service_type(&offer), ServiceType::WithMonitoring);
    }

    #[test]
    fn price_categories() {
        assert_eq!(price_category(199.0), PriceCategory::Budget);
        assert_eq!(price_category(200.0), PriceCategory::Standard);
        assert_eq!(price_category(400.0), PriceCategory::Premium);
    }
}
