// Data store row parsing: JSON rows with per-table field names → typed offers
use crate::model::{
    Allowance, ConnectionType, InsuranceOffer, InternetOffer, LoanOffer, MB_PER_GB, MobileOffer,
    Offer, OfferDetails, OfferId, ParserError, PowerOffer, Provider, SecurityOffer, ServiceOffer,
    TvOffer, Vertical,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Stored instead of a number when a plan has no cap.
const UNLIMITED_SENTINEL: f64 = 999_999.0;
const UNLIMITED_MB: f64 = -1.0;
const UNKNOWN_PROVIDER: &str = "Ukjent leverandør";

static UNLIMITED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)fri\s*data|ubegrenset|unlimited").expect("valid regex"));

pub trait Parser {
    fn parse(&self, vertical: Vertical, body: &str) -> Result<Vec<Offer>, ParserError>;
}

pub struct OfferParser;

impl OfferParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses every row, skipping the ones that are not usable offers.
    pub fn parse_rows(&self, vertical: Vertical, rows: &[Value]) -> Vec<Offer> {
        let mut offers = Vec::with_capacity(rows.len());
        for row in rows {
            match parse_offer(vertical, row) {
                Ok(offer) => offers.push(offer),
                Err(e) => warn!("Skipping {} row: {}", vertical, e),
            }
        }
        debug!("Parsed {}/{} {} rows", offers.len(), rows.len(), vertical);
        offers
    }

    pub fn parse_providers(&self, vertical: Vertical, rows: &[Value]) -> Vec<Provider> {
        rows.iter()
            .filter_map(|row| match parse_provider(vertical, row) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!("Skipping {} provider row: {}", vertical, e);
                    None
                }
            })
            .collect()
    }
}

impl Default for OfferParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for OfferParser {
    fn parse(&self, vertical: Vertical, body: &str) -> Result<Vec<Offer>, ParserError> {
        let rows: Vec<Value> = serde_json::from_str(body)?;
        Ok(self.parse_rows(vertical, &rows))
    }
}

pub fn parse_offer(vertical: Vertical, row: &Value) -> Result<Offer, ParserError> {
    let row = row.as_object().ok_or(ParserError::NotAnObject)?;
    let id = id(row).ok_or(ParserError::MissingField("id"))?;
    let provider = text(row, &["provider", "supplier_name", "operator", "provider_name"])
        .unwrap_or_else(|| UNKNOWN_PROVIDER.to_string());
    let product_name =
        text(row, &["product_name", "plan_name", "package_name", "name"]).unwrap_or_default();

    let details = match vertical {
        Vertical::Mobile => OfferDetails::Mobile(mobile(row, &product_name)),
        Vertical::Power => OfferDetails::Power(PowerOffer {
            unit_price: number(row, &["price", "unit_price"]),
            price_unit: text(row, &["price_unit"]).unwrap_or_else(|| "øre/kWh".to_string()),
            contract_length: text(row, &["contract_length", "contract_type", "plan_type"])
                .unwrap_or_default(),
            municipality: text(row, &["municipality_name", "municipality"]).unwrap_or_default(),
            additional_fees: number(row, &["additional_fees"]),
            total_price: number(row, &["total_price"]),
        }),
        Vertical::Internet => OfferDetails::Internet(InternetOffer {
            monthly_price: number(row, &["monthly_price", "price"]),
            speed_mbps: number(row, &["speed", "download_speed"]),
            connection: ConnectionType::from_label(
                &text(row, &["connection_type", "technology"]).unwrap_or_default(),
            ),
        }),
        Vertical::Insurance => OfferDetails::Insurance(InsuranceOffer {
            monthly_premium: number(row, &["monthly_premium", "monthly_price", "price"]),
            insurance_type: text(row, &["insurance_type", "type"]).unwrap_or_default(),
            coverage_amount: number(row, &["coverage_amount"]),
        }),
        Vertical::Loan => OfferDetails::Loan(LoanOffer {
            effective_rate: text(row, &["effective_rate", "interest_rate"]),
            loan_type: text(row, &["loan_type", "type"]).unwrap_or_default(),
        }),
        Vertical::Security => OfferDetails::Security(SecurityOffer {
            monthly_price: number(row, &["monthly_price", "price"]),
            setup_fee: number(row, &["setup_fee", "installation_fee"]),
            equipment: list(row, "equipment_included"),
            smart_features: list(row, "smart_features"),
            monitoring_24_7: flag(row, &["monitoring_24_7"]).unwrap_or(false),
            app_control: flag(row, &["app_control"]).unwrap_or(false),
            response_service: text(row, &["response_service"]),
            installation_included: flag(row, &["installation_included"]).unwrap_or(false),
            installation_type: text(row, &["installation_type"]),
        }),
        Vertical::Tv => OfferDetails::Tv(TvOffer {
            monthly_price: number(row, &["monthly_price", "price"]),
            channels_count: number(row, &["channels_count", "channel_count"])
                .filter(|n| *n >= 0.0)
                .map(|n| n as u32),
        }),
        Vertical::Handyman => OfferDetails::Handyman(service(row)),
        Vertical::Cleaning => OfferDetails::Cleaning(service(row)),
    };

    Ok(Offer {
        id,
        provider,
        product_name,
        logo_url: text(row, &["logo_url", "logo"]),
        url: text(row, &["url", "website", "affiliate_url"]),
        details,
    })
}

pub fn parse_provider(vertical: Vertical, row: &Value) -> Result<Provider, ParserError> {
    let row = row.as_object().ok_or(ParserError::NotAnObject)?;
    Ok(Provider {
        id: id(row).ok_or(ParserError::MissingField("id"))?,
        name: text(row, &["name", "navn", "provider_name"])
            .ok_or(ParserError::MissingField("name"))?,
        logo_url: text(row, &["logo_url", "logo"]),
        vertical,
    })
}

fn mobile(row: &Map<String, Value>, product_name: &str) -> MobileOffer {
    let unlimited_flag = flag(row, &["is_unlimited_data"]) == Some(true);
    let data = if UNLIMITED_NAME.is_match(product_name) || unlimited_flag {
        Allowance::Unlimited
    } else if let Some(gb) = number(row, &["data_gb"]) {
        if gb >= UNLIMITED_SENTINEL {
            Allowance::Unlimited
        } else {
            Allowance::Limited(gb * MB_PER_GB)
        }
    } else if let Some(mb) = number(row, &["data_included_mb", "data_mb"]) {
        if mb == UNLIMITED_MB || mb >= UNLIMITED_SENTINEL {
            Allowance::Unlimited
        } else {
            Allowance::Limited(mb)
        }
    } else {
        Allowance::Unknown
    };

    MobileOffer {
        monthly_price: number(row, &["monthly_rate", "monthly_price", "price"]),
        data,
        minutes: allowance(row, "is_unlimited_talk", &["minutes_included", "minutes"]),
        sms: allowance(row, "is_unlimited_sms", &["sms_included", "sms"]),
    }
}

fn allowance(row: &Map<String, Value>, unlimited_flag: &str, keys: &[&str]) -> Allowance {
    if flag(row, &[unlimited_flag]) == Some(true) {
        return Allowance::Unlimited;
    }
    match number(row, keys) {
        Some(n) if n >= UNLIMITED_SENTINEL || n < 0.0 => Allowance::Unlimited,
        Some(n) => Allowance::Limited(n),
        None => Allowance::Unknown,
    }
}

fn service(row: &Map<String, Value>) -> ServiceOffer {
    ServiceOffer {
        service_type: text(row, &["service_type", "category"]).unwrap_or_default(),
        hourly_rate: number(row, &["hourly_rate", "price_per_hour"]),
        certified: flag(row, &["certified", "certification"]),
        equipment_included: flag(row, &["equipment_included"]),
    }
}

fn id(row: &Map<String, Value>) -> Option<OfferId> {
    match row.get("id")? {
        Value::Number(n) => n.as_i64().map(OfferId::Number),
        Value::String(s) if !s.is_empty() => Some(OfferId::Text(s.clone())),
        _ => None,
    }
}

/// First non-empty string among `keys`. Numbers are accepted as text.
fn text(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First numeric value among `keys`. Numeric columns may arrive as strings.
fn number(row: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    })
    .filter(|n| n.is_finite())
}

fn flag(row: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "ja" | "yes" => Some(true),
            "false" | "nei" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// Tag lists are stored either as JSON arrays or as comma separated text.
fn list(row: &Map<String, Value>, key: &str) -> Vec<String> {
    match row.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mobile_rows_use_aliases_and_sentinels() {
        let parser = OfferParser::new();
        let rows = vec![
            json!({
                "id": 1, "operator": "Telia", "product_name": "Smart 10GB",
                "monthly_rate": 299, "data_gb": 10
            }),
            json!({
                "id": 2, "operator": "Ice", "product_name": "Fri Data",
                "monthly_price": "449", "minutes_included": 999999
            }),
            json!({
                "id": 3, "operator": "Talkmore", "price": 199,
                "data_included_mb": -1, "is_unlimited_sms": true
            }),
        ];
        let offers = parser.parse_rows(Vertical::Mobile, &rows);
        assert_eq!(offers.len(), 3);

        let OfferDetails::Mobile(first) = &offers[0].details else { panic!("not mobile") };
        assert_eq!(first.monthly_price, Some(299.0));
        assert_eq!(first.data, Allowance::Limited(10.0 * MB_PER_GB));
        assert_eq!(first.minutes, Allowance::Unknown);

        let OfferDetails::Mobile(second) = &offers[1].details else { panic!("not mobile") };
        assert_eq!(second.data, Allowance::Unlimited);
        assert_eq!(second.minutes, Allowance::Unlimited);
        assert_eq!(second.monthly_price, Some(449.0));

        let OfferDetails::Mobile(third) = &offers[2].details else { panic!("not mobile") };
        assert_eq!(third.data, Allowance::Unlimited);
        assert_eq!(third.sms, Allowance::Unlimited);
    }

    #[test]
    fn power_rows_keep_fallback_price() {
        let row = json!({
            "id": "abc", "supplier_name": "Tibber AS", "product_name": "Spotpris",
            "price": 0, "total_price": "52,0", "municipality_name": "Oslo",
            "contract_length": "Ingen binding"
        });
        let offer = parse_offer(Vertical::Power, &row).unwrap();
        assert_eq!(offer.id, OfferId::Text("abc".into()));
        let OfferDetails::Power(power) = offer.details else { panic!("not power") };
        assert_eq!(power.unit_price, Some(0.0));
        assert_eq!(power.total_price, Some(52.0));
        assert_eq!(power.municipality, "Oslo");
    }

    #[test]
    fn security_lists_accept_arrays_and_text() {
        let row = json!({
            "id": 7, "provider": "Verisure", "monthly_price": 399,
            "equipment_included": ["Kamera", " Røykvarsler "], "smart_features": "app, smartlås",
            "monitoring_24_7": true
        });
        let offer = parse_offer(Vertical::Security, &row).unwrap();
        let OfferDetails::Security(alarm) = offer.details else { panic!("not security") };
        assert_eq!(alarm.equipment, vec!["Kamera", "Røykvarsler"]);
        assert_eq!(alarm.smart_features, vec!["app", "smartlås"]);
        assert!(alarm.monitoring_24_7);
        assert!(!alarm.app_control);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let parser = OfferParser::new();
        let rows = vec![
            json!("not a row"),
            json!({"provider": "No id"}),
            json!({"id": 4, "provider": "DNB"}),
        ];
        let offers = parser.parse_rows(Vertical::Loan, &rows);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].provider, "DNB");
    }

    #[test]
    fn missing_provider_gets_placeholder() {
        let row = json!({"id": 9, "monthly_price": 349, "channels_count": 40});
        let offer = parse_offer(Vertical::Tv, &row).unwrap();
        assert_eq!(offer.provider, UNKNOWN_PROVIDER);
        assert!(matches!(
            offer.details,
            OfferDetails::Tv(TvOffer { channels_count: Some(40), .. })
        ));
    }

    #[test]
    fn body_must_be_an_array() {
        let parser = OfferParser::new();
        assert!(parser.parse(Vertical::Mobile, "{\"id\": 1}").is_err());
        assert_eq!(parser.parse(Vertical::Mobile, "[]").unwrap().len(), 0);
    }

    #[test]
    fn provider_rows_need_a_name() {
        assert!(parse_provider(Vertical::Mobile, &json!({"id": 1})).is_err());
        let row = json!({"id": 1, "name": "Telenor"});
        let provider = parse_provider(Vertical::Mobile, &row).unwrap();
        assert_eq!(provider.name, "Telenor");
        assert_eq!(provider.vertical, Vertical::Mobile);
    }
}
