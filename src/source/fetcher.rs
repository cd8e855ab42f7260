use crate::config::DataStoreConfig;
use crate::model::{FetchError, Offer, Provider, Vertical};
use crate::normalizer::normalize_municipalities;
use crate::parser::{OfferParser, Parser};
use crate::source::traits::OfferSource;
use crate::utils::search_term;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const PROVIDERS_TABLE: &str = "providers";
const MUNICIPALITIES_RPC: &str = "get_unique_municipalities";

pub fn default_table(vertical: Vertical) -> &'static str {
    match vertical {
        Vertical::Mobile => "mobile_plans",
        Vertical::Power => "power_prices",
        Vertical::Internet => "internet_plans",
        Vertical::Insurance => "insurance_plans",
        Vertical::Loan => "bank_plans",
        Vertical::Security => "home_security_plans",
        Vertical::Tv => "tv_packages",
        Vertical::Handyman => "handyman_services",
        Vertical::Cleaning => "cleaning_services",
    }
}

/// Authenticated access to the data store's REST interface. Shared by the
/// offer source, the lead sink and the URL verifier.
#[derive(Clone)]
pub struct StoreClient {
    pub(crate) client: Client,
    base_url: String,
    api_key: String,
}

impl StoreClient {
    pub fn new(config: &DataStoreConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("offer-radar/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self, path: &str) -> Result<Url, FetchError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    pub fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn get_text(&self, url: Url) -> Result<String, FetchError> {
        debug!("GET {}", url);
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        read_body(response).await
    }

    async fn get_rows(&self, url: Url) -> Result<Vec<Value>, FetchError> {
        let body = self.get_text(url).await?;
        rows_from(&body)
    }

    async fn post_rpc(&self, function: &str) -> Result<Vec<Value>, FetchError> {
        let url = self.url(&format!("rest/v1/rpc/{}", function))?;
        debug!("POST {}", url);
        let response = self
            .authorize(self.client.post(url))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        let body = read_body(response).await?;
        rows_from(&body)
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        warn!("Data store responded [{}]: {}", status, body);
        return Err(FetchError::Status(status.as_u16()));
    }
    response.text().await.map_err(FetchError::from_reqwest)
}

fn rows_from(body: &str) -> Result<Vec<Value>, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::InvalidResponse(e.to_string()))?;
    match value {
        Value::Array(rows) => Ok(rows),
        other => Err(FetchError::InvalidResponse(format!(
            "expected an array, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `OfferSource` backed by the store's PostgREST endpoints.
pub struct RestSource {
    store: StoreClient,
    tables: HashMap<Vertical, String>,
    parser: OfferParser,
}

impl RestSource {
    pub fn new(store: StoreClient, config: &DataStoreConfig) -> Self {
        Self {
            store,
            tables: config.tables.clone(),
            parser: OfferParser::new(),
        }
    }

    pub fn table(&self, vertical: Vertical) -> &str {
        self.tables
            .get(&vertical)
            .map(String::as_str)
            .unwrap_or_else(|| default_table(vertical))
    }

    pub fn offers_url(
        &self,
        vertical: Vertical,
        municipality: Option<&str>,
    ) -> Result<Url, FetchError> {
        let mut url = self.store.url(&format!("rest/v1/{}", self.table(vertical)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            if vertical == Vertical::Power {
                if let Some(name) = municipality.map(str::trim).filter(|m| !m.is_empty()) {
                    let pattern = format!("ilike.*{}*", search_term(name));
                    query.append_pair("municipality_name", &pattern);
                }
            }
        }
        Ok(url)
    }

    pub fn providers_url(&self, vertical: Vertical) -> Result<Url, FetchError> {
        let mut url = self.store.url(&format!("rest/v1/{}", PROVIDERS_TABLE))?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("category", &format!("eq.{}", vertical.slug()));
        Ok(url)
    }
}

#[async_trait::async_trait]
impl OfferSource for RestSource {
    async fn fetch_offers(
        &self,
        vertical: Vertical,
        municipality: Option<&str>,
    ) -> Result<Vec<Offer>, FetchError> {
        let body = self.store.get_text(self.offers_url(vertical, municipality)?).await?;
        let offers = self.parser.parse(vertical, &body)?;
        info!("Fetched {} {} offers", offers.len(), vertical);
        Ok(offers)
    }

    async fn fetch_providers(&self, vertical: Vertical) -> Result<Vec<Provider>, FetchError> {
        let rows = self.store.get_rows(self.providers_url(vertical)?).await?;
        Ok(self.parser.parse_providers(vertical, &rows))
    }

    async fn fetch_municipalities(&self) -> Result<Vec<String>, FetchError> {
        let rows = self.store.post_rpc(MUNICIPALITIES_RPC).await?;
        let names = rows.iter().filter_map(|row| match row {
            Value::String(name) => Some(name.clone()),
            Value::Object(map) => map
                .get("municipality_name")
                .or_else(|| map.get("municipality"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        });
        Ok(normalize_municipalities(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParserError;

    fn source(tables: &[(Vertical, &str)]) -> RestSource {
        let config = DataStoreConfig {
            base_url: "https://db.example.no/".into(),
            api_key: "anon".into(),
            timeout_seconds: 5,
            tables: tables.iter().map(|(v, t)| (*v, t.to_string())).collect(),
        };
        let store = StoreClient::new(&config).unwrap();
        RestSource::new(store, &config)
    }

    #[test]
    fn offers_url_selects_all_columns() {
        let url = source(&[]).offers_url(Vertical::Mobile, Some("Oslo")).unwrap();
        assert_eq!(url.as_str(), "https://db.example.no/rest/v1/mobile_plans?select=*");
    }

    #[test]
    fn power_url_filters_on_municipality() {
        let url = source(&[]).offers_url(Vertical::Power, Some(" Bærum ")).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*".to_string()),
                ("municipality_name".to_string(), "ilike.*bærum*".to_string()),
            ]
        );
    }

    #[test]
    fn table_overrides_apply() {
        let source = source(&[(Vertical::Power, "strompriser")]);
        assert_eq!(source.table(Vertical::Power), "strompriser");
        assert_eq!(source.table(Vertical::Loan), "bank_plans");
    }

    #[test]
    fn rows_must_be_an_array() {
        assert_eq!(rows_from("[{\"id\": 1}]").unwrap().len(), 1);
        assert!(matches!(rows_from("{\"id\": 1}"), Err(FetchError::InvalidResponse(_))));
        assert!(matches!(rows_from("<html>"), Err(FetchError::InvalidResponse(_))));
    }

    #[test]
    fn offer_bodies_go_through_the_parser() {
        let source = source(&[]);
        let offers = source
            .parser
            .parse(Vertical::Mobile, r#"[{"id": 1, "operator": "Ice", "monthly_price": 199}]"#)
            .unwrap();
        assert_eq!(offers.len(), 1);
        let err = FetchError::from(source.parser.parse(Vertical::Mobile, "{}").unwrap_err());
        assert!(matches!(err, FetchError::Parse(ParserError::Malformed(_))));
    }

    #[test]
    fn providers_url_filters_on_category() {
        let url = source(&[]).providers_url(Vertical::Tv).unwrap();
        assert!(url.as_str().ends_with("providers?select=*&category=eq.tv-pakker"));
    }
}
