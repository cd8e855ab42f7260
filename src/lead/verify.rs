use crate::model::OfferId;
use crate::source::fetcher::StoreClient;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const VERIFY_PATH: &str = "functions/v1/verify-provider-urls";
const SEARCH_URL: &str = "https://www.google.com/search";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    provider_name: &'a str,
    table_name: &'a str,
    record_id: &'a OfferId,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    url: Option<String>,
}

/// Absolute http(s) links and site-relative paths are accepted as outbound URLs.
pub fn is_valid_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://") || url.starts_with('/')
}

/// Web search for the provider in Norway, used when no working link is known.
pub fn search_fallback_url(provider_name: &str) -> String {
    let query = format!("{} Norge", provider_name.trim());
    match Url::parse_with_params(SEARCH_URL, &[("q", query.as_str())]) {
        Ok(url) => url.into(),
        Err(_) => SEARCH_URL.to_string(),
    }
}

/// Asks the store's verification function for a working outbound link.
/// Failures are logged and give `None`; the caller keeps what it has.
pub struct UrlVerifier {
    store: StoreClient,
}

impl UrlVerifier {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    pub async fn verify(
        &self,
        provider_name: &str,
        table_name: &str,
        record_id: &OfferId,
    ) -> Option<String> {
        let url = match self.store.url(VERIFY_PATH) {
            Ok(url) => url,
            Err(e) => {
                warn!("Error verifying provider URL: {}", e);
                return None;
            }
        };
        let body = VerifyRequest {
            provider_name,
            table_name,
            record_id,
        };

        let request = self.store.authorize(self.store.client.post(url)).json(&body);
        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Failed to verify provider URL for {}: {}", provider_name, e);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("URL verification for {} responded [{}]", provider_name, response.status());
            return None;
        }
        match response.json::<VerifyResponse>().await {
            Ok(VerifyResponse { url: Some(url) }) if is_valid_url(&url) => {
                debug!("Verified URL for {}: {}", provider_name, url);
                Some(url)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Unreadable URL verification response for {}: {}", provider_name, e);
                None
            }
        }
    }
}
