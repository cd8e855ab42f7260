// lead/sender.rs

use crate::lead::{Lead, LeadReceipt, LeadSink};
use crate::model::SubmitError;
use crate::source::fetcher::StoreClient;
use chrono::Utc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

const LEADS_PATH: &str = "rest/v1/leads";
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Inserts leads into the data store's `leads` table.
pub struct RestLeadSink {
    store: StoreClient,
}

impl RestLeadSink {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl LeadSink for RestLeadSink {
    async fn submit(&self, lead: &Lead) -> Result<LeadReceipt, SubmitError> {
        let url = self.store.url(LEADS_PATH).map_err(|e| {
            warn!("❌ Lead endpoint: {}", e);
            SubmitError::Unreachable
        })?;
        info!("📤 Submitting lead for {}", lead.service);

        let request = self
            .store
            .authorize(self.store.client.post(url))
            .header("Prefer", "return=minimal")
            .json(&[lead])
            .send();
        let response = match timeout(SUBMIT_TIMEOUT, request).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                warn!("❌ Lead send() failed: {:?}", e);
                return Err(SubmitError::Http(e));
            }
            Err(_) => {
                warn!("⏳ Lead send() timed out");
                return Err(SubmitError::Unreachable);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown".into());
            warn!("❌ Lead endpoint responded [{}]: {}", status, body);
            return Err(SubmitError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        info!("✅ Lead stored [{}]", status);
        Ok(LeadReceipt {
            submitted_at: Utc::now(),
        })
    }
}
