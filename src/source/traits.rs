use crate::model::{FetchError, Offer, Provider, Vertical};

/// Read side of the data store. Each call is independent; callers decide
/// whether a response is still relevant when it arrives.
#[async_trait::async_trait]
pub trait OfferSource: Send + Sync {
    /// Offers of one vertical. `municipality` narrows power offers only.
    async fn fetch_offers(
        &self,
        vertical: Vertical,
        municipality: Option<&str>,
    ) -> Result<Vec<Offer>, FetchError>;

    async fn fetch_providers(&self, vertical: Vertical) -> Result<Vec<Provider>, FetchError>;

    /// Municipalities with at least one power offer.
    async fn fetch_municipalities(&self) -> Result<Vec<String>, FetchError>;
}
