pub mod fetcher;
pub mod traits;

pub use fetcher::RestSource;
pub use traits::OfferSource;
