// Analyzer module: categorize, filter, price and sort offers of one vertical.

pub mod categorizer;
pub mod chips;
pub mod equipment;
pub mod filter;
pub mod pricing;
pub mod sort;

use crate::model::{Offer, Vertical};
use filter::FilterState;
use sort::{SortContext, SortKey};
use tracing::info;

/// Everything needed to turn a fetched collection into a result list.
#[derive(Debug, Clone)]
pub struct ComparisonQuery {
    pub vertical: Vertical,
    pub filters: FilterState,
    /// Selected category chip, e.g. `fixed-12`.
    pub category: Option<String>,
    pub sort: SortKey,
    pub annual_consumption_kwh: f64,
}

/// Trait defining the interface for an offer analyzer.
pub trait Analyzer {
    fn filter(&self, offers: &[Offer], query: &ComparisonQuery) -> Vec<Offer>;
    fn sort(&self, offers: Vec<Offer>, query: &ComparisonQuery) -> Vec<Offer>;

    /// Filter then sort. Offers from another vertical are dropped first.
    fn compare(&self, offers: &[Offer], query: &ComparisonQuery) -> Vec<Offer> {
        let filtered = self.filter(offers, query);
        self.sort(filtered, query)
    }
}

/// Default analyzer over the pure filter/sort functions.
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnalyzerImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for AnalyzerImpl {
    fn filter(&self, offers: &[Offer], query: &ComparisonQuery) -> Vec<Offer> {
        let same_vertical: Vec<Offer> = offers
            .iter()
            .filter(|o| o.vertical() == query.vertical)
            .cloned()
            .collect();
        if same_vertical.len() != offers.len() {
            info!(
                "Dropped {} offers not belonging to {}",
                offers.len() - same_vertical.len(),
                query.vertical
            );
        }
        filter::filter(&same_vertical, &query.filters, query.category.as_deref())
    }

    fn sort(&self, offers: Vec<Offer>, query: &ComparisonQuery) -> Vec<Offer> {
        let ctx = SortContext {
            vertical: query.vertical,
            annual_consumption_kwh: query.annual_consumption_kwh,
        };
        sort::sort(offers, query.sort, &ctx)
    }
}
