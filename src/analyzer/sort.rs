use crate::analyzer::pricing::{comparable_price, loan_rate};
use crate::model::{Allowance, Offer, OfferDetails, Vertical};
use rand::Rng;
use rand::seq::SliceRandom;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Randomized order so no provider is always first or last.
    #[default]
    BestMatch,
    PriceAsc,
    PriceDesc,
    DataDesc,
    SpeedDesc,
    RateAsc,
    RateDesc,
}

impl SortKey {
    pub fn parse(key: &str) -> Option<Self> {
        let key = match key {
            "bestMatch" | "random" => SortKey::BestMatch,
            "price_asc" => SortKey::PriceAsc,
            "price_desc" => SortKey::PriceDesc,
            "data_desc" => SortKey::DataDesc,
            "speed_desc" => SortKey::SpeedDesc,
            "rate_asc" => SortKey::RateAsc,
            "rate_desc" => SortKey::RateDesc,
            _ => return None,
        };
        Some(key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::BestMatch => "bestMatch",
            SortKey::PriceAsc => "price_asc",
            SortKey::PriceDesc => "price_desc",
            SortKey::DataDesc => "data_desc",
            SortKey::SpeedDesc => "speed_desc",
            SortKey::RateAsc => "rate_asc",
            SortKey::RateDesc => "rate_desc",
        }
    }

    /// Sort keys offered for a vertical. Loans rank by rate only.
    pub fn supported(vertical: Vertical) -> &'static [SortKey] {
        match vertical {
            Vertical::Loan => &[SortKey::BestMatch, SortKey::RateAsc, SortKey::RateDesc],
            Vertical::Mobile => &[
                SortKey::BestMatch,
                SortKey::PriceAsc,
                SortKey::PriceDesc,
                SortKey::DataDesc,
            ],
            Vertical::Internet => &[
                SortKey::BestMatch,
                SortKey::PriceAsc,
                SortKey::PriceDesc,
                SortKey::SpeedDesc,
            ],
            _ => &[SortKey::BestMatch, SortKey::PriceAsc, SortKey::PriceDesc],
        }
    }

    /// Falls back to `BestMatch` when the key does not apply to `vertical`.
    pub fn for_vertical(self, vertical: Vertical) -> Self {
        if Self::supported(vertical).contains(&self) {
            self
        } else {
            SortKey::BestMatch
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SortContext {
    pub vertical: Vertical,
    /// kWh per year; only read for power.
    pub annual_consumption_kwh: f64,
}

/// Orders offers by `key`. Ties keep their incoming order; offers missing the
/// sort value go last in either direction.
pub fn sort_with_rng<R: Rng + ?Sized>(
    mut offers: Vec<Offer>,
    key: SortKey,
    ctx: &SortContext,
    rng: &mut R,
) -> Vec<Offer> {
    let effective = key.for_vertical(ctx.vertical);
    if effective != key {
        debug!(
            "Sort key {} not valid for {}, using {}",
            key.as_str(),
            ctx.vertical,
            effective.as_str()
        );
    }

    match effective {
        SortKey::BestMatch => offers.shuffle(rng),
        SortKey::PriceAsc => sort_by_value(&mut offers, Direction::Asc, |o| {
            comparable_price(o, ctx.annual_consumption_kwh)
        }),
        SortKey::PriceDesc => sort_by_value(&mut offers, Direction::Desc, |o| {
            comparable_price(o, ctx.annual_consumption_kwh)
        }),
        SortKey::DataDesc => sort_by_value(&mut offers, Direction::Desc, data_rank),
        SortKey::SpeedDesc => sort_by_value(&mut offers, Direction::Desc, |o| match &o.details {
            OfferDetails::Internet(internet) => internet.speed_mbps,
            _ => None,
        }),
        SortKey::RateAsc => sort_by_value(&mut offers, Direction::Asc, loan_rate),
        SortKey::RateDesc => sort_by_value(&mut offers, Direction::Desc, loan_rate),
    }
    offers
}

pub fn sort(offers: Vec<Offer>, key: SortKey, ctx: &SortContext) -> Vec<Offer> {
    sort_with_rng(offers, key, ctx, &mut rand::rng())
}

#[derive(Clone, Copy)]
enum Direction {
    Asc,
    Desc,
}

fn sort_by_value<F>(offers: &mut [Offer], direction: Direction, value: F)
where
    F: Fn(&Offer) -> Option<f64>,
{
    offers.sort_by(|a, b| {
        let a = value(a).filter(|v| !v.is_nan());
        let b = value(b).filter(|v| !v.is_nan());
        match (a, b) {
            (Some(a), Some(b)) => match direction {
                Direction::Asc => a.total_cmp(&b),
                Direction::Desc => b.total_cmp(&a),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Unlimited data ranks above every finite allowance.
fn data_rank(offer: &Offer) -> Option<f64> {
    match &offer.details {
        OfferDetails::Mobile(mobile) => match mobile.data {
            Allowance::Unlimited => Some(f64::INFINITY),
            Allowance::Limited(mb) => Some(mb),
            Allowance::Unknown => None,
        },
        _ => None,
    }
}
