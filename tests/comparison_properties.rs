use offer_radar::analyzer::categorizer::{PowerTag, categorize};
use offer_radar::analyzer::filter::{FilterState, FilterValue, filter};
use offer_radar::analyzer::pricing::{has_valid_pricing, monthly_cost};
use offer_radar::analyzer::sort::{SortContext, SortKey, sort, sort_with_rng};
use offer_radar::model::{
    Allowance, MobileOffer, Offer, OfferDetails, OfferId, PowerOffer, Vertical,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn mobile(id: i64, price: Option<f64>) -> Offer {
    Offer {
        id: OfferId::Number(id),
        provider: format!("Operatør {}", id % 4),
        product_name: "Smart".into(),
        logo_url: None,
        url: None,
        details: OfferDetails::Mobile(MobileOffer {
            monthly_price: price,
            data: Allowance::Limited(5_120.0),
            minutes: Allowance::Unlimited,
            sms: Allowance::Unlimited,
        }),
    }
}

fn power(id: i64, product: &str, unit_price: Option<f64>, total_price: Option<f64>) -> Offer {
    Offer {
        id: OfferId::Number(id),
        provider: "Kraft AS".into(),
        product_name: product.into(),
        logo_url: None,
        url: None,
        details: OfferDetails::Power(PowerOffer {
            unit_price,
            price_unit: "øre/kWh".into(),
            contract_length: String::new(),
            municipality: "Oslo".into(),
            additional_fees: None,
            total_price,
        }),
    }
}

fn ids(offers: &[Offer]) -> Vec<String> {
    offers.iter().map(|o| o.id.to_string()).collect()
}

fn ctx(vertical: Vertical) -> SortContext {
    SortContext {
        vertical,
        annual_consumption_kwh: 16_000.0,
    }
}

fn mobile_offers() -> impl Strategy<Value = Vec<Offer>> {
    prop::collection::vec(prop::option::of(0.0f64..1_000.0), 0..40).prop_map(|prices| {
        prices
            .into_iter()
            .enumerate()
            .map(|(i, price)| mobile(i as i64, price))
            .collect()
    })
}

proptest! {
    #[test]
    fn range_filter_is_idempotent(
        offers in mobile_offers(),
        a in 0.0f64..1_000.0,
        b in 0.0f64..1_000.0,
    ) {
        let (min, max) = if a <= b { (a, b) } else { (b, a) };
        let state = FilterState::new().with("price", FilterValue::Range(min, max));
        let once = filter(&offers, &state, None);
        let twice = filter(&once, &state, None);
        prop_assert_eq!(ids(&once), ids(&twice));
        for offer in &once {
            let OfferDetails::Mobile(m) = &offer.details else { unreachable!() };
            let price = m.monthly_price.unwrap();
            prop_assert!(min <= price && price <= max);
        }
    }

    #[test]
    fn price_sort_reverses_without_ties(
        prices in prop::collection::hash_set(1u32..100_000, 0..40),
    ) {
        let offers: Vec<Offer> = prices
            .into_iter()
            .enumerate()
            .map(|(i, p)| mobile(i as i64, Some(p as f64)))
            .collect();
        let asc = sort(offers, SortKey::PriceAsc, &ctx(Vertical::Mobile));
        let desc = sort(asc.clone(), SortKey::PriceDesc, &ctx(Vertical::Mobile));
        let mut reversed = ids(&asc);
        reversed.reverse();
        prop_assert_eq!(ids(&desc), reversed);
    }

    #[test]
    fn best_match_is_a_permutation(offers in mobile_offers(), seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let ctx = ctx(Vertical::Mobile);
        let shuffled = sort_with_rng(offers.clone(), SortKey::BestMatch, &ctx, &mut rng);
        let mut before = ids(&offers);
        let mut after = ids(&shuffled);
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn duration_phrase_beats_bare_fixed(
        term in prop::sample::select(vec![
            (6u32, "6 måneder"),
            (12, "12 måneder"),
            (18, "18 måneder"),
            (24, "24 måneder"),
            (36, "36 måneder"),
        ]),
        prefix in prop::sample::select(vec!["", "Trygg ", "Nord ", "Enkel "]),
        suffix in prop::sample::select(vec!["", " avtale", " privat"]),
    ) {
        let (months, phrase) = term;
        let offer = power(1, &format!("{}Fastpris {}{}", prefix, phrase, suffix), Some(50.0), None);
        prop_assert_eq!(categorize(&offer), PowerTag::Fixed(Some(months)));
    }

    #[test]
    fn offers_without_pricing_never_show(
        unit in prop::option::of(prop::sample::select(vec![0.0, -1.0])),
        total in prop::option::of(prop::sample::select(vec![0.0, -5.0])),
        min in 0.0f64..10.0,
    ) {
        let offer = power(1, "Spotpris", unit, total);
        let OfferDetails::Power(p) = &offer.details else { unreachable!() };
        prop_assert!(!has_valid_pricing(p));

        let offers = vec![offer];
        prop_assert!(filter(&offers, &FilterState::new(), None).is_empty());
        let ranged = FilterState::new().with("price", FilterValue::Range(min - 100.0, 1_000.0));
        prop_assert!(filter(&offers, &ranged, Some("spot")).is_empty());
    }
}

#[test]
fn monthly_cost_examples() {
    let OfferDetails::Power(direct) = power(1, "Spotpris", Some(45.0), None).details else {
        unreachable!()
    };
    assert_eq!(monthly_cost(&direct, 16_000.0), 600);

    let OfferDetails::Power(fallback) = power(2, "Spotpris", Some(0.0), Some(52.0)).details else {
        unreachable!()
    };
    assert_eq!(monthly_cost(&fallback, 16_000.0), 693);
}

#[test]
fn fixed_selection_is_a_superset() {
    let offers = vec![
        power(1, "Fastpris", Some(50.0), None),
        power(2, "Fastpris 12 måneder", Some(50.0), None),
        power(3, "Fastpris 24 måneder", Some(50.0), None),
        power(4, "Spotpris", Some(50.0), None),
    ];
    let none = FilterState::new();
    assert_eq!(ids(&filter(&offers, &none, Some("fixed"))), vec!["1", "2", "3"]);
    assert_eq!(ids(&filter(&offers, &none, Some("fixed-12"))), vec!["2"]);
    assert_eq!(ids(&filter(&offers, &none, Some("fixed-24"))), vec!["3"]);
}

#[test]
fn power_price_sort_depends_on_consumption_only_through_cost() {
    let offers = vec![
        power(1, "Spotpris", Some(45.0), None),
        power(2, "Spotpris", Some(0.0), Some(52.0)),
        power(3, "Spotpris", Some(40.0), None),
    ];
    let sorted = sort(offers, SortKey::PriceAsc, &ctx(Vertical::Power));
    assert_eq!(ids(&sorted), vec!["3", "1", "2"]);
}
