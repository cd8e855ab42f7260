use crate::model::{Offer, OfferDetails};
use std::fmt;

/// Fixed-price contract terms in months.
pub const FIXED_TERMS: [u32; 7] = [6, 12, 18, 24, 36, 60, 120];

/// Classification of a power offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerTag {
    Spot,
    /// `None` is the bare `fixed` bucket, `Some(n)` is `fixed-{n}`.
    Fixed(Option<u32>),
    Variable,
    Green,
    Residential,
    Cabin,
    Business,
    All,
}

impl PowerTag {
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = match tag {
            "spot" => PowerTag::Spot,
            "fixed" => PowerTag::Fixed(None),
            "variable" => PowerTag::Variable,
            "green" => PowerTag::Green,
            "residential" => PowerTag::Residential,
            "cabin" => PowerTag::Cabin,
            "business" => PowerTag::Business,
            "all" => PowerTag::All,
            other => {
                let months: u32 = other.strip_prefix("fixed-")?.parse().ok()?;
                if !FIXED_TERMS.contains(&months) {
                    return None;
                }
                PowerTag::Fixed(Some(months))
            }
        };
        Some(tag)
    }

    /// Whether an offer carrying `self` is shown when `selected` is the
    /// active chip. Bare `fixed` is a superset of every `fixed-{n}`.
    pub fn matches(self, selected: PowerTag) -> bool {
        match (selected, self) {
            (PowerTag::All, _) => true,
            (PowerTag::Fixed(None), PowerTag::Fixed(_)) => true,
            (selected, own) => selected == own,
        }
    }
}

impl fmt::Display for PowerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerTag::Spot => f.write_str("spot"),
            PowerTag::Fixed(None) => f.write_str("fixed"),
            PowerTag::Fixed(Some(months)) => write!(f, "fixed-{}", months),
            PowerTag::Variable => f.write_str("variable"),
            PowerTag::Green => f.write_str("green"),
            PowerTag::Residential => f.write_str("residential"),
            PowerTag::Cabin => f.write_str("cabin"),
            PowerTag::Business => f.write_str("business"),
            PowerTag::All => f.write_str("all"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Product,
    Contract,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Tag(PowerTag),
    /// Refined by [`TERM_PHRASES`], bare `fixed` when no phrase matches.
    FixedTerm,
}

struct Rule {
    field: Field,
    keywords: &'static [&'static str],
    outcome: Outcome,
}

/// Evaluated top to bottom, first match wins. Product name rules outrank
/// contract length rules.
const RULES: &[Rule] = &[
    Rule {
        field: Field::Product,
        keywords: &["spot", "markedskraft", "timespot"],
        outcome: Outcome::Tag(PowerTag::Spot),
    },
    Rule {
        field: Field::Product,
        keywords: &["fast", "fastpris"],
        outcome: Outcome::FixedTerm,
    },
    Rule {
        field: Field::Product,
        keywords: &["grønn", "groen", "fornybar", "sol"],
        outcome: Outcome::Tag(PowerTag::Green),
    },
    Rule {
        field: Field::Product,
        keywords: &["hytte", "hyttekraft", "hyttestrøm"],
        outcome: Outcome::Tag(PowerTag::Cabin),
    },
    Rule {
        field: Field::Product,
        keywords: &["bolig", "boligstrøm", "boligpakka"],
        outcome: Outcome::Tag(PowerTag::Residential),
    },
    Rule {
        field: Field::Product,
        keywords: &["bedrift", "business"],
        outcome: Outcome::Tag(PowerTag::Business),
    },
    Rule {
        field: Field::Product,
        keywords: &["variabel", "plusskunde", "pluss"],
        outcome: Outcome::Tag(PowerTag::Variable),
    },
    Rule {
        field: Field::Product,
        keywords: &["varmepumpe"],
        outcome: Outcome::Tag(PowerTag::Residential),
    },
    Rule {
        field: Field::Contract,
        keywords: &["spot"],
        outcome: Outcome::Tag(PowerTag::Spot),
    },
    Rule {
        field: Field::Contract,
        keywords: &["fast"],
        outcome: Outcome::Tag(PowerTag::Fixed(None)),
    },
    Rule {
        field: Field::Contract,
        keywords: &["variabel"],
        outcome: Outcome::Tag(PowerTag::Variable),
    },
    Rule {
        field: Field::Contract,
        keywords: &["grønn"],
        outcome: Outcome::Tag(PowerTag::Green),
    },
];

const TERM_PHRASES: &[(&[&str], u32)] = &[
    (&["6 mnd", "6 måneder"], 6),
    (&["12 måneder", "1 år"], 12),
    (&["18 måneder"], 18),
    (&["24 måneder", "2 år"], 24),
    (&["36 måneder", "3 år"], 36),
    (&["5 år"], 60),
    (&["10 år"], 120),
];

/// Tags a power offer. Any other vertical yields [`PowerTag::All`].
pub fn categorize(offer: &Offer) -> PowerTag {
    match &offer.details {
        OfferDetails::Power(power) => classify(&offer.product_name, &power.contract_length),
        _ => PowerTag::All,
    }
}

/// Applies the rule table to a product name and contract length label.
pub fn classify(product_name: &str, contract_length: &str) -> PowerTag {
    let product = product_name.to_lowercase();
    let contract = contract_length.to_lowercase();

    for rule in RULES {
        let haystack = match rule.field {
            Field::Product => &product,
            Field::Contract => &contract,
        };
        if !rule.keywords.iter().any(|k| haystack.contains(k)) {
            continue;
        }
        return match rule.outcome {
            Outcome::Tag(tag) => tag,
            Outcome::FixedTerm => PowerTag::Fixed(fixed_term(&product)),
        };
    }

    PowerTag::All
}

fn fixed_term(product: &str) -> Option<u32> {
    TERM_PHRASES
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|p| contains_term(product, p)))
        .map(|(_, months)| *months)
}

// "36 måneder" must not count as "6 måneder".
fn contains_term(haystack: &str, phrase: &str) -> bool {
    haystack.match_indices(phrase).any(|(idx, _)| {
        !haystack[..idx]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_digit())
    })
}
