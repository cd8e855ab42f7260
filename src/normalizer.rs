use crate::model::{Offer, Vertical};
use crate::utils::norwegian_sort_key;
use regex::Regex;
use std::sync::LazyLock;

/// Known lenders whose registered names are long: substring → short name.
const KNOWN_LENDERS: &[(&str, &str)] = &[
    ("nordea", "Nordea"),
    ("dnb", "DNB"),
    ("sparebank 1", "SpareBank 1"),
    ("storebrand bank", "Storebrand"),
    ("kredittbanken", "Kredittbanken"),
    ("bank norwegian", "Bank Norwegian"),
    ("lea bank", "Lea Bank"),
    ("komplett bank", "Komplett Bank"),
    ("santander", "Santander"),
    ("monobank", "Monobank"),
];

/// Longest loan provider name kept whole; longer names keep the first word.
const MAX_LENDER_NAME: usize = 12;

/// Corporate suffixes stripped from the end of a name, applied in order.
static SUFFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\s*AB\s*\(publ\).*$",
        r"(?i)\s*\(publ\).*$",
        r"(?i)\s*AB\s*NUF$",
        r"(?i)\s*NUF$",
        r"(?i)\s*ASA$",
        r"(?i)\s+AS$",
        r"(?i)\s*AB$",
        r"(?i)\s*ABP$",
        r"(?i),?\s*FILIAL\s*I\s*NORGE$",
        r"(?i),?\s*Norway\s*Branch$",
        r"(?i)\s+en\s+filial\s+av.*$",
        r"(?i)\s+del\s+av.*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid regex"))
    .collect()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Short display name for a provider.
pub fn clean_provider_name(raw: &str, vertical: Vertical) -> String {
    let lower = raw.to_lowercase();
    if vertical == Vertical::Loan {
        if let Some((_, short)) = KNOWN_LENDERS.iter().find(|(needle, _)| lower.contains(needle)) {
            return short.to_string();
        }
    }

    let mut name = raw.split(',').next().unwrap_or(raw);
    name = name.split(" - ").next().unwrap_or(name);
    name = name.split('(').next().unwrap_or(name);
    if vertical == Vertical::Loan {
        name = name.split('/').next().unwrap_or(name);
    }

    let mut name = collapse_whitespace(name.trim());
    for suffix in SUFFIXES.iter() {
        name = suffix.replace(&name, "").trim().to_string();
    }

    if vertical == Vertical::Loan && name.chars().count() > MAX_LENDER_NAME {
        if let Some(first) = name.split(' ').next() {
            name = first.to_string();
        }
    }

    if name.is_empty() {
        raw.trim().to_string()
    } else {
        name
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").into_owned()
}

pub fn display_provider_name(offer: &Offer) -> String {
    clean_provider_name(&offer.provider, offer.vertical())
}

/// Unique, non-empty municipality names in Norwegian alphabetical order.
/// Names differing only in case count as one; the first spelling is kept.
pub fn normalize_municipalities<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned: Vec<String> = names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    cleaned.sort_by_cached_key(|n| norwegian_sort_key(n));
    cleaned.dedup_by(|a, b| norwegian_sort_key(a.as_str()) == norwegian_sort_key(b.as_str()));
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_lenders_map_to_short_names() {
        assert_eq!(
            clean_provider_name("Nordea Bank Abp, filial i Norge", Vertical::Loan),
            "Nordea"
        );
        assert_eq!(
            clean_provider_name("SpareBank 1 Østlandet", Vertical::Loan),
            "SpareBank 1"
        );
        assert_eq!(clean_provider_name("Bank Norwegian ASA", Vertical::Loan), "Bank Norwegian");
    }

    #[test]
    fn corporate_suffixes_are_stripped() {
        assert_eq!(clean_provider_name("Fjordkraft AS", Vertical::Power), "Fjordkraft");
        assert_eq!(clean_provider_name("Telenor ASA", Vertical::Mobile), "Telenor");
        assert_eq!(clean_provider_name("Resurs Bank AB NUF", Vertical::Insurance), "Resurs Bank");
        assert_eq!(
            clean_provider_name("If Skadeforsikring NUF", Vertical::Insurance),
            "If Skadeforsikring"
        );
        assert_eq!(clean_provider_name("Svea Bank AB (publ)", Vertical::Insurance), "Svea Bank");
    }

    #[test]
    fn names_are_cut_at_separators() {
        assert_eq!(clean_provider_name("Ice - Norges nye mobilnett", Vertical::Mobile), "Ice");
        assert_eq!(clean_provider_name("Tibber, Norge", Vertical::Power), "Tibber");
        assert_eq!(clean_provider_name("Lyse (Altibox)", Vertical::Internet), "Lyse");
    }

    #[test]
    fn long_lender_names_keep_first_word() {
        assert_eq!(
            clean_provider_name("Instabank Forbruksfinans", Vertical::Loan),
            "Instabank"
        );
        assert_eq!(clean_provider_name("Morrow/Bank", Vertical::Loan), "Morrow");
    }

    #[test]
    fn names_ending_in_letters_as_are_kept() {
        assert_eq!(clean_provider_name("Midas", Vertical::Power), "Midas");
        assert_eq!(clean_provider_name("Atlas", Vertical::Power), "Atlas");
    }

    #[test]
    fn municipalities_are_unique_and_sorted() {
        let names = vec!["Oslo", " Ålesund", "", "Bergen", "Oslo", "Ørland"];
        assert_eq!(
            normalize_municipalities(names),
            vec!["Bergen", "Oslo", "Ørland", "Ålesund"]
        );
    }

    #[test]
    fn municipalities_differing_in_case_collapse() {
        assert_eq!(normalize_municipalities(vec!["Oslo", "oslo", "Oslo"]), vec!["Oslo"]);
        assert_eq!(
            normalize_municipalities(vec!["bærum", "Asker", "Bærum ", "ASKER", "asker"]),
            vec!["Asker", "bærum"]
        );
    }
}
