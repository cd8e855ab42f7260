use crate::analyzer::categorizer::{FIXED_TERMS, PowerTag};
use crate::model::Vertical;
use reqwest::Url;
use tracing::debug;

pub const TYPE_PARAM: &str = "type";
pub const DURATION_PARAM: &str = "duration";

/// The category chip shortcut, mirrored in the `type` / `duration` query
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Unset,
    Category(String),
    /// Power only: a fixed price with a chosen term.
    SubCategory { tag: String, duration: u32 },
}

impl Selection {
    /// Validates a chip value for `vertical`. `all` and empty mean `Unset`;
    /// unknown values give `None`.
    pub fn from_tag(vertical: Vertical, tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() || tag == "all" {
            return Some(Selection::Unset);
        }
        if vertical == Vertical::Power {
            return match PowerTag::parse(tag)? {
                PowerTag::Fixed(Some(months)) => Some(Selection::SubCategory {
                    tag: "fixed".to_string(),
                    duration: months,
                }),
                PowerTag::All => Some(Selection::Unset),
                _ => Some(Selection::Category(tag.to_string())),
            };
        }
        vertical
            .category_tags()
            .contains(&tag)
            .then(|| Selection::Category(tag.to_string()))
    }

    /// Reads the selection from a page URL. An absent or unknown `type`
    /// gives `None`; `type=all` gives `Unset`.
    pub fn from_url(vertical: Vertical, url: &Url) -> Option<Self> {
        let tag = query_value(url, TYPE_PARAM)?;
        let selection = Self::from_tag(vertical, &tag);
        if selection.is_none() {
            debug!("Ignoring unknown {} category `{}`", vertical, tag);
        }
        let selection = selection?;

        // `type=fixed&duration=12` is the same as `type=fixed-12`.
        if let Selection::Category(tag) = &selection {
            if tag == "fixed" {
                let duration = query_value(url, DURATION_PARAM).and_then(|d| d.parse::<u32>().ok());
                if let Some(months) = duration {
                    return Some(selection.clone().with_duration(vertical, months));
                }
            }
        }
        Some(selection)
    }

    /// Narrows `fixed` to one term. Anything else is returned unchanged.
    pub fn with_duration(self, vertical: Vertical, months: u32) -> Self {
        let fixed = match &self {
            Selection::Category(tag) => tag == "fixed",
            Selection::SubCategory { .. } => true,
            Selection::Unset => false,
        };
        if vertical == Vertical::Power && fixed && FIXED_TERMS.contains(&months) {
            Selection::SubCategory {
                tag: "fixed".to_string(),
                duration: months,
            }
        } else {
            self
        }
    }

    /// Chip value handed to the filter engine.
    pub fn chip(&self) -> Option<String> {
        match self {
            Selection::Unset => None,
            Selection::Category(tag) => Some(tag.clone()),
            Selection::SubCategory { tag, duration } => Some(format!("{}-{}", tag, duration)),
        }
    }

    pub fn is_business(&self, vertical: Vertical) -> bool {
        matches!(self, Selection::Category(tag) if tag == vertical.business_tag())
    }

    /// Rewrites `type` / `duration` on `url`, keeping every other parameter.
    /// `Unset` removes both.
    pub fn write_to(&self, url: &mut Url) {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != TYPE_PARAM && k != DURATION_PARAM)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut pairs = kept;
        match self {
            Selection::Unset => {}
            Selection::Category(tag) => pairs.push((TYPE_PARAM.to_string(), tag.clone())),
            Selection::SubCategory { duration, .. } => {
                pairs.push((TYPE_PARAM.to_string(), self.chip().unwrap_or_default()));
                pairs.push((DURATION_PARAM.to_string(), duration.to_string()));
            }
        }

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(&format!("http://localhost{}", raw)).unwrap()
    }

    #[test]
    fn reads_plain_and_nested_tags() {
        assert_eq!(
            Selection::from_url(Vertical::Mobile, &url("/mobil?type=lavpris")),
            Some(Selection::Category("lavpris".into()))
        );
        let nested = Some(Selection::SubCategory {
            tag: "fixed".into(),
            duration: 12,
        });
        assert_eq!(Selection::from_url(Vertical::Power, &url("/strom?type=fixed-12")), nested);
        assert_eq!(
            Selection::from_url(Vertical::Power, &url("/strom?type=fixed&duration=12")),
            nested
        );
    }

    #[test]
    fn unknown_and_missing_tags() {
        assert_eq!(Selection::from_url(Vertical::Mobile, &url("/mobil?type=spot")), None);
        assert_eq!(Selection::from_url(Vertical::Mobile, &url("/mobil")), None);
        assert_eq!(
            Selection::from_url(Vertical::Mobile, &url("/mobil?type=all")),
            Some(Selection::Unset)
        );
        assert_eq!(Selection::from_tag(Vertical::Power, "fixed-7"), None);
    }

    #[test]
    fn duration_outside_fixed_terms_is_ignored() {
        let fixed = Selection::Category("fixed".into());
        assert_eq!(fixed.clone().with_duration(Vertical::Power, 7), fixed);
        let spot = Selection::Category("spot".into());
        assert_eq!(spot.clone().with_duration(Vertical::Power, 12), spot);
    }

    #[test]
    fn write_round_trips_and_unset_removes_params() {
        let mut page = url("/strom?ref=nav");
        let selection = Selection::SubCategory {
            tag: "fixed".into(),
            duration: 24,
        };
        selection.write_to(&mut page);
        assert_eq!(page.query(), Some("ref=nav&type=fixed-24&duration=24"));
        assert_eq!(Selection::from_url(Vertical::Power, &page), Some(selection));

        Selection::Unset.write_to(&mut page);
        assert_eq!(page.query(), Some("ref=nav"));

        let mut bare = url("/mobil?type=familie");
        Selection::Unset.write_to(&mut bare);
        assert_eq!(bare.query(), None);
    }

    #[test]
    fn business_tag_differs_for_power() {
        assert!(Selection::Category("business".into()).is_business(Vertical::Power));
        assert!(!Selection::Category("bedrift".into()).is_business(Vertical::Power));
        assert!(Selection::Category("bedrift".into()).is_business(Vertical::Tv));
    }
}
