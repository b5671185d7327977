//! # Monitored Products
//!
//! Product references supplied by configuration and the canonical id
//! derived from their locator.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::site;

/// A monitored product: display name plus the locator it is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductReference {
    /// Display name, unique among configured products
    pub name: String,
    /// Product page address (usually a URL)
    #[serde(alias = "locator")]
    pub url: String,
}

impl ProductReference {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Canonical id derived from the locator, if it carries one
    #[must_use]
    pub fn canonical_id(&self) -> Option<CanonicalId> {
        CanonicalId::extract(&self.url)
    }
}

impl fmt::Display for ProductReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}

/// Identifier of a product within the retailer's catalogue (`tcin`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Derive the canonical id from a locator.
    ///
    /// Path segments are scanned from the end; the first one shaped like
    /// `A-<digits>` wins. Query strings and fragments never count as path.
    /// Any input is accepted; anything without such a segment yields `None`.
    #[must_use]
    pub fn extract(locator: &str) -> Option<Self> {
        let path = match url::Url::parse(locator) {
            Ok(parsed) if !parsed.cannot_be_a_base() => parsed.path().to_string(),
            _ => locator
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string(),
        };

        path.rsplit('/').find_map(Self::from_segment)
    }

    fn from_segment(segment: &str) -> Option<Self> {
        let digits = segment.strip_prefix(site::CANONICAL_ID_PREFIX)?;
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(digits.to_string()))
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical product page for this id
    #[must_use]
    pub fn detail_url(&self) -> String {
        site::DETAIL_PAGE_URL_PATTERN.replace("{}", &self.0)
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://www.target.com/p/-/A-94336414", Some("94336414"))]
    #[case(
        "https://www.target.com/p/lego-minecraft-the-lush-cave-fight-building-toy-30705/-/A-93104070#lnk=sametab",
        Some("93104070")
    )]
    #[case(
        "https://www.target.com/p/2025-pokemon-april-special-collectible-trading-cards/-/A-94411686?preselect=94411686",
        Some("94411686")
    )]
    #[case("https://www.target.com/p/-/A-88897904/", Some("88897904"))]
    #[case("/p/-/A-12/extra-noise", Some("12"))]
    #[case("A-555", Some("555"))]
    #[case("https://www.target.com/p/-/B-94336414", None)]
    #[case("https://www.target.com/p/-/A-", None)]
    #[case("https://www.target.com/p/-/A-12x", None)]
    #[case("https://www.target.com/?id=A-123", None)]
    #[case("", None)]
    #[case("not a url at all", None)]
    fn extracts_canonical_id(#[case] locator: &str, #[case] expected: Option<&str>) {
        let id = CanonicalId::extract(locator);
        assert_eq!(id.as_ref().map(CanonicalId::as_str), expected);
    }

    #[test]
    fn last_matching_segment_wins() {
        let id = CanonicalId::extract("https://example.com/A-1/p/A-2").unwrap();
        assert_eq!(id.as_str(), "2");
    }

    #[test]
    fn detail_url_round_trips_through_extract() {
        let id = CanonicalId::extract("A-94336414").unwrap();
        assert_eq!(CanonicalId::extract(&id.detail_url()), Some(id));
    }

    proptest! {
        #[test]
        fn any_numeric_suffix_is_extracted(prefix in "[a-z0-9-]{0,20}", digits in "[0-9]{1,12}") {
            let locator = format!("https://www.target.com/p/{prefix}/-/A-{digits}?preselect={digits}");
            let id = CanonicalId::extract(&locator);
            prop_assert_eq!(id.map(|id| id.as_str().to_string()), Some(digits));
        }

        #[test]
        fn arbitrary_input_never_panics(locator in "\\PC*") {
            if let Some(id) = CanonicalId::extract(&locator) {
                prop_assert!(id.as_str().bytes().all(|b| b.is_ascii_digit()));
            }
        }
    }
}
