//! Parsing context for one fetched product page

use chrono::{DateTime, Utc};
use scraper::Html;

use crate::domain::CanonicalId;

/// Everything an extractor may look at for one product page
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Parsed document tree
    pub html: &'a Html,

    /// Canonical id of the product, when the locator carries one
    pub canonical_id: Option<&'a CanonicalId>,

    /// Reference instant for date comparisons (the fetch time)
    pub observed_at: DateTime<Utc>,
}

impl<'a> PageContext<'a> {
    #[must_use]
    pub const fn new(
        html: &'a Html,
        canonical_id: Option<&'a CanonicalId>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            html,
            canonical_id,
            observed_at,
        }
    }
}
